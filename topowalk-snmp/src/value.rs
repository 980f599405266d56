//! SNMP value model
//!
//! Values are kept close to the wire types; higher layers mostly read them
//! through [`SnmpValue::to_text`], which renders them the way the device
//! tables are parsed (decimal integers, dotted IPs, printable strings or
//! `0x` hex for binary octet strings).

use std::fmt;
use std::net::Ipv4Addr;

/// A value returned by a GET or GETBULK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    /// INTEGER
    Integer(i64),
    /// Counter32, Gauge32, TimeTicks and Counter64
    Unsigned(u64),
    /// OCTET STRING (and Opaque)
    Octets(Vec<u8>),
    /// IpAddress
    IpAddress(Ipv4Addr),
    /// OBJECT IDENTIFIER, dotted
    ObjectId(String),
    /// NULL, noSuchObject and noSuchInstance
    Null,
    /// endOfMibView
    EndOfView,
}

impl SnmpValue {
    /// Build an octet string value from text
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        SnmpValue::Octets(s.as_ref().as_bytes().to_vec())
    }

    /// Textual rendering used by table parsers.
    ///
    /// Octet strings made of printable ASCII (whitespace included) are
    /// returned as text, anything else as `0x` followed by lower-case hex.
    pub fn to_text(&self) -> String {
        match self {
            SnmpValue::Integer(i) => i.to_string(),
            SnmpValue::Unsigned(u) => u.to_string(),
            SnmpValue::Octets(bytes) => {
                if is_printable(bytes) {
                    String::from_utf8_lossy(bytes).into_owned()
                } else {
                    format!("0x{}", hex::encode(bytes))
                }
            }
            SnmpValue::IpAddress(ip) => ip.to_string(),
            SnmpValue::ObjectId(oid) => oid.clone(),
            SnmpValue::Null | SnmpValue::EndOfView => String::new(),
        }
    }

    /// Octet strings as `0x…` regardless of content. Bitmaps (allowed
    /// VLANs) and MAC addresses are read this way.
    pub fn hex_string(&self) -> String {
        match self {
            SnmpValue::Octets(bytes) => format!("0x{}", hex::encode(bytes)),
            other => other.to_text(),
        }
    }

    /// Raw octets, if this is an octet string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SnmpValue::Octets(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Numeric view of integers, unsigned values and numeric strings
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SnmpValue::Integer(i) => Some(*i),
            SnmpValue::Unsigned(u) => i64::try_from(*u).ok(),
            SnmpValue::Octets(_) => self.to_text().trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_end_of_view(&self) -> bool {
        matches!(self, SnmpValue::EndOfView)
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for SnmpValue {
    fn from(v: i64) -> Self {
        SnmpValue::Integer(v)
    }
}

impl From<&str> for SnmpValue {
    fn from(v: &str) -> Self {
        SnmpValue::text(v)
    }
}

impl From<Ipv4Addr> for SnmpValue {
    fn from(v: Ipv4Addr) -> Self {
        SnmpValue::IpAddress(v)
    }
}

fn is_printable(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| b.is_ascii_graphic() || b.is_ascii_whitespace())
}

/// One (OID, value) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: String,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new<S: Into<String>>(oid: S, value: SnmpValue) -> Self {
        Self {
            oid: oid.into(),
            value,
        }
    }
}
