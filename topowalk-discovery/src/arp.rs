//! ARP table (ipNetToMediaTable)

use std::fmt;
use std::net::Ipv4Addr;

use topowalk_core::MacAddr;
use topowalk_snmp::{oid, SnmpSession};
use tracing::debug;

use crate::names::shorten_port_name;
use crate::query::oids::IF_NAME;

const ARP_TABLE: &str = "1.3.6.1.2.1.4.22.1";
const ARP_MAC: &str = "1.3.6.1.2.1.4.22.1.2";
const ARP_TYPE: &str = "1.3.6.1.2.1.4.22.1.4";
const ARP_IF_INDEX_POS: usize = 10;
const ARP_IP_POS: usize = 11;

/// ipNetToMediaType
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpType {
    Other,
    Invalid,
    Dynamic,
    Static,
}

impl ArpType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ArpType::Other),
            2 => Some(ArpType::Invalid),
            3 => Some(ArpType::Dynamic),
            4 => Some(ArpType::Static),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArpType::Other => "other",
            ArpType::Invalid => "invalid",
            ArpType::Dynamic => "dynamic",
            ArpType::Static => "static",
        }
    }
}

impl fmt::Display for ArpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    /// Short interface name
    pub interface: Option<String>,
    /// VLAN of a `VlanN` interface
    pub vlan: Option<u16>,
    pub entry_type: ArpType,
}

impl ArpEntry {
    /// True when the entry passes both optional filters
    pub fn matches(&self, ip: Option<Ipv4Addr>, mac: Option<MacAddr>) -> bool {
        ip.map_or(true, |ip| self.ip == ip) && mac.map_or(true, |mac| self.mac == mac)
    }
}

fn vlan_of(if_name: &str) -> Option<u16> {
    if_name.strip_prefix("Vlan")?.parse().ok()
}

/// Read the whole ARP table of a device
pub async fn collect(session: &SnmpSession) -> Vec<ArpEntry> {
    let Some(table) = session.bulk(ARP_TABLE).await else {
        debug!(ip = %session.ip(), "ARP walk failed");
        return Vec::new();
    };
    let if_names = session.bulk(IF_NAME).await.unwrap_or_default();

    let mut entries = Vec::new();
    for row in table.column(ARP_MAC) {
        let (Some(if_index), Ok(ip)) = (
            oid::component(&row.oid, ARP_IF_INDEX_POS),
            oid::tail_from(&row.oid, ARP_IP_POS).parse::<Ipv4Addr>(),
        ) else {
            debug!(oid = %row.oid, "Malformed ARP row");
            continue;
        };
        let Some(mac) = row.value.as_bytes().and_then(MacAddr::from_slice) else {
            debug!(oid = %row.oid, "ARP row without a MAC");
            continue;
        };

        let index = oid::tail_from(&row.oid, ARP_IF_INDEX_POS);
        let entry_type = table
            .lookup(&oid::join(ARP_TYPE, &index))
            .and_then(|v| v.as_i64())
            .and_then(ArpType::from_code)
            .unwrap_or(ArpType::Other);
        let if_name = if_names.lookup_text(&oid::join(IF_NAME, if_index));

        entries.push(ArpEntry {
            ip,
            mac,
            vlan: if_name.as_deref().and_then(vlan_of),
            interface: if_name.map(|name| shorten_port_name(&name)),
            entry_type,
        });
    }
    entries
}
