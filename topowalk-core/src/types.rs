//! Common types used throughout topowalk

use std::fmt;
use std::str::FromStr;

/// Strings that stand for "no IP address" in a node's address set.
///
/// They never take part in node identity and are never polled.
pub const NO_IP_SENTINELS: [&str; 3] = ["", "0.0.0.0", "UNKNOWN"];

/// Returns true when `ip` is one of the "no IP" sentinels.
pub fn is_sentinel_ip(ip: &str) -> bool {
    NO_IP_SENTINELS.contains(&ip)
}

/// MAC Address (6 bytes)
///
/// Displayed in the dotted Cisco form (`0011.2233.4455`), which is what
/// switch CLIs and the catalog use. Parsing accepts dotted, colon, dash
/// and bare hex forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Build a MAC address from a 6 byte slice
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.try_into().ok()?;
        Some(Self(octets))
    }

    /// Build a MAC address from six decimal OID components
    /// (the index encoding used by the bridge MIB).
    pub fn from_oid_components(components: &[&str]) -> Option<Self> {
        if components.len() != 6 {
            return None;
        }
        let mut bytes = [0u8; 6];
        for (i, part) in components.iter().enumerate() {
            bytes[i] = part.parse().ok()?;
        }
        Some(Self(bytes))
    }

    /// Six decimal components, as used to index bridge MIB tables
    pub fn to_oid_index(&self) -> String {
        self.0
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Colon separated lower-case form (`00:11:22:33:44:55`)
    pub fn to_colon_string(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .trim()
            .trim_start_matches("0x")
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();

        if digits.len() != 12 {
            return Err(crate::Error::InvalidMac(s.to_string()));
        }

        let bytes = hex::decode(&digits).map_err(|_| crate::Error::InvalidMac(s.to_string()))?;
        MacAddr::from_slice(&bytes).ok_or_else(|| crate::Error::InvalidMac(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_display_is_dotted() {
        let mac = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0xaa]);
        assert_eq!(mac.to_string(), "0011.2233.44aa");
        assert_eq!(mac.to_colon_string(), "00:11:22:33:44:aa");
    }

    #[test]
    fn test_mac_parse_formats() {
        let expected = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0xaa]);
        for input in [
            "0011.2233.44aa",
            "00:11:22:33:44:AA",
            "00-11-22-33-44-aa",
            "0011223344aa",
            "0x0011223344aa",
        ] {
            assert_eq!(input.parse::<MacAddr>().unwrap(), expected, "{}", input);
        }
    }

    #[test]
    fn test_mac_parse_rejects_garbage() {
        assert!("0011.2233".parse::<MacAddr>().is_err());
        assert!("zz11.2233.44aa".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_from_oid_components() {
        let mac = MacAddr::from_oid_components(&["0", "17", "34", "51", "68", "170"]).unwrap();
        assert_eq!(mac.to_string(), "0011.2233.44aa");
        assert_eq!(mac.to_oid_index(), "0.17.34.51.68.170");
        assert!(MacAddr::from_oid_components(&["1", "2"]).is_none());
        assert!(MacAddr::from_oid_components(&["1", "2", "3", "4", "5", "999"]).is_none());
    }

    #[test]
    fn test_sentinels() {
        assert!(is_sentinel_ip(""));
        assert!(is_sentinel_ip("0.0.0.0"));
        assert!(is_sentinel_ip("UNKNOWN"));
        assert!(!is_sentinel_ip("10.0.0.1"));
    }
}
