//! Canonical forms for host names, software versions, port names and
//! chassis IDs as they come out of device tables.

use std::sync::OnceLock;

use regex::Regex;
use topowalk_core::MacAddr;

fn serial_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^(]*\)$").expect("valid regex"))
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Version:? ([^ ,]*)").expect("valid regex"))
}

fn ccm_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"CCM:([^ ,]*)").expect("valid regex"))
}

/// Decode a `0x…` value to UTF-8, keeping the original on any failure.
pub fn decode_hex_text(raw: &str) -> String {
    let Some(digits) = raw.strip_prefix("0x") else {
        return raw.to_string();
    };
    hex::decode(digits)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Normalize a host name into a graph identity.
///
/// Applies, in order: hex decoding of `0x` values, removal of a trailing
/// parenthesized serial (`sw1(FOX123)`), removal of configured domain
/// suffixes, `-` to `_`, and trimming of whitespace and NULs. Returns
/// `None` when nothing is left.
pub fn canonical_host_name(raw: &str, domains: &[String]) -> Option<String> {
    let decoded = decode_hex_text(raw);
    let mut host = serial_suffix().replace(&decoded, "").into_owned();

    for domain in domains.iter().filter(|d| !d.is_empty()) {
        let lower = host.to_ascii_lowercase();
        if lower.ends_with(&domain.to_ascii_lowercase()) {
            host.truncate(host.len() - domain.len());
        }
    }

    let host = host
        .replace('-', "_")
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string();

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Extract the version token from a software descriptor.
///
/// `Cisco IOS Software, ... Version 15.2(4)E7, RELEASE` becomes `15.2(4)E7`;
/// a phone's `... CCM:SCCP45.9-3-1SR4` becomes `CCM SCCP45.9-3-1SR4`.
/// Anything else is passed through.
pub fn format_software_version(raw: &str) -> String {
    let text = decode_hex_text(raw);
    if let Some(caps) = version_re().captures(&text) {
        return caps[1].to_string();
    }
    if let Some(caps) = ccm_re().captures(&text) {
        return format!("CCM {}", &caps[1]);
    }
    text
}

const PORT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("TenGigabitEthernet", "te"),
    ("GigabitEthernet", "gi"),
    ("FastEthernet", "fa"),
    ("Port-channel", "po"),
    ("port-channel", "po"),
    ("Ethernet", "eth"),
    ("Te", "te"),
    ("Gi", "gi"),
    ("Fa", "fa"),
    ("Po", "po"),
];

/// Shorten an interface name: `GigabitEthernet1/0/1` → `gi1/0/1`.
pub fn shorten_port_name(port: &str) -> String {
    PORT_ABBREVIATIONS
        .iter()
        .fold(port.to_string(), |name, (long, short)| name.replace(long, short))
}

/// Render an LLDP chassis ID. Six-octet IDs are shown as a dotted MAC,
/// everything else as received.
pub fn format_chassis_id(raw: &str) -> String {
    if let Some(digits) = raw.strip_prefix("0x") {
        if digits.len() == 12 {
            if let Ok(mac) = digits.parse::<MacAddr>() {
                return mac.to_string();
            }
        }
    }
    raw.to_string()
}

/// Strip the mask from a CIDR string
pub fn strip_mask(cidr: &str) -> &str {
    cidr.split('/').next().unwrap_or(cidr)
}
