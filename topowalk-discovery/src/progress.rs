//! Discovery progress reporting
//!
//! The walker reports one [`DiscoveryStep`] per neighbor it considers,
//! tagged with [`DiscoveryCodes`]. Whoever drives the walk decides how to
//! show them by installing a [`DiscoveryObserver`].

use std::fmt;

use bitflags::bitflags;

use crate::link::DiscoveryProtocol;

bitflags! {
    /// What happened to a node during one step
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DiscoveryCodes: u8 {
        const ROOT = 1 << 0;
        const CDP = 1 << 1;
        const LLDP = 1 << 2;
        /// No credential worked
        const ERR_SNMP = 1 << 3;
        /// Added to the graph
        const DISCOVERED = 1 << 4;
        /// Queued for expansion
        const STEP_INTO = 1 << 5;
        const INCLUDE = 1 << 6;
        const LEAF = 1 << 7;
    }
}

impl From<DiscoveryProtocol> for DiscoveryCodes {
    fn from(protocol: DiscoveryProtocol) -> Self {
        match protocol {
            DiscoveryProtocol::Cdp => DiscoveryCodes::CDP,
            DiscoveryProtocol::Lldp => DiscoveryCodes::LLDP,
        }
    }
}

impl fmt::Display for DiscoveryCodes {
    /// Fixed-width column: source tag then one slot per marker
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = if self.contains(DiscoveryCodes::ROOT) {
            "[root]"
        } else if self.contains(DiscoveryCodes::CDP) {
            "[ cdp]"
        } else if self.contains(DiscoveryCodes::LLDP) {
            "[lldp]"
        } else {
            "      "
        };

        let slot = |flag: DiscoveryCodes, mark: char| if self.contains(flag) { mark } else { ' ' };
        write!(
            f,
            "{}{}{}{}{}{}",
            source,
            slot(DiscoveryCodes::ERR_SNMP, '!'),
            slot(DiscoveryCodes::DISCOVERED, '+'),
            slot(DiscoveryCodes::STEP_INTO, '>'),
            slot(DiscoveryCodes::INCLUDE, 'i'),
            slot(DiscoveryCodes::LEAF, 'L'),
        )
    }
}

/// One line of discovery progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryStep {
    pub depth: usize,
    pub codes: DiscoveryCodes,
    pub name: String,
    pub ip: String,
    pub platform: Option<String>,
}

/// Receives progress while the walker runs
pub trait DiscoveryObserver: Send + Sync {
    fn on_step(&self, step: &DiscoveryStep);
}
