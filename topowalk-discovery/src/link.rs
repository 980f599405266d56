//! Adjacencies between devices

use std::fmt;

use crate::node::NodeId;

/// Protocol that surfaced an adjacency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryProtocol {
    Cdp,
    Lldp,
}

impl fmt::Display for DiscoveryProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryProtocol::Cdp => write!(f, "cdp"),
            DiscoveryProtocol::Lldp => write!(f, "lldp"),
        }
    }
}

/// Layer-2/3 role of the local port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkType {
    Trunk,
    Access,
    #[default]
    Routed,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Trunk => write!(f, "trunk"),
            LinkType::Access => write!(f, "access"),
            LinkType::Routed => write!(f, "routed"),
        }
    }
}

/// What a neighbor advertisement says about the far end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDevice {
    /// Advertised device name, as received
    pub name: Option<String>,
    /// Advertised management address
    pub ip: Option<String>,
    pub platform: Option<String>,
    /// Canonical software version
    pub software: Option<String>,
    pub chassis_id: Option<String>,
}

/// A directed half-edge from the owning node to `remote`.
///
/// `local_*` fields describe the owning node's port; `remote_*` fields are
/// filled from the advertisement and, once the far end has been polled, from
/// its side of the same adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link<E = NodeId> {
    pub remote: E,
    pub protocol: DiscoveryProtocol,
    pub link_type: LinkType,

    pub local_port: Option<String>,
    pub remote_port: Option<String>,

    pub local_lag: Option<String>,
    pub remote_lag: Option<String>,
    pub local_lag_ips: Vec<String>,
    pub remote_lag_ips: Vec<String>,

    /// Access VLAN
    pub vlan: Option<String>,
    pub local_native_vlan: Option<String>,
    pub remote_native_vlan: Option<String>,
    pub local_allowed_vlans: Option<String>,
    pub remote_allowed_vlans: Option<String>,

    pub local_if_ip: Option<String>,
    pub remote_if_ip: Option<String>,
}

/// A link as read from a neighbor table, before the far end is resolved
pub type Neighbor = Link<RemoteDevice>;

impl<E> Link<E> {
    pub fn new(remote: E, protocol: DiscoveryProtocol) -> Self {
        Self {
            remote,
            protocol,
            link_type: LinkType::default(),
            local_port: None,
            remote_port: None,
            local_lag: None,
            remote_lag: None,
            local_lag_ips: Vec::new(),
            remote_lag_ips: Vec::new(),
            vlan: None,
            local_native_vlan: None,
            remote_native_vlan: None,
            local_allowed_vlans: None,
            remote_allowed_vlans: None,
            local_if_ip: None,
            remote_if_ip: None,
        }
    }

    /// Same link, pointing at a different endpoint type
    pub fn with_remote<T>(self, remote: T) -> Link<T> {
        Link {
            remote,
            protocol: self.protocol,
            link_type: self.link_type,
            local_port: self.local_port,
            remote_port: self.remote_port,
            local_lag: self.local_lag,
            remote_lag: self.remote_lag,
            local_lag_ips: self.local_lag_ips,
            remote_lag_ips: self.remote_lag_ips,
            vlan: self.vlan,
            local_native_vlan: self.local_native_vlan,
            remote_native_vlan: self.remote_native_vlan,
            local_allowed_vlans: self.local_allowed_vlans,
            remote_allowed_vlans: self.remote_allowed_vlans,
            local_if_ip: self.local_if_ip,
            remote_if_ip: self.remote_if_ip,
        }
    }

    /// Fold the far end's view of this adjacency into the remote fields.
    ///
    /// `reverse` is the link the remote device reported back towards us;
    /// only remote fields that are still unknown are filled.
    pub fn merge_reverse<T>(&mut self, reverse: &Link<T>) {
        if self.remote_if_ip.is_none() {
            self.remote_if_ip = reverse.local_if_ip.clone();
        }
        if self.remote_lag.is_none() {
            self.remote_lag = reverse.local_lag.clone();
        }
        if self.remote_lag_ips.is_empty() {
            self.remote_lag_ips = reverse.local_lag_ips.clone();
        }
        if self.remote_native_vlan.is_none() {
            self.remote_native_vlan = reverse.local_native_vlan.clone();
        }
        if self.remote_allowed_vlans.is_none() {
            self.remote_allowed_vlans = reverse.local_allowed_vlans.clone();
        }
        if self.remote_port.is_none() {
            self.remote_port = reverse.local_port.clone();
        }
    }
}
