//! Devices in the discovered graph

use std::fmt;
use std::net::Ipv4Addr;

use topowalk_core::{is_sentinel_ip, MacAddr};

use crate::link::Link;
use crate::names::strip_mask;

/// Index of a node in its [`Graph`](crate::graph::Graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a switch inside a Stackwise stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackRole {
    Master,
    Member,
    NotMember,
    Standby,
}

impl StackRole {
    /// From `cswSwitchRole`
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(StackRole::Master),
            2 => Some(StackRole::Member),
            3 => Some(StackRole::NotMember),
            4 => Some(StackRole::Standby),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StackRole::Master => "master",
            StackRole::Member => "member",
            StackRole::NotMember => "notMember",
            StackRole::Standby => "standby",
        }
    }
}

impl fmt::Display for StackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One switch of a stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackMember {
    pub num: u32,
    pub role: Option<StackRole>,
    pub priority: Option<u32>,
    pub mac: Option<MacAddr>,
    pub image: Option<String>,
    pub platform: Option<String>,
    pub serial: Option<String>,
}

/// Stackwise facts. Only populated when more than one member exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackInfo {
    pub count: usize,
    pub members: Vec<StackMember>,
}

impl StackInfo {
    pub fn is_stacked(&self) -> bool {
        self.count > 1
    }
}

/// One chassis of a VSS pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VssMember {
    pub software: Option<String>,
    pub platform: Option<String>,
    pub serial: Option<String>,
}

/// Virtual Switching System facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VssInfo {
    pub enabled: bool,
    pub domain: Option<String>,
    /// At most two chassis
    pub members: Vec<VssMember>,
}

/// Routed VLAN interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Svi {
    pub vlan: u16,
    /// CIDR strings (`10.1.1.1/24`)
    pub ips: Vec<String>,
}

/// Loopback interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loopback {
    pub name: String,
    /// CIDR strings
    pub ips: Vec<String>,
}

/// A device in the graph.
///
/// Discovered devices, unreachable shells and `include` stubs are all
/// nodes; the flags tell them apart.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Canonical name; empty until known
    pub name: String,
    /// Every address this device was seen at, in discovery order
    pub ips: Vec<String>,

    pub platform: Option<String>,
    pub software: Option<String>,
    pub serial: Option<String>,
    pub bootfile: Option<String>,

    pub router: Option<bool>,
    pub ospf_id: Option<String>,
    pub bgp_las: Option<String>,
    pub hsrp_pri: Option<String>,
    pub hsrp_vip: Option<String>,

    pub stack: StackInfo,
    pub vss: VssInfo,
    pub vpc_domain: Option<String>,
    pub vpc_peerlink_if: Option<String>,
    pub vpc_peerlink_node: Option<NodeId>,

    pub svis: Vec<Svi>,
    pub loopbacks: Vec<Loopback>,

    /// Outgoing half-edges
    pub links: Vec<Link>,

    pub discovered: bool,
    pub snmp_reachable: bool,
    pub is_stub: bool,
}

impl Node {
    /// A shell known only by an address and, possibly, an advertised name
    pub fn new<S: Into<String>>(name: Option<String>, ip: S) -> Self {
        Self {
            name: name.unwrap_or_default(),
            ips: vec![ip.into()],
            ..Default::default()
        }
    }

    /// The address the node was first seen at
    pub fn primary_ip(&self) -> &str {
        self.ips.first().map(String::as_str).unwrap_or("")
    }

    /// True when the node can be reached at no real address
    pub fn has_only_sentinel_ips(&self) -> bool {
        self.ips.iter().all(|ip| is_sentinel_ip(ip))
    }

    /// Record another address; sentinels and duplicates are ignored.
    /// Returns true when the address was new.
    pub fn add_ip(&mut self, ip: &str) -> bool {
        if is_sentinel_ip(ip) || self.ips.iter().any(|known| known == ip) {
            return false;
        }
        self.ips.push(ip.to_string());
        true
    }

    pub fn has_ip(&self, ip: &str) -> bool {
        !is_sentinel_ip(ip) && self.ips.iter().any(|known| known == ip)
    }

    /// The address to show for this node.
    ///
    /// The lowest loopback address if any loopback has one; otherwise the
    /// lowest of the SVI addresses and the node's own addresses; otherwise
    /// the empty string. Masks are stripped.
    pub fn best_ip(&self) -> String {
        let loopbacks: Vec<&str> = self
            .loopbacks
            .iter()
            .flat_map(|lo| lo.ips.iter())
            .map(|ip| strip_mask(ip))
            .collect();
        if let Some(ip) = lowest(loopbacks) {
            return ip;
        }

        let others: Vec<&str> = self
            .svis
            .iter()
            .flat_map(|svi| svi.ips.iter())
            .chain(self.ips.iter())
            .map(|ip| strip_mask(ip))
            .collect();
        lowest(others).unwrap_or_default()
    }

    /// Is `port` (or a LAG) one of this node's VPC peer-link interfaces?
    pub fn is_vpc_peerlink(&self, port: &str) -> bool {
        self.vpc_peerlink_if.as_deref() == Some(port)
    }
}

fn lowest(ips: Vec<&str>) -> Option<String> {
    ips.into_iter()
        .filter(|ip| !is_sentinel_ip(ip))
        .filter_map(|ip| ip.parse::<Ipv4Addr>().ok())
        .min()
        .map(|ip| ip.to_string())
}
