//! Topowalk Discovery Library
//!
//! This crate builds the network graph: it queries devices over SNMP,
//! follows their CDP and LLDP neighbors under the discovery ACL and keeps
//! the result in an index-addressed [`Graph`]. ARP, forwarding database and
//! MAC trace helpers reuse the same session and query layers.

pub mod arp;
pub mod fdb;
pub mod graph;
pub mod link;
pub mod mac_trace;
pub mod names;
pub mod node;
pub mod progress;
pub mod query;
pub mod vlan;
pub mod walker;

// Re-export commonly used types
pub use arp::{ArpEntry, ArpType};
pub use fdb::FdbEntry;
pub use graph::Graph;
pub use link::{DiscoveryProtocol, Link, LinkType, Neighbor, RemoteDevice};
pub use mac_trace::{MacTracer, TraceHop};
pub use node::{Loopback, Node, NodeId, StackInfo, StackMember, StackRole, Svi, VssInfo, VssMember};
pub use progress::{DiscoveryCodes, DiscoveryObserver, DiscoveryStep};
pub use query::{NodeQuery, QueryCache, QueryFlags};
pub use walker::{DiscoveryContext, Walker, DEFAULT_MAX_DEPTH};
