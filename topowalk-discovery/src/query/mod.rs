//! Node query
//!
//! Fills a [`Node`] from one device's MIBs and reads its CDP and LLDP
//! neighbor tables. Which facts are fetched is chosen with [`QueryFlags`]:
//! the walker asks for a minimal set while crawling and for everything in
//! the details pass.
//!
//! Individual SNMP failures never abort a query. A missing object leaves
//! the matching attribute unknown and the rest of the query carries on.

mod cache;
mod chassis;
mod interfaces;
mod neighbors;
pub mod oids;

pub use cache::QueryCache;

use bitflags::bitflags;
use topowalk_snmp::SnmpSession;
use tracing::debug;

use crate::link::Neighbor;
use crate::names::canonical_host_name;
use crate::node::Node;

bitflags! {
    /// Which facts a query fetches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueryFlags: u16 {
        const NAME = 1 << 0;
        const ROUTER = 1 << 1;
        const STACK = 1 << 2;
        const VSS = 1 << 3;
        const SERIAL = 1 << 4;
        const PLAT = 1 << 5;
        const IOS = 1 << 6;
        const SVI = 1 << 7;
        const LO = 1 << 8;
        const VPC = 1 << 9;
        const BOOTF = 1 << 10;

        /// Chassis serial, platform and software. Skipped on stacks and VSS
        /// pairs, whose facts come per member.
        const CHASSIS_INFO = Self::SERIAL.bits() | Self::PLAT.bits() | Self::IOS.bits();
    }
}

impl QueryFlags {
    /// What the walker needs to identify a device and run the ACL
    pub fn minimal() -> Self {
        QueryFlags::NAME | QueryFlags::SERIAL
    }
}

/// Queries one device through its session
pub struct NodeQuery<'a> {
    session: &'a SnmpSession,
    cache: &'a mut QueryCache,
    domains: &'a [String],
}

impl<'a> NodeQuery<'a> {
    pub fn new(session: &'a SnmpSession, cache: &'a mut QueryCache, domains: &'a [String]) -> Self {
        Self {
            session,
            cache,
            domains,
        }
    }

    /// Populate `node` with the facts selected by `flags`
    pub async fn query(&mut self, node: &mut Node, flags: QueryFlags) {
        node.snmp_reachable = true;

        if flags.contains(QueryFlags::NAME) {
            self.query_name(node).await;
        }
        if flags.contains(QueryFlags::ROUTER) {
            self.query_router(node).await;
        }
        if flags.contains(QueryFlags::STACK) {
            self.query_stack(node).await;
        }
        if flags.contains(QueryFlags::VSS) {
            self.query_vss(node).await;
        }
        if flags.intersects(QueryFlags::CHASSIS_INFO) {
            if node.stack.is_stacked() || node.vss.enabled {
                debug!(name = %node.name, "Chassis facts come from stack/VSS members");
            } else {
                self.query_chassis(node, flags).await;
            }
        }
        if flags.contains(QueryFlags::SVI) {
            self.query_svis(node).await;
        }
        if flags.contains(QueryFlags::LO) {
            self.query_loopbacks(node).await;
        }
        if flags.contains(QueryFlags::VPC) {
            self.query_vpc(node).await;
        }
        if flags.contains(QueryFlags::BOOTF) {
            node.bootfile = self.session.get_text(oids::BOOT_FILE).await;
        }
    }

    /// CDP then LLDP neighbors, with the local side of each link filled in
    pub async fn neighbors(&mut self) -> Vec<Neighbor> {
        let mut neighbors = self.cdp_neighbors().await;
        neighbors.extend(self.lldp_neighbors().await);
        neighbors
    }

    async fn query_name(&mut self, node: &mut Node) {
        let Some(raw) = self.session.get_text(oids::SYS_NAME).await else {
            debug!(ip = %self.session.ip(), "sysName not available");
            return;
        };
        if let Some(name) = canonical_host_name(&raw, self.domains) {
            node.name = name;
        }
    }

    async fn query_router(&mut self, node: &mut Node) {
        let Some(forwarding) = self.session.get_text(oids::IP_FORWARDING).await else {
            return;
        };
        let routing = forwarding == "1";
        node.router = Some(routing);
        if !routing {
            return;
        }

        if self.session.get_text(oids::OSPF_ADMIN_STATUS).await.as_deref() == Some("1") {
            node.ospf_id = self.session.get_text(oids::OSPF_ROUTER_ID).await;
        }
        node.bgp_las = self
            .session
            .get_text(oids::BGP_LOCAL_AS)
            .await
            .filter(|asn| asn != "0");
        node.hsrp_pri = self.session.get_text(oids::HSRP_PRIORITY).await;
        node.hsrp_vip = self.session.get_text(oids::HSRP_VIP).await;
    }
}
