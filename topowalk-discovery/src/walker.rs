//! Graph walker
//!
//! The `Walker` is the entry point of a discovery run. Starting from a seed
//! address it:
//!
//! - logs into each device with the configured credentials
//! - reads its CDP and LLDP neighbors
//! - filters every neighbor through the discovery ACL, once on what was
//!   advertised and once on what the device reported about itself
//! - expands permitted neighbors depth-first up to the maximum depth
//!
//! A device is identified by its canonical name or by any address it has
//! been seen at, so each device is contacted at most once per run and appears
//! once in the graph however many neighbors advertise it.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;

use futures::future::BoxFuture;
use topowalk_core::{
    is_sentinel_ip, Acl, AclAction, AclSubject, Config, Credential, Error, Result,
};
use topowalk_snmp::{Connector, SnmpSession};
use tracing::{debug, info, warn};

use crate::graph::Graph;
use crate::link::Neighbor;
use crate::names::canonical_host_name;
use crate::node::{Node, NodeId};
use crate::progress::{DiscoveryCodes, DiscoveryObserver, DiscoveryStep};
use crate::query::{NodeQuery, QueryCache, QueryFlags};

/// Address given to neighbors that advertise none
const NO_ADDRESS: &str = "0.0.0.0";

pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Credentials, domain suffixes and policy of a run
#[derive(Debug, Clone, Default)]
pub struct DiscoveryContext {
    pub credentials: Vec<Credential>,
    /// Suffixes stripped from host names
    pub domains: Vec<String>,
    pub acl: Acl,
}

impl DiscoveryContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            credentials: config.snmp.clone(),
            domains: config.domains.clone(),
            acl: config.discover.clone(),
        }
    }
}

/// The session a device answered on and the tables already walked
pub(crate) struct DeviceHandle {
    session: SnmpSession,
    cache: QueryCache,
}

impl DeviceHandle {
    pub(crate) fn new(session: SnmpSession) -> Self {
        Self {
            session,
            cache: QueryCache::new(),
        }
    }

    pub(crate) fn session(&self) -> &SnmpSession {
        &self.session
    }

    pub(crate) fn query<'a>(&'a mut self, domains: &'a [String]) -> NodeQuery<'a> {
        NodeQuery::new(&self.session, &mut self.cache, domains)
    }
}

/// A node that is not in the graph yet
struct Candidate {
    node: Node,
    device: Option<DeviceHandle>,
}

/// How an advertised device maps onto the graph
enum Resolution {
    Known(NodeId),
    /// Known under another address, which has just been added
    NewIpForKnown(NodeId),
    New(Box<Candidate>),
}

/// Discovers a network from a seed device
pub struct Walker {
    context: DiscoveryContext,
    connector: Arc<dyn Connector>,
    max_depth: usize,
    graph: Graph,
    devices: HashMap<NodeId, DeviceHandle>,
    /// Addresses of queried devices the ACL turned down
    rejected: HashSet<String>,
    observer: Option<Arc<dyn DiscoveryObserver>>,
}

impl Walker {
    pub fn new(context: DiscoveryContext, connector: Arc<dyn Connector>) -> Self {
        Self {
            context,
            connector,
            max_depth: DEFAULT_MAX_DEPTH,
            graph: Graph::new(),
            devices: HashMap::new(),
            rejected: HashSet::new(),
            observer: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DiscoveryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.graph.root_node()
    }

    /// Build the graph reachable from `seed`.
    ///
    /// If the seed answers none of the credentials it is still recorded as
    /// the (unreachable) root and [`Error::RootUnreachable`] is returned.
    pub async fn discover(&mut self, seed: Ipv4Addr) -> Result<()> {
        let ip = seed.to_string();
        info!(seed = %ip, max_depth = self.max_depth, "Starting discovery");

        let root = match self.query_node(&ip, None).await {
            Resolution::Known(id) | Resolution::NewIpForKnown(id) => id,
            Resolution::New(candidate) => self.insert(*candidate),
        };
        self.graph.set_root(root);

        if !self.graph[root].snmp_reachable {
            self.report(0, DiscoveryCodes::ROOT | DiscoveryCodes::ERR_SNMP, root);
            warn!(seed = %ip, "Seed device did not answer SNMP");
            return Err(Error::RootUnreachable(ip));
        }
        self.report(0, DiscoveryCodes::ROOT | DiscoveryCodes::DISCOVERED, root);

        self.expand(root, 0).await;

        info!(
            nodes = self.graph.len(),
            links = self.graph.link_count(),
            "Discovery finished"
        );
        Ok(())
    }

    /// Re-query every reachable node for all facts, then pair VPC peers
    pub async fn discover_details(&mut self) {
        info!(nodes = self.graph.len(), "Collecting node details");

        let ids: Vec<NodeId> = self.graph.ids().collect();
        for id in ids {
            let Some(device) = self.devices.get_mut(&id) else {
                continue;
            };
            device
                .query(&self.context.domains)
                .query(&mut self.graph[id], QueryFlags::all())
                .await;
        }

        self.backfill_vpc_peers();
    }

    async fn open_session(&self, ip: &str) -> Result<SnmpSession> {
        let addr: Ipv4Addr = ip
            .parse()
            .map_err(|_| Error::Unreachable(ip.to_string()))?;
        SnmpSession::open(self.connector.as_ref(), addr, &self.context.credentials).await
    }

    /// Find or create the node for a device seen at `ip`.
    ///
    /// New devices are logged into and given a minimal query; nothing is added
    /// to the graph here.
    async fn query_node(&mut self, ip: &str, hint: Option<&str>) -> Resolution {
        if let Some(id) = self.graph.find_by_ip(ip) {
            return Resolution::Known(id);
        }
        let hint = hint.and_then(|h| canonical_host_name(h, &self.context.domains));
        if let Some(id) = hint.as_deref().and_then(|name| self.graph.find_by_name(name)) {
            return self.merge_ip(id, ip);
        }

        let mut node = Node::new(hint.clone(), ip);
        let mut device = None;

        if is_sentinel_ip(ip) {
            debug!(ip = ip, host = ?hint, "No usable address, not probing");
        } else {
            match self.open_session(ip).await {
                Ok(session) => {
                    let mut handle = DeviceHandle::new(session);
                    handle
                        .query(&self.context.domains)
                        .query(&mut node, QueryFlags::minimal())
                        .await;

                    // The advertised name may be an alias of a known device
                    if !node.name.is_empty() && hint.as_deref() != Some(node.name.as_str()) {
                        if let Some(id) = self.graph.find_by_name(&node.name) {
                            debug!(ip = ip, name = %node.name, "Known device under another name");
                            return self.merge_ip(id, ip);
                        }
                    }
                    device = Some(handle);
                }
                Err(e) => {
                    debug!(ip = ip, error = %e, "SNMP login failed");
                }
            }
        }

        self.shell(node, device, ip)
    }

    /// Unqueried stub for an ACL `include`
    fn include_stub(&mut self, ip: &str, host: Option<String>) -> Resolution {
        if let Some(id) = self.graph.find_by_ip(ip) {
            return Resolution::Known(id);
        }
        if let Some(id) = host.as_deref().and_then(|name| self.graph.find_by_name(name)) {
            return self.merge_ip(id, ip);
        }

        let mut node = Node::new(host, ip);
        node.is_stub = true;
        self.shell(node, None, ip)
    }

    /// Name an anonymous node after its address and wrap it as a candidate
    fn shell(&mut self, mut node: Node, device: Option<DeviceHandle>, ip: &str) -> Resolution {
        if node.name.is_empty() {
            node.name = ip.to_string();
            if let Some(id) = self.graph.find_by_name(&node.name) {
                return self.merge_ip(id, ip);
            }
        }
        Resolution::New(Box::new(Candidate { node, device }))
    }

    fn merge_ip(&mut self, id: NodeId, ip: &str) -> Resolution {
        if self.graph[id].add_ip(ip) {
            debug!(name = %self.graph[id].name, ip = ip, "New address for known node");
            Resolution::NewIpForKnown(id)
        } else {
            Resolution::Known(id)
        }
    }

    fn resolved<'a>(&'a self, resolution: &'a Resolution) -> &'a Node {
        match resolution {
            Resolution::Known(id) | Resolution::NewIpForKnown(id) => &self.graph[*id],
            Resolution::New(candidate) => &candidate.node,
        }
    }

    fn insert(&mut self, candidate: Candidate) -> NodeId {
        let Candidate { node, device } = candidate;
        debug!(name = %node.name, ip = %node.primary_ip(), reachable = node.snmp_reachable, "Node added");
        let id = self.graph.add_node(node);
        if let Some(device) = device {
            self.devices.insert(id, device);
        }
        id
    }

    fn expand(&mut self, id: NodeId, depth: usize) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let node = &self.graph[id];
            if node.discovered
                || depth >= self.max_depth
                || !node.snmp_reachable
                || node.has_only_sentinel_ips()
            {
                return;
            }
            let Some(device) = self.devices.get_mut(&id) else {
                return;
            };
            self.graph[id].discovered = true;

            let neighbors = device.query(&self.context.domains).neighbors().await;
            debug!(name = %self.graph[id].name, depth, neighbors = neighbors.len(), "Expanding");

            let mut queue = Vec::new();
            for neighbor in neighbors {
                if let Some(child) = self.visit(id, depth, neighbor).await {
                    queue.push(child);
                }
            }

            for child in queue {
                self.expand(child, depth + 1).await;
            }
        })
    }

    /// Resolve one neighbor of `id`, link it and say whether to expand it
    async fn visit(&mut self, id: NodeId, depth: usize, neighbor: Neighbor) -> Option<NodeId> {
        let ip = neighbor
            .remote
            .ip
            .clone()
            .filter(|ip| !ip.is_empty())
            .unwrap_or_else(|| NO_ADDRESS.to_string());
        let host = neighbor
            .remote
            .name
            .as_deref()
            .and_then(|h| canonical_host_name(h, &self.context.domains));

        if self.rejected.contains(&ip) {
            return None;
        }

        let advertised = self
            .context
            .acl
            .evaluate(&AclSubject::advertised(&ip, host.as_deref()));
        let resolution = match advertised {
            AclAction::Deny => {
                debug!(ip = %ip, host = ?host, "Denied by ACL");
                return None;
            }
            AclAction::Include => self.include_stub(&ip, host),
            AclAction::Permit | AclAction::Leaf => {
                self.query_node(&ip, neighbor.remote.name.as_deref()).await
            }
        };

        let action = if advertised == AclAction::Include {
            advertised
        } else {
            let remote = self.resolved(&resolution);
            self.context.acl.evaluate(&AclSubject {
                ip: &ip,
                host: Some(remote.name.as_str()),
                platform: neighbor.remote.platform.as_deref().or(remote.platform.as_deref()),
                software: neighbor.remote.software.as_deref().or(remote.software.as_deref()),
                serial: remote.serial.as_deref(),
            })
        };
        if action == AclAction::Deny {
            debug!(ip = %ip, name = %self.resolved(&resolution).name, "Denied by ACL after query");
            if matches!(resolution, Resolution::New(_)) && !is_sentinel_ip(&ip) {
                self.rejected.insert(ip);
            }
            return None;
        }

        let is_new = matches!(resolution, Resolution::New(_));
        let remote = match resolution {
            Resolution::Known(id) | Resolution::NewIpForKnown(id) => id,
            Resolution::New(candidate) => self.insert(*candidate),
        };

        let node = &mut self.graph[remote];
        if let Some(platform) = &neighbor.remote.platform {
            node.platform = Some(platform.clone());
        }
        if let Some(software) = &neighbor.remote.software {
            node.software = Some(software.clone());
        }

        let mut codes = DiscoveryCodes::from(neighbor.protocol);
        match action {
            AclAction::Include => codes |= DiscoveryCodes::INCLUDE,
            AclAction::Leaf => codes |= DiscoveryCodes::LEAF,
            _ => {}
        }
        if is_new {
            codes |= DiscoveryCodes::DISCOVERED;
            if !node.snmp_reachable && !node.is_stub && !is_sentinel_ip(&ip) {
                codes |= DiscoveryCodes::ERR_SNMP;
            }
        }
        let step_into = is_new && action == AclAction::Permit && node.snmp_reachable;
        if step_into {
            codes |= DiscoveryCodes::STEP_INTO;
        }

        self.report(depth + 1, codes, remote);
        self.attach(id, remote, neighbor);

        step_into.then_some(remote)
    }

    /// Record the adjacency `from -> to`, folding it into the reverse half
    /// when `to` has already reported it
    fn attach(&mut self, from: NodeId, to: NodeId, neighbor: Neighbor) {
        if from == to {
            debug!(name = %self.graph[from].name, "Ignoring adjacency to self");
            return;
        }
        let link = neighbor.with_remote(to);

        if self.graph[to].discovered {
            if let Some(port) = link.remote_port.as_deref() {
                let reverse = self.graph[to]
                    .links
                    .iter_mut()
                    .find(|l| l.remote == from && l.local_port.as_deref() == Some(port));
                if let Some(reverse) = reverse {
                    reverse.merge_reverse(&link);
                    return;
                }
            }
        }

        let links = &mut self.graph[from].links;
        if link.local_port.is_some()
            && links
                .iter()
                .any(|l| l.remote == to && l.local_port == link.local_port)
        {
            debug!(port = ?link.local_port, "Adjacency already recorded");
            return;
        }
        links.push(link);
    }

    /// Point each VPC member at its peer.
    ///
    /// The peer is the far end of a link whose local LAG, or failing that
    /// local port, is the peer-link interface. Links owned by the peer are
    /// searched when the member recorded none.
    fn backfill_vpc_peers(&mut self) {
        let ids: Vec<NodeId> = self.graph.ids().collect();
        for id in ids {
            let node = &self.graph[id];
            if node.vpc_domain.is_none() || node.vpc_peerlink_node.is_some() {
                continue;
            }
            let Some(peerlink) = node.vpc_peerlink_if.clone() else {
                continue;
            };
            let Some(peer) = self.vpc_peer(id, &peerlink) else {
                debug!(name = %self.graph[id].name, peerlink = %peerlink, "VPC peer not found");
                continue;
            };

            debug!(name = %self.graph[id].name, peer = %self.graph[peer].name, "VPC peers paired");
            self.graph[id].vpc_peerlink_node = Some(peer);
            if self.graph[peer].vpc_peerlink_node.is_none() {
                self.graph[peer].vpc_peerlink_node = Some(id);
            }
        }
    }

    fn vpc_peer(&self, id: NodeId, peerlink: &str) -> Option<NodeId> {
        let on_peerlink = |port: &Option<String>| port.as_deref() == Some(peerlink);
        let links = &self.graph[id].links;

        links
            .iter()
            .find(|l| on_peerlink(&l.local_lag))
            .or_else(|| links.iter().find(|l| on_peerlink(&l.local_port)))
            .map(|l| l.remote)
            .or_else(|| {
                self.graph
                    .links()
                    .find(|(_, l)| l.remote == id && (on_peerlink(&l.remote_lag) || on_peerlink(&l.remote_port)))
                    .map(|(owner, _)| owner)
            })
            .filter(|&peer| peer != id)
    }

    fn report(&self, depth: usize, codes: DiscoveryCodes, id: NodeId) {
        let node = &self.graph[id];
        debug!(depth, codes = %codes, name = %node.name, ip = %node.primary_ip(), "Discovery step");
        if let Some(observer) = &self.observer {
            observer.on_step(&DiscoveryStep {
                depth,
                codes,
                name: node.name.clone(),
                ip: node.primary_ip().to_string(),
                platform: node.platform.clone(),
            });
        }
    }
}
