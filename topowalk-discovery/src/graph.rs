//! Arena holding every node of a run
//!
//! Links refer to their far end by [`NodeId`], so the cyclic topology lives
//! in a flat vector owned by the walker.

use std::ops::{Index, IndexMut};

use topowalk_core::is_sentinel_ip;

use crate::link::Link;
use crate::node::{Node, NodeId};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and return its id
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.map(|id| &self.nodes[id.0])
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Node that owns `ip`. Sentinel addresses never match.
    pub fn find_by_ip(&self, ip: &str) -> Option<NodeId> {
        if is_sentinel_ip(ip) {
            return None;
        }
        self.nodes.iter().position(|n| n.has_ip(ip)).map(NodeId)
    }

    /// Node with canonical name `name`
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Every link in the graph with the id of the node that owns it
    pub fn links(&self) -> impl Iterator<Item = (NodeId, &Link)> {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(i, node)| node.links.iter().map(move |link| (NodeId(i), link)))
    }

    /// Number of links in the graph
    pub fn link_count(&self) -> usize {
        self.nodes.iter().map(|n| n.links.len()).sum()
    }

    /// Shortest distance (in links) from the root to every node; `None` for
    /// nodes that cannot be reached.
    pub fn depths(&self) -> Vec<Option<usize>> {
        let mut depths = vec![None; self.nodes.len()];
        let Some(root) = self.root else {
            return depths;
        };

        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for (from, link) in self.links() {
            adjacency[from.0].push(link.remote.0);
            adjacency[link.remote.0].push(from.0);
        }

        let mut queue = std::collections::VecDeque::from([root.0]);
        depths[root.0] = Some(0);
        while let Some(current) = queue.pop_front() {
            let next_depth = depths[current].map(|d| d + 1);
            for &next in &adjacency[current] {
                if depths[next].is_none() {
                    depths[next] = next_depth;
                    queue.push_back(next);
                }
            }
        }
        depths
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Graph {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
