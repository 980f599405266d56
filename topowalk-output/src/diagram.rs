//! Network diagram (Graphviz DOT)
//!
//! The diagram is an undirected graph: one vertex per node (or per
//! Stackwise member / VSS chassis when those are expanded) and one edge
//! per link (or per LAG when LAG members are collapsed). Labels use
//! Graphviz HTML-like text so the node template can carry markup.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use regex::Regex;
use topowalk_core::{DiagramConfig, Result};
use topowalk_discovery::{Graph, Link, LinkType, Node, NodeId};
use tracing::info;

use crate::template::{escape_html, render, FieldSource, StackMemberView, VssMemberView};

const GRAPH_PREFIX: &str = r#"graph "topology" {
    splines = "true"; overlap = "false"; labelloc = "t";"#;

/// Writes a discovered graph as DOT text
pub struct Diagram<'a> {
    graph: &'a Graph,
    config: &'a DiagramConfig,
    title: String,
    generated: DateTime<Local>,
}

/// One edge to draw; a collapsed LAG owns several links
struct Edge<'g> {
    owner: NodeId,
    links: Vec<&'g Link>,
}

impl<'a> Diagram<'a> {
    pub fn new(graph: &'a Graph, config: &'a DiagramConfig) -> Self {
        Self {
            graph,
            config,
            title: "Network Diagram".to_string(),
            generated: Local::now(),
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    /// Timestamp printed under the title
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated = at;
        self
    }

    /// Write the diagram to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        info!(
            path = %path.display(),
            nodes = self.graph.len(),
            links = self.graph.link_count(),
            "Diagram written"
        );
        Ok(())
    }

    /// The diagram as a string
    pub fn render(&self) -> Result<String> {
        let mut out: Vec<u8> = Vec::new();
        self.write(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn write(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", GRAPH_PREFIX)?;
        writeln!(
            out,
            "    label = <<font point-size=\"{}\"><b>{}</b><br />Generated {}</font>>;",
            self.config.title_text_size,
            escape_html(&self.title),
            self.generated.format("%Y-%m-%d %H:%M:%S"),
        )?;
        writeln!(
            out,
            "    node [ shape = \"box\" fontsize = {} ];",
            self.config.node_text_size
        )?;
        writeln!(out, "    edge [ fontsize = {} ];", self.config.link_text_size)?;

        let mut drawn = HashSet::new();
        if self.config.group_vpc {
            for (a, b) in self.vpc_pairs() {
                let domain = self.graph[a].vpc_domain.as_deref().unwrap_or("");
                writeln!(out, "    subgraph \"cluster_vpc_{}_{}\" {{", a.0, b.0)?;
                writeln!(out, "        label = \"VPC {}\"; style = \"dashed\";", escape_quoted(domain))?;
                for id in [a, b] {
                    self.write_vertex(out, id, "        ")?;
                    drawn.insert(id);
                }
                writeln!(out, "    }}")?;
            }
        }
        for id in self.graph.ids() {
            if !drawn.contains(&id) {
                self.write_vertex(out, id, "    ")?;
            }
        }

        for edge in self.edges() {
            self.write_edge(out, &edge)?;
        }

        writeln!(out, "}}")?;
        Ok(())
    }

    /// VPC peers that know each other, each pair once
    fn vpc_pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();
        let mut seen = HashSet::new();
        for id in self.graph.ids() {
            let Some(peer) = self.graph[id].vpc_peerlink_node else {
                continue;
            };
            if peer == id || seen.contains(&id) || seen.contains(&peer) {
                continue;
            }
            seen.insert(id);
            seen.insert(peer);
            pairs.push((id.min(peer), id.max(peer)));
        }
        pairs
    }

    fn expands_stack(&self, node: &Node) -> bool {
        self.config.expand_stackwise && node.stack.is_stacked() && !node.stack.members.is_empty()
    }

    fn expands_vss(&self, node: &Node) -> bool {
        self.config.expand_vss && node.vss.enabled && !node.vss.members.is_empty()
    }

    fn write_vertex(&self, out: &mut dyn Write, id: NodeId, indent: &str) -> Result<()> {
        let node = &self.graph[id];
        let template = self.config.node_text.as_str();
        let attrs = vertex_attributes(node);

        if self.expands_stack(node) {
            writeln!(out, "{}subgraph \"cluster_{}\" {{", indent, escape_quoted(&node.name))?;
            writeln!(out, "{}    label = \"{}\"; style = \"rounded\";", indent, escape_quoted(&node.name))?;
            for member in &node.stack.members {
                let view = StackMemberView { node, member };
                let vertex = member_vertex(&node.name, member.num as usize);
                write_vertex_line(out, &format!("{}    ", indent), &vertex, &render(template, &view), &attrs)?;
            }
            writeln!(out, "{}}}", indent)?;
        } else if self.expands_vss(node) {
            writeln!(out, "{}subgraph \"cluster_{}\" {{", indent, escape_quoted(&node.name))?;
            writeln!(out, "{}    label = \"{}\"; style = \"rounded\";", indent, escape_quoted(&node.name))?;
            for (i, member) in node.vss.members.iter().enumerate() {
                let view = VssMemberView {
                    node,
                    num: i + 1,
                    member,
                };
                let vertex = member_vertex(&node.name, i + 1);
                write_vertex_line(out, &format!("{}    ", indent), &vertex, &render(template, &view), &attrs)?;
            }
            writeln!(out, "{}}}", indent)?;
        } else {
            let label = render(template, node as &dyn FieldSource);
            write_vertex_line(out, indent, &node.name, &label, &attrs)?;
        }
        Ok(())
    }

    /// Vertex that `port` of node `id` attaches to
    fn vertex_for(&self, id: NodeId, port: Option<&str>) -> String {
        let node = &self.graph[id];
        let wanted = port.and_then(port_member);

        if self.expands_stack(node) {
            let members = &node.stack.members;
            let num = wanted
                .and_then(|n| members.iter().find(|m| m.num as usize == n))
                .or_else(|| members.first())
                .map(|m| m.num as usize)
                .unwrap_or(1);
            return member_vertex(&node.name, num);
        }
        if self.expands_vss(node) {
            let num = wanted
                .filter(|&n| n >= 1 && n <= node.vss.members.len())
                .unwrap_or(1);
            return member_vertex(&node.name, num);
        }
        node.name.clone()
    }

    /// Links grouped into edges; LAG members share one edge unless
    /// `expand_lag` is set
    fn edges(&self) -> Vec<Edge<'_>> {
        let mut edges: Vec<Edge<'_>> = Vec::new();
        let mut lags: HashMap<(NodeId, NodeId, &str), usize> = HashMap::new();

        for (owner, link) in self.graph.links() {
            if !self.config.expand_lag {
                if let Some(lag) = link.local_lag.as_deref() {
                    let key = (owner, link.remote, lag);
                    if let Some(&i) = lags.get(&key) {
                        edges[i].links.push(link);
                        continue;
                    }
                    lags.insert(key, edges.len());
                }
            }
            edges.push(Edge {
                owner,
                links: vec![link],
            });
        }
        edges
    }

    fn write_edge(&self, out: &mut dyn Write, edge: &Edge<'_>) -> Result<()> {
        let Some(first) = edge.links.first() else {
            return Ok(());
        };
        let collapsed = !self.config.expand_lag && first.local_lag.is_some();
        let owner = &self.graph[edge.owner];

        let (local_port, remote_port) = if collapsed {
            (first.local_lag.as_deref(), first.remote_lag.as_deref())
        } else {
            (first.local_port.as_deref(), first.remote_port.as_deref())
        };
        let from = self.vertex_for(edge.owner, first.local_port.as_deref());
        let to = self.vertex_for(first.remote, first.remote_port.as_deref());

        let mut lines = vec![pair(local_port, remote_port)];
        if collapsed {
            if edge.links.len() > 1 {
                lines.push(format!("{} links", edge.links.len()));
            }
            if !first.local_lag_ips.is_empty() || !first.remote_lag_ips.is_empty() {
                lines.push(format!(
                    "{} - {}",
                    first.local_lag_ips.join(", "),
                    first.remote_lag_ips.join(", ")
                ));
            }
        } else {
            if first.local_lag.is_some() || first.remote_lag.is_some() {
                lines.push(pair(first.local_lag.as_deref(), first.remote_lag.as_deref()));
            }
            if first.local_if_ip.is_some() || first.remote_if_ip.is_some() {
                lines.push(pair(first.local_if_ip.as_deref(), first.remote_if_ip.as_deref()));
            }
        }
        lines.extend(vlan_lines(first));

        let label = lines
            .iter()
            .map(|l| escape_html(l))
            .collect::<Vec<_>>()
            .join("<br />");

        let mut attrs = vec![format!("label = <{}>", label)];
        if first.link_type == LinkType::Trunk {
            attrs.push("style = \"bold\"".to_string());
        }
        if collapsed {
            attrs.push(format!("penwidth = {}", edge.links.len().clamp(1, 4) + 1));
        }
        let peerlink = first.local_lag.as_deref().or(first.local_port.as_deref());
        if peerlink.is_some_and(|p| owner.is_vpc_peerlink(p)) {
            attrs.push("color = \"blue\"".to_string());
        }

        writeln!(
            out,
            "    \"{}\" -- \"{}\" [ {} ];",
            escape_quoted(&from),
            escape_quoted(&to),
            attrs.join(" ")
        )?;
        Ok(())
    }
}

fn vertex_attributes(node: &Node) -> Vec<String> {
    let mut attrs = Vec::new();
    if node.router == Some(true) {
        attrs.push("shape = \"ellipse\"".to_string());
    }
    if node.is_stub {
        attrs.push("style = \"dotted\"".to_string());
    } else if !node.snmp_reachable {
        attrs.push("style = \"dashed\"".to_string());
    }
    attrs
}

fn write_vertex_line(
    out: &mut dyn Write,
    indent: &str,
    vertex: &str,
    label: &str,
    attrs: &[String],
) -> Result<()> {
    let mut all = vec![format!("label = <{}>", label)];
    all.extend(attrs.iter().cloned());
    writeln!(out, "{}\"{}\" [ {} ];", indent, escape_quoted(vertex), all.join(" "))?;
    Ok(())
}

fn member_vertex(name: &str, num: usize) -> String {
    format!("{}[{}]", name, num)
}

fn pair(local: Option<&str>, remote: Option<&str>) -> String {
    format!("{} - {}", local.unwrap_or("?"), remote.unwrap_or("?"))
}

fn vlan_lines(link: &Link) -> Vec<String> {
    match link.link_type {
        LinkType::Access => link
            .vlan
            .as_deref()
            .map(|v| vec![format!("VLAN {}", v)])
            .unwrap_or_default(),
        LinkType::Trunk => {
            let mut lines = Vec::new();
            if link.local_native_vlan.is_some() || link.remote_native_vlan.is_some() {
                lines.push(format!(
                    "native {}",
                    pair(link.local_native_vlan.as_deref(), link.remote_native_vlan.as_deref())
                ));
            }
            if let Some(allowed) = link.local_allowed_vlans.as_deref() {
                lines.push(format!("allowed {}", allowed));
            }
            lines
        }
        LinkType::Routed => Vec::new(),
    }
}

/// Stack member or VSS chassis number of a port name (`gi2/0/1` is on 2)
pub fn port_member(port: &str) -> Option<usize> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z-]*(\d+)/").expect("valid regex"));
    re.captures(port)?.get(1)?.as_str().parse().ok()
}

fn escape_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
