//! Device catalog (CSV)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use topowalk_core::{Error, Result};
use topowalk_discovery::{Graph, Node};
use tracing::info;

const HEADER: [&str; 7] = ["Name", "IP", "Platform", "Serial", "Software", "Bootfile", "Member"];

/// One line of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub name: String,
    pub ip: String,
    pub platform: String,
    pub serial: String,
    pub software: String,
    pub bootfile: String,
    /// `stack N` or `vss N` for a member row, empty for a whole device
    pub member: String,
}

impl CatalogRow {
    fn device(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            ip: node.best_ip(),
            platform: node.platform.clone().unwrap_or_default(),
            serial: node.serial.clone().unwrap_or_default(),
            software: node.software.clone().unwrap_or_default(),
            bootfile: node.bootfile.clone().unwrap_or_default(),
            member: String::new(),
        }
    }

    fn record(&self) -> [&str; 7] {
        [
            self.name.as_str(),
            self.ip.as_str(),
            self.platform.as_str(),
            self.serial.as_str(),
            self.software.as_str(),
            self.bootfile.as_str(),
            self.member.as_str(),
        ]
    }
}

/// Rows for one node: a row per Stackwise member or VSS chassis when those
/// were collected, otherwise a single row.
pub fn rows_for(node: &Node) -> Vec<CatalogRow> {
    let base = CatalogRow::device(node);

    if node.stack.is_stacked() && !node.stack.members.is_empty() {
        return node
            .stack
            .members
            .iter()
            .map(|m| CatalogRow {
                platform: m.platform.clone().unwrap_or_else(|| base.platform.clone()),
                serial: m.serial.clone().unwrap_or_default(),
                software: m.image.clone().unwrap_or_else(|| base.software.clone()),
                member: format!("stack {}", m.num),
                ..base.clone()
            })
            .collect();
    }

    if node.vss.enabled && !node.vss.members.is_empty() {
        return node
            .vss
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| CatalogRow {
                platform: m.platform.clone().unwrap_or_else(|| base.platform.clone()),
                serial: m.serial.clone().unwrap_or_default(),
                software: m.software.clone().unwrap_or_else(|| base.software.clone()),
                member: format!("vss {}", i + 1),
                ..base.clone()
            })
            .collect();
    }

    vec![base]
}

/// Write the catalog of `graph` as CSV, nodes ordered by name
pub fn write_catalog<W: Write>(graph: &Graph, out: W) -> Result<usize> {
    let mut nodes: Vec<&Node> = graph.nodes().iter().collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER).map_err(csv_error)?;

    let mut count = 0;
    for node in nodes {
        for row in rows_for(node) {
            writer.write_record(row.record()).map_err(csv_error)?;
            count += 1;
        }
    }
    writer.flush()?;
    Ok(count)
}

/// Write the catalog to a file at `path`
pub fn save_catalog(graph: &Graph, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let rows = write_catalog(graph, file)?;
    info!(path = %path.display(), rows, "Catalog written");
    Ok(())
}

pub(crate) fn csv_error(e: csv::Error) -> Error {
    Error::output(format!("CSV: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use topowalk_discovery::{StackInfo, StackMember, VssMember};

    fn graph() -> Graph {
        let mut graph = Graph::new();

        let mut stack = Node::new(Some("sw2".to_string()), "10.0.0.2");
        stack.platform = Some("WS-C3850-48P".to_string());
        stack.software = Some("16.9.4".to_string());
        stack.stack = StackInfo {
            count: 2,
            members: vec![
                StackMember {
                    num: 1,
                    serial: Some("FOC1".to_string()),
                    ..Default::default()
                },
                StackMember {
                    num: 2,
                    serial: Some("FOC2".to_string()),
                    platform: Some("WS-C3850-24P".to_string()),
                    ..Default::default()
                },
            ],
        };
        graph.add_node(stack);

        let mut router = Node::new(Some("rtr1".to_string()), "10.0.0.1");
        router.serial = Some("FTX1".to_string());
        router.bootfile = Some("flash:c2900.bin".to_string());
        graph.add_node(router);

        let mut vss = Node::new(Some("core".to_string()), "10.0.0.3");
        vss.vss.enabled = true;
        vss.vss.members = vec![
            VssMember {
                serial: Some("SAL1".to_string()),
                ..Default::default()
            },
            VssMember {
                serial: Some("SAL2".to_string()),
                ..Default::default()
            },
        ];
        graph.add_node(vss);
        graph
    }

    #[test]
    fn test_rows_for_stack() {
        let graph = graph();
        let rows = rows_for(&graph.nodes()[0]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].platform, "WS-C3850-48P");
        assert_eq!(rows[1].platform, "WS-C3850-24P");
        assert_eq!(rows[1].serial, "FOC2");
        assert_eq!(rows[1].software, "16.9.4");
        assert_eq!(rows[1].member, "stack 2");
    }

    #[test]
    fn test_write_catalog() {
        let mut out: Vec<u8> = Vec::new();
        let rows = write_catalog(&graph(), &mut out).unwrap();
        assert_eq!(rows, 5);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name,IP,Platform,Serial,Software,Bootfile,Member");
        assert_eq!(lines[1], "core,10.0.0.3,,SAL1,,,vss 1");
        assert_eq!(lines[2], "core,10.0.0.3,,SAL2,,,vss 2");
        assert_eq!(lines[3], "rtr1,10.0.0.1,,FTX1,,flash:c2900.bin,");
        assert_eq!(lines[4], "sw2,10.0.0.2,WS-C3850-48P,FOC1,16.9.4,,stack 1");
    }

    #[test]
    fn test_save_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        save_catalog(&graph(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 6);
    }
}
