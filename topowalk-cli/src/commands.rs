//! Command dispatch

use std::fs::{self, File};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use topowalk_core::{Config, DiagramConfig, Error, MacAddr, Result};
use topowalk_discovery::{arp, fdb, DiscoveryContext, Graph, MacTracer, Walker};
use topowalk_output::{save_catalog, write_arp, write_fdb, Diagram};
use topowalk_snmp::{Connector, SnmpSession, UdpConnector};
use tracing::info;

use crate::args::{Cli, Commands};
use crate::printer::{format_hop, print_arp, print_fdb, StepPrinter, CODES_LEGEND};

/// Run the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let connector: Arc<dyn Connector> = Arc::new(UdpConnector::new(cli.snmp_timeout(), cli.retries));

    match cli.command {
        Commands::Discover {
            config,
            root,
            depth,
            diagram,
            catalog,
            title,
        } => {
            let config = Config::load(&config.config)?;
            let options = DiscoverOptions {
                root,
                depth,
                diagram,
                catalog,
                title,
            };
            discover(&config, connector, &options).await.map(|_| ())
        }
        Commands::TraceMac { config, root, mac } => {
            let config = Config::load(&config.config)?;
            trace_mac(&config, connector, root, mac).await
        }
        Commands::GetMacs {
            config,
            node,
            mac,
            port,
            csv,
        } => {
            let config = Config::load(&config.config)?;
            let session = SnmpSession::open(connector.as_ref(), node, &config.snmp).await?;
            let entries: Vec<_> = fdb::collect(&session, connector.as_ref())
                .await
                .into_iter()
                .filter(|e| mac.as_ref().map_or(true, |mac| &e.mac == mac))
                .filter(|e| port.as_deref().map_or(true, |p| e.port.as_deref() == Some(p)))
                .collect();
            match csv {
                Some(path) => write_fdb(&entries, File::create(&path)?),
                None => {
                    print_fdb(&entries);
                    Ok(())
                }
            }
        }
        Commands::GetArp {
            config,
            node,
            ip,
            mac,
            csv,
        } => {
            let config = Config::load(&config.config)?;
            let session = SnmpSession::open(connector.as_ref(), node, &config.snmp).await?;
            let entries: Vec<_> = arp::collect(&session)
                .await
                .into_iter()
                .filter(|e| e.matches(ip, mac))
                .collect();
            match csv {
                Some(path) => write_arp(&entries, File::create(&path)?),
                None => {
                    print_arp(&entries);
                    Ok(())
                }
            }
        }
        Commands::NewConfig { path, force } => new_config(path.as_deref(), force),
        Commands::CheckConfig { config } => check_config(&config.config),
    }
}

/// What `discover` writes besides the progress lines
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub root: Ipv4Addr,
    pub depth: usize,
    pub diagram: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub title: String,
}

/// Walk the network from `options.root`, then write the requested files.
///
/// Returns the graph so callers can inspect it.
pub async fn discover(
    config: &Config,
    connector: Arc<dyn Connector>,
    options: &DiscoverOptions,
) -> Result<Graph> {
    println!("{}\n", CODES_LEGEND);

    let mut walker = Walker::new(DiscoveryContext::from_config(config), connector)
        .with_max_depth(options.depth)
        .with_observer(Arc::new(StepPrinter::new()));

    walker.discover(options.root).await?;
    walker.discover_details().await;

    let mut graph = walker.into_graph();
    drop_unwanted_members(&mut graph, &config.diagram);
    println!(
        "\nDiscovered {} nodes and {} links",
        graph.len(),
        graph.link_count()
    );

    if let Some(path) = &options.diagram {
        Diagram::new(&graph, &config.diagram)
            .with_title(options.title.as_str())
            .save(path)?;
        println!("Diagram written to {}", path.display());
    }
    if let Some(path) = &options.catalog {
        save_catalog(&graph, path)?;
        println!("Catalog written to {}", path.display());
    }
    Ok(graph)
}

/// Stack and VSS member lists are only kept when the diagram asks for them
fn drop_unwanted_members(graph: &mut Graph, diagram: &DiagramConfig) {
    let ids: Vec<_> = graph.ids().collect();
    for id in ids {
        let node = &mut graph[id];
        if !diagram.get_stack_members {
            node.stack.members.clear();
        }
        if !diagram.get_vss_members {
            node.vss.members.clear();
        }
    }
}

async fn trace_mac(
    config: &Config,
    connector: Arc<dyn Connector>,
    root: Ipv4Addr,
    mac: MacAddr,
) -> Result<()> {
    let tracer = MacTracer::new(DiscoveryContext::from_config(config), connector);
    let hops = tracer.trace(root, mac).await?;

    println!("Tracing {} from {}", mac, root);
    for hop in &hops {
        println!("{}", format_hop(hop));
    }
    Ok(())
}

fn new_config(path: Option<&Path>, force: bool) -> Result<()> {
    let text = Config::template();
    let Some(path) = path else {
        println!("{}", text);
        return Ok(());
    };
    if path.exists() && !force {
        return Err(Error::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    fs::write(path, text)?;
    info!(path = %path.display(), "Configuration template written");
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    println!("{} is valid", path.display());
    println!("  SNMP credentials: {}", config.snmp.len());
    for credential in &config.snmp {
        println!("    {}", credential.label());
    }
    println!("  Domains: {}", config.domains.join(", "));
    println!("  Discovery ACL entries: {}", config.discover.len());
    for entry in config.discover.entries() {
        println!("    {}", entry.source());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use topowalk_discovery::{Node, StackInfo, StackMember};

    #[test]
    fn test_new_config_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topowalk.json");

        new_config(Some(&path), false).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.snmp.len(), 3);

        assert!(new_config(Some(&path), false).is_err());
        new_config(Some(&path), true).unwrap();
        assert!(check_config(&path).is_ok());
    }

    #[test]
    fn test_check_config_rejects_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"snmp": [{"ver": 2}]}"#).unwrap();
        assert!(check_config(&path).is_err());
        assert!(check_config(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_drop_unwanted_members() {
        let mut graph = Graph::new();
        let mut node = Node::new(Some("stack".to_string()), "10.0.0.1");
        node.stack = StackInfo {
            count: 2,
            members: vec![StackMember::default(), StackMember::default()],
        };
        let id = graph.add_node(node);

        let keep = DiagramConfig {
            get_stack_members: true,
            ..Default::default()
        };
        drop_unwanted_members(&mut graph, &keep);
        assert_eq!(graph[id].stack.members.len(), 2);

        drop_unwanted_members(&mut graph, &DiagramConfig::default());
        assert!(graph[id].stack.members.is_empty());
        assert_eq!(graph[id].stack.count, 2);
    }
}
