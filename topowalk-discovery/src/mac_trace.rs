//! MAC address tracing
//!
//! Follows a MAC address from switch to switch: find the port it was
//! learned on, then the CDP/LLDP neighbor behind that port (or behind the
//! port's LAG), and repeat on that neighbor. The trace ends at an edge port
//! or on a device that has not learned the address.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use topowalk_core::{is_sentinel_ip, Error, MacAddr, Result};
use topowalk_snmp::{Connector, SnmpSession};
use tracing::{debug, info};

use crate::fdb;
use crate::names::canonical_host_name;
use crate::node::Node;
use crate::query::QueryFlags;
use crate::walker::{DeviceHandle, DiscoveryContext};

/// One switch on the path of a MAC address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHop {
    pub name: String,
    pub ip: Ipv4Addr,
    pub vlan: Option<u16>,
    /// Port the address was learned on; `None` if this device has not seen it
    pub port: Option<String>,
    /// Neighbor behind `port`, when the trace continues
    pub next: Option<String>,
}

pub struct MacTracer {
    context: DiscoveryContext,
    connector: Arc<dyn Connector>,
}

impl MacTracer {
    pub fn new(context: DiscoveryContext, connector: Arc<dyn Connector>) -> Self {
        Self { context, connector }
    }

    /// Trace `mac` starting at the device at `start`.
    ///
    /// Fails if a device does not answer SNMP, or with
    /// [`Error::MacTraceLoop`] when the path comes back to a device it
    /// already crossed.
    pub async fn trace(&self, start: Ipv4Addr, mac: MacAddr) -> Result<Vec<TraceHop>> {
        info!(start = %start, mac = %mac, "Tracing MAC address");

        let mut hops = Vec::new();
        let mut visited = HashSet::new();
        let mut ip = start;

        loop {
            let session =
                SnmpSession::open(self.connector.as_ref(), ip, &self.context.credentials).await?;
            let mut device = DeviceHandle::new(session);

            let mut node = Node::new(None, ip.to_string());
            device
                .query(&self.context.domains)
                .query(&mut node, QueryFlags::NAME)
                .await;
            if node.name.is_empty() {
                node.name = ip.to_string();
            }
            if !visited.insert(node.name.clone()) {
                return Err(Error::MacTraceLoop {
                    mac: mac.to_string(),
                    node: node.name,
                });
            }

            let Some(entry) = fdb::find(device.session(), self.connector.as_ref(), mac).await else {
                debug!(name = %node.name, mac = %mac, "MAC not learned here");
                hops.push(TraceHop {
                    name: node.name,
                    ip,
                    vlan: None,
                    port: None,
                    next: None,
                });
                break;
            };

            let neighbors = device.query(&self.context.domains).neighbors().await;
            let next = entry.port.as_deref().and_then(|port| {
                neighbors.into_iter().find(|n| {
                    n.local_port.as_deref() == Some(port) || n.local_lag.as_deref() == Some(port)
                })
            });
            let next_ip = next
                .as_ref()
                .and_then(|n| n.remote.ip.as_deref())
                .filter(|ip| !is_sentinel_ip(ip))
                .and_then(|ip| ip.parse::<Ipv4Addr>().ok());
            let next_name = next.as_ref().and_then(|n| {
                let raw = n.remote.name.as_deref()?;
                canonical_host_name(raw, &self.context.domains)
            });

            debug!(name = %node.name, port = ?entry.port, next = ?next_name, "Trace hop");
            hops.push(TraceHop {
                name: node.name,
                ip,
                vlan: Some(entry.vlan),
                port: entry.port,
                next: next_name,
            });

            match next_ip {
                Some(next) => ip = next,
                None => break,
            }
        }

        Ok(hops)
    }
}
