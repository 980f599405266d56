//! Simulated networks for the walker tests

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use topowalk_core::{Acl, Credential, MacAddr};
use topowalk_discovery::{
    DiscoveryContext, DiscoveryObserver, DiscoveryStep, Graph, Node, NodeId, Walker,
};
use topowalk_snmp::testing::{MemoryConnector, MemoryDevice};
use topowalk_snmp::SnmpValue;

pub const DOMAINS: &[&str] = &[".example.com"];

/// One simulated device, built up port by port
pub struct Device {
    ip: Ipv4Addr,
    inner: MemoryDevice,
    cdp_instance: u32,
    lldp_index: u32,
    vlans: Vec<u16>,
}

impl Device {
    pub fn new(sys_name: &str, ip: &str) -> Self {
        Self {
            ip: ip.parse().unwrap(),
            inner: MemoryDevice::new()
                .community("public")
                .set("1.3.6.1.2.1.1.5.0", sys_name),
            cdp_instance: 0,
            lldp_index: 0,
            vlans: Vec::new(),
        }
    }

    pub fn set<V: Into<SnmpValue>>(mut self, oid: &str, value: V) -> Self {
        self.inner = self.inner.set(oid, value);
        self
    }

    pub fn port(self, if_index: u32, name: &str) -> Self {
        self.set(&format!("1.3.6.1.2.1.31.1.1.1.1.{}", if_index), name)
    }

    /// Chassis entity with serial and model
    pub fn chassis(self, serial: &str, platform: &str) -> Self {
        self.set("1.3.6.1.2.1.47.1.1.1.1.5.1001", 3i64)
            .set("1.3.6.1.2.1.47.1.1.1.1.11.1001", serial)
            .set("1.3.6.1.2.1.47.1.1.1.1.13.1001", platform)
    }

    /// CDP neighbor heard on `if_index`
    pub fn cdp(
        mut self,
        if_index: u32,
        device_id: &str,
        ip: Option<&str>,
        port: &str,
        platform: &str,
    ) -> Self {
        self.cdp_instance += 1;
        let index = format!("{}.{}", if_index, self.cdp_instance);
        let column = |c: u32| format!("1.3.6.1.4.1.9.9.23.1.2.1.1.{}.{}", c, index);

        if let Some(ip) = ip {
            let ip: Ipv4Addr = ip.parse().unwrap();
            self.inner = self.inner.set_octets(&column(4), &ip.octets());
        }
        self.set(&column(6), device_id)
            .set(&column(7), port)
            .set(&column(8), platform)
    }

    /// LLDP neighbor heard on local port `if_index`
    pub fn lldp(mut self, if_index: u32, sys_name: &str, ip: Option<&str>, port: &str) -> Self {
        self.lldp_index += 1;
        let index = format!("0.{}.{}", if_index, self.lldp_index);
        let column = |c: u32| format!("1.0.8802.1.1.2.1.4.1.1.{}.{}", c, index);

        let mut device = self
            .set(&column(4), 7i64)
            .set(&column(5), sys_name)
            .set(&column(7), port)
            .set(&column(9), sys_name);
        if let Some(ip) = ip {
            device = device.set(
                &format!("1.0.8802.1.1.2.1.4.2.1.5.{}.1.4.{}", index, ip),
                2i64,
            );
        }
        device
    }

    /// Make `member` part of the LAG whose interface is `aggregate`
    pub fn lag(self, member: u32, aggregate: u32) -> Self {
        self.set(
            &format!("1.2.840.10006.300.43.1.2.1.1.12.{}", member),
            i64::from(aggregate),
        )
    }

    pub fn trunk(self, if_index: u32, native: i64, allowed: &[u8]) -> Self {
        let mut device = self
            .set(&format!("1.3.6.1.4.1.9.9.46.1.6.1.1.14.{}", if_index), 1i64)
            .set(&format!("1.3.6.1.4.1.9.9.46.1.6.1.1.5.{}", if_index), native);
        device.inner = device.inner.set_octets(
            &format!("1.3.6.1.4.1.9.9.46.1.6.1.1.4.{}", if_index),
            allowed,
        );
        device
    }

    /// VPC domain whose peer-link is `peerlink_if`
    pub fn vpc(self, domain: u32, peerlink_if: u32) -> Self {
        self.set(
            &format!("1.3.6.1.4.1.9.9.807.1.4.1.1.2.{}", domain),
            i64::from(peerlink_if),
        )
    }

    /// `mac` learned in `vlan` on bridge port `bridge_port`, which is `if_index`
    pub fn learned(mut self, vlan: u16, mac: MacAddr, bridge_port: u32, if_index: u32) -> Self {
        if !self.vlans.contains(&vlan) {
            self.vlans.push(vlan);
            self = self.set(&format!("1.3.6.1.4.1.9.9.46.1.3.1.1.2.1.{}", vlan), 1i64);
        }
        let index = mac.to_oid_index();
        self.inner = self
            .inner
            .set_vlan(
                vlan,
                &format!("1.3.6.1.2.1.17.4.3.1.1.{}", index),
                SnmpValue::Octets(mac.as_bytes().to_vec()),
            )
            .set_vlan(
                vlan,
                &format!("1.3.6.1.2.1.17.4.3.1.2.{}", index),
                i64::from(bridge_port),
            )
            .set_vlan(
                vlan,
                &format!("1.3.6.1.2.1.17.1.4.1.2.{}", bridge_port),
                i64::from(if_index),
            );
        self
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn into_inner(self) -> MemoryDevice {
        self.inner
    }
}

/// Serve every device at its address
pub fn network(devices: Vec<Device>) -> Arc<MemoryConnector> {
    let mut connector = MemoryConnector::new();
    for device in devices {
        let ip = device.ip();
        connector.add_device(ip, device.into_inner());
    }
    Arc::new(connector)
}

pub fn context(acl: &[&str]) -> DiscoveryContext {
    DiscoveryContext {
        credentials: vec![Credential::v2c("public")],
        domains: DOMAINS.iter().map(|d| d.to_string()).collect(),
        acl: Acl::parse(acl.iter().copied()).unwrap(),
    }
}

pub fn walker(connector: &Arc<MemoryConnector>, acl: &[&str], max_depth: usize) -> Walker {
    Walker::new(context(acl), connector.clone()).with_max_depth(max_depth)
}

pub fn node<'a>(graph: &'a Graph, name: &str) -> &'a Node {
    graph
        .nodes()
        .iter()
        .find(|n| n.name == name)
        .unwrap_or_else(|| panic!("no node named {}", name))
}

pub fn id_of(graph: &Graph, name: &str) -> NodeId {
    graph
        .ids()
        .find(|&id| graph[id].name == name)
        .unwrap_or_else(|| panic!("no node named {}", name))
}

/// Collects progress steps
#[derive(Default)]
pub struct Recorder {
    steps: Mutex<Vec<DiscoveryStep>>,
}

impl Recorder {
    pub fn steps(&self) -> Vec<DiscoveryStep> {
        self.steps.lock().unwrap().clone()
    }
}

impl DiscoveryObserver for Recorder {
    fn on_step(&self, step: &DiscoveryStep) {
        self.steps.lock().unwrap().push(step.clone());
    }
}
