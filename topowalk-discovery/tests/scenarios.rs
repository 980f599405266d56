//! End-to-end discovery runs over simulated networks

mod common;

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use common::*;
use topowalk_core::{is_sentinel_ip, Error, MacAddr};
use topowalk_discovery::{DiscoveryCodes, Graph, LinkType, MacTracer};

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// Distinct nodes never share a name or a real address
fn assert_unique_identities(graph: &Graph) {
    let mut names = HashSet::new();
    let mut ips = HashSet::new();
    for node in graph.nodes() {
        assert!(names.insert(node.name.clone()), "duplicate name {}", node.name);
        for addr in node.ips.iter().filter(|a| !is_sentinel_ip(a)) {
            assert!(ips.insert(addr.clone()), "address {} on two nodes", addr);
        }
    }
}

/// No adjacency is recorded once from each end
fn assert_links_merged(graph: &Graph) {
    for (owner, l1) in graph.links() {
        for (other, l2) in graph.links() {
            let reverse = other == l1.remote
                && l2.remote == owner
                && l1.local_port.is_some()
                && l1.local_port == l2.remote_port;
            assert!(
                !reverse,
                "{} {:?} recorded from both ends",
                graph[owner].name, l1.local_port
            );
        }
    }
}

#[tokio::test]
async fn test_two_device_cdp() {
    let net = network(vec![
        Device::new("core1", "10.0.0.1")
            .port(1, "GigabitEthernet0/1")
            .cdp(1, "edge1", Some("10.0.0.2"), "GigabitEthernet0/24", "cisco WS-C2960-24TT-L"),
        Device::new("edge1", "10.0.0.2")
            .port(24, "GigabitEthernet0/24")
            .cdp(24, "core1", Some("10.0.0.1"), "GigabitEthernet0/1", "cisco WS-C3850-48T"),
    ]);
    let mut walker = walker(&net, &["permit ip 10.0.0.0/8"], 2);

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let graph = walker.graph();

    assert_eq!(graph.len(), 2);
    assert_eq!(walker.root_node().unwrap().name, "core1");
    assert_eq!(graph.link_count(), 1);

    let link = &node(graph, "core1").links[0];
    assert_eq!(link.local_port.as_deref(), Some("gi0/1"));
    assert_eq!(link.remote_port.as_deref(), Some("gi0/24"));
    assert_eq!(graph[link.remote].name, "edge1");
    assert_eq!(link.link_type, LinkType::Routed);
    assert!(node(graph, "edge1").links.is_empty());

    // Advertised platform lands on the remote node
    assert_eq!(
        node(graph, "edge1").platform.as_deref(),
        Some("cisco WS-C2960-24TT-L")
    );
}

#[tokio::test]
async fn test_vpc_peers_paired() {
    let nexus = |name: &str, addr: &str, peer: &str, peer_ip: &str| {
        Device::new(name, addr)
            .port(1, "Ethernet1/1")
            .port(1000, "port-channel10")
            .lag(1, 1000)
            .vpc(100, 1000)
            .cdp(1, peer, Some(peer_ip), "Ethernet1/1", "N9K-C93180YC-EX")
    };
    let net = network(vec![
        nexus("nexus-a", "10.0.1.1", "nexus-b", "10.0.1.2"),
        nexus("nexus-b", "10.0.1.2", "nexus-a", "10.0.1.1"),
    ]);
    let mut walker = walker(&net, &["permit ip any"], 10);

    walker.discover(ip("10.0.1.1")).await.unwrap();
    walker.discover_details().await;
    let graph = walker.graph();

    let a = id_of(graph, "nexus_a");
    let b = id_of(graph, "nexus_b");
    assert_eq!(graph[a].vpc_domain.as_deref(), Some("100"));
    assert_eq!(graph[a].vpc_peerlink_if.as_deref(), Some("po10"));
    assert_eq!(graph[a].vpc_peerlink_node, Some(b));
    assert_eq!(graph[b].vpc_peerlink_node, Some(a));
    assert_eq!(graph.link_count(), 1);
    assert_eq!(graph[a].links[0].local_lag.as_deref(), Some("po10"));
    assert_eq!(graph[a].links[0].remote_lag.as_deref(), Some("po10"));
}

#[tokio::test]
async fn test_esx_stub_without_address() {
    let net = network(vec![Device::new("core1", "10.0.0.1")
        .port(7, "GigabitEthernet0/7")
        .cdp(7, "esx-17", Some("0.0.0.0"), "vmnic0", "VMware ESX")]);
    let mut walker = walker(&net, &["permit ip any"], 5);

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let graph = walker.graph();

    let esx = id_of(graph, "esx_17");
    assert_eq!(graph[esx].ips, vec!["0.0.0.0".to_string()]);
    assert!(!graph[esx].snmp_reachable);
    assert!(!graph[esx].discovered);
    assert!(graph[esx].links.is_empty());
    assert_eq!(graph.links().filter(|(_, l)| l.remote == esx).count(), 1);
}

#[tokio::test]
async fn test_hostname_alias() {
    let net = network(vec![
        Device::new("core1", "10.1.1.2")
            .port(1, "GigabitEthernet0/1")
            .cdp(1, "router-a", Some("10.1.1.1"), "GigabitEthernet0/0", "cisco ISR4331"),
        Device::new("router-a.example.com", "10.1.1.1")
            .port(1, "GigabitEthernet0/0")
            .cdp(1, "core1", Some("10.1.1.2"), "GigabitEthernet0/1", "cisco WS-C3850"),
    ]);
    let mut walker = walker(&net, &["permit ip 10.0.0.0/8"], 3);

    walker.discover(ip("10.1.1.2")).await.unwrap();
    let graph = walker.graph();

    let routers: Vec<_> = graph.nodes().iter().filter(|n| n.name.starts_with("router")).collect();
    assert_eq!(routers.len(), 1);
    assert_eq!(routers[0].name, "router_a");
    assert!(routers[0].has_ip("10.1.1.1"));
    assert_eq!(graph.link_count(), 1);
}

#[tokio::test]
async fn test_alias_under_second_address() {
    // The router is advertised twice: by core1 on its first interface and
    // by sw2, under another name, on its second one
    let router = |addr: &str| {
        Device::new("router-a.example.com", addr)
            .port(1, "GigabitEthernet0/0")
            .port(2, "GigabitEthernet0/1")
    };
    let net = network(vec![
        Device::new("core1", "10.1.1.2")
            .port(1, "GigabitEthernet0/1")
            .port(2, "GigabitEthernet0/2")
            .cdp(1, "router-a", Some("10.1.1.1"), "GigabitEthernet0/0", "cisco ISR4331")
            .cdp(2, "sw2", Some("10.1.1.3"), "GigabitEthernet0/1", "cisco WS-C2960"),
        Device::new("sw2", "10.1.1.3")
            .port(1, "GigabitEthernet0/1")
            .port(2, "GigabitEthernet0/2")
            .cdp(1, "core1", Some("10.1.1.2"), "GigabitEthernet0/2", "cisco WS-C3850")
            .cdp(2, "rtr-a-mgmt", Some("10.1.2.1"), "GigabitEthernet0/1", "cisco ISR4331"),
        router("10.1.1.1"),
        router("10.1.2.1"),
    ]);
    let mut walker = walker(&net, &["permit ip 10.0.0.0/8"], 5);

    walker.discover(ip("10.1.1.2")).await.unwrap();
    let graph = walker.graph();

    assert_unique_identities(graph);
    let router = node(graph, "router_a");
    assert!(router.has_ip("10.1.1.1"));
    assert!(router.has_ip("10.1.2.1"));
    assert_eq!(graph.len(), 3);
    assert_eq!(net.connect_count(ip("10.1.2.1")), 1);
}

#[tokio::test]
async fn test_leaf_access_point() {
    let net = network(vec![
        Device::new("core1", "10.0.0.1")
            .port(3, "GigabitEthernet0/3")
            .cdp(3, "ap1", Some("10.0.0.20"), "GigabitEthernet0", "AIR-CAP3702I-E-K9"),
        Device::new("ap1", "10.0.0.20")
            .chassis("FGL1234ABCD", "AIR-CAP3702I-E-K9")
            .port(1, "GigabitEthernet0")
            .cdp(1, "core1", Some("10.0.0.1"), "GigabitEthernet0/3", "cisco WS-C3850")
            .cdp(1, "phone1", Some("10.0.0.30"), "Port 1", "Cisco IP Phone 8841"),
        Device::new("phone1", "10.0.0.30"),
    ]);
    let recorder = Arc::new(Recorder::default());
    let mut walker = walker(&net, &["leaf platform ^AIR-CAP", "permit ip 10.0.0.0/8"], 10)
        .with_observer(recorder.clone());

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let graph = walker.graph();

    let ap = id_of(graph, "ap1");
    assert!(graph[ap].snmp_reachable);
    assert_eq!(graph[ap].serial.as_deref(), Some("FGL1234ABCD"));
    assert!(graph[ap].links.is_empty());
    assert_eq!(graph.links().filter(|(_, l)| l.remote == ap).count(), 1);
    assert!(graph.find_by_name("phone1").is_none());
    assert_eq!(net.connect_count(ip("10.0.0.30")), 0);

    let step = recorder.steps().into_iter().find(|s| s.name == "ap1").unwrap();
    assert!(step.codes.contains(DiscoveryCodes::LEAF | DiscoveryCodes::DISCOVERED));
    assert!(!step.codes.contains(DiscoveryCodes::STEP_INTO));
}

#[tokio::test]
async fn test_include_stub_not_queried() {
    let net = network(vec![
        Device::new("core1", "10.0.0.1")
            .port(2, "GigabitEthernet0/2")
            .cdp(2, "fw-edge", Some("10.0.0.254"), "port1", "FortiGate-100F"),
        Device::new("fw-edge", "10.0.0.254"),
    ]);
    let recorder = Arc::new(Recorder::default());
    let mut walker = walker(&net, &["include host ^fw_", "permit ip any"], 10)
        .with_observer(recorder.clone());

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let graph = walker.graph();

    let fw = node(graph, "fw_edge");
    assert!(fw.is_stub);
    assert!(!fw.snmp_reachable);
    assert_eq!(fw.platform.as_deref(), Some("FortiGate-100F"));
    assert_eq!(net.connect_count(ip("10.0.0.254")), 0);

    let step = recorder.steps().into_iter().find(|s| s.name == "fw_edge").unwrap();
    assert!(step.codes.contains(DiscoveryCodes::INCLUDE | DiscoveryCodes::DISCOVERED));
    assert!(!step.codes.contains(DiscoveryCodes::ERR_SNMP));
    assert!(!step.codes.contains(DiscoveryCodes::STEP_INTO));
}

#[tokio::test]
async fn test_silent_neighbor_flagged() {
    let net = network(vec![
        Device::new("core1", "10.0.0.1")
            .port(3, "GigabitEthernet0/3")
            .cdp(3, "dark", Some("10.0.0.77"), "Gi0/1", "cisco WS-C2960"),
    ]);
    let recorder = Arc::new(Recorder::default());
    let mut walker = walker(&net, &["permit ip any"], 10).with_observer(recorder.clone());

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let graph = walker.graph();

    let dark = node(graph, "dark");
    assert!(!dark.snmp_reachable);
    assert!(!dark.is_stub);
    assert_eq!(graph.links().filter(|(_, l)| l.remote == id_of(graph, "dark")).count(), 1);

    let step = recorder.steps().into_iter().find(|s| s.name == "dark").unwrap();
    assert_eq!(step.depth, 1);
    assert!(step.codes.contains(DiscoveryCodes::CDP | DiscoveryCodes::DISCOVERED | DiscoveryCodes::ERR_SNMP));
    assert!(!step.codes.contains(DiscoveryCodes::STEP_INTO));
}

#[tokio::test]
async fn test_denied_after_query() {
    let net = network(vec![
        Device::new("core1", "10.0.0.1")
            .port(1, "GigabitEthernet0/1")
            .port(2, "GigabitEthernet0/2")
            .cdp(1, "lab-sw", Some("10.0.0.9"), "Gi0/1", "cisco WS-C2960")
            .cdp(2, "lab-sw-2", Some("10.0.0.9"), "Gi0/2", "cisco WS-C2960"),
        Device::new("lab-sw", "10.0.0.9").chassis("LAB0001", "WS-C2960"),
    ]);
    let mut walker = walker(&net, &["deny serial ^LAB", "permit ip any"], 10);

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let graph = walker.graph();

    assert_eq!(graph.len(), 1);
    assert_eq!(graph.link_count(), 0);
    // Second advertisement of the same address is not contacted again
    assert_eq!(net.connect_count(ip("10.0.0.9")), 1);
}

#[tokio::test]
async fn test_trunk_vlans_on_links() {
    let net = network(vec![
        Device::new("core1", "10.0.0.1")
            .port(1, "GigabitEthernet0/1")
            .port(2, "GigabitEthernet0/2")
            .trunk(1, 1, &[0x00, 0x38])
            .trunk(2, 99, &[])
            .cdp(1, "edge1", None, "GigabitEthernet0/1", "cisco WS-C2960")
            .cdp(2, "edge2", None, "GigabitEthernet0/1", "cisco WS-C2960"),
    ]);
    let mut walker = walker(&net, &["permit ip any"], 10);

    walker.discover(ip("10.0.0.1")).await.unwrap();
    let core = node(walker.graph(), "core1");

    let first = core.links.iter().find(|l| l.local_port.as_deref() == Some("gi0/1")).unwrap();
    assert_eq!(first.link_type, LinkType::Trunk);
    assert_eq!(first.local_native_vlan.as_deref(), Some("1"));
    assert_eq!(first.local_allowed_vlans.as_deref(), Some("10-12"));

    let second = core.links.iter().find(|l| l.local_port.as_deref() == Some("gi0/2")).unwrap();
    assert_eq!(second.local_native_vlan.as_deref(), Some("99"));
    assert_eq!(second.local_allowed_vlans.as_deref(), Some("All"));
}

fn switch_ip(i: usize) -> String {
    format!("10.0.2.{}", i + 1)
}

/// s0 - s1 - s2 ... in a line, each adjacency heard over CDP and LLDP,
/// with a second parallel link between s1 and s2
fn chain(len: usize) -> Arc<topowalk_snmp::testing::MemoryConnector> {
    let devices = (0..len)
        .map(|i| {
            let mut device = Device::new(&format!("s{}", i), &switch_ip(i))
                .port(1, "GigabitEthernet0/1")
                .port(2, "GigabitEthernet0/2")
                .port(3, "GigabitEthernet0/3");
            if i > 0 {
                let prev = format!("s{}", i - 1);
                device = device
                    .cdp(1, &prev, Some(switch_ip(i - 1).as_str()), "GigabitEthernet0/2", "cisco WS-C3850")
                    .lldp(1, &prev, Some(switch_ip(i - 1).as_str()), "Gi0/2");
            }
            if i + 1 < len {
                let next = format!("s{}", i + 1);
                device = device
                    .cdp(2, &next, Some(switch_ip(i + 1).as_str()), "GigabitEthernet0/1", "cisco WS-C3850")
                    .lldp(2, &next, Some(switch_ip(i + 1).as_str()), "Gi0/1");
            }
            if i == 1 && len > 2 {
                device = device.cdp(3, "s2", Some(switch_ip(2).as_str()), "GigabitEthernet0/3", "cisco WS-C3850");
            }
            if i == 2 {
                device = device.cdp(3, "s1", Some(switch_ip(1).as_str()), "GigabitEthernet0/3", "cisco WS-C3850");
            }
            device
        })
        .collect();
    network(devices)
}

#[tokio::test]
async fn test_depth_bound() {
    for max_depth in 0..=5 {
        let net = chain(5);
        let mut walker = walker(&net, &["permit ip any"], max_depth);
        walker.discover(ip(&switch_ip(0))).await.unwrap();
        let graph = walker.graph();

        assert_eq!(graph.len(), (max_depth + 1).min(5), "max_depth {}", max_depth);
        for depth in graph.depths() {
            let depth = depth.expect("every node reachable from the root");
            assert!(depth <= max_depth);
        }
    }
}

#[tokio::test]
async fn test_chain_invariants() {
    let net = chain(5);
    let mut walker = walker(&net, &["permit ip any"], 10);
    walker.discover(ip(&switch_ip(0))).await.unwrap();
    walker.discover_details().await;
    let graph = walker.graph();

    assert_unique_identities(graph);
    assert_links_merged(graph);
    for i in 0..5 {
        assert_eq!(net.connect_count(ip(&switch_ip(i))), 1);
    }

    // Four adjacencies plus the parallel s1-s2 link
    assert_eq!(graph.link_count(), 5);
    let s1 = id_of(graph, "s1");
    let s2 = id_of(graph, "s2");
    assert_eq!(graph[s1].links.iter().filter(|l| l.remote == s2).count(), 2);
}

#[tokio::test]
async fn test_full_mesh_invariants() {
    let names = ["m0", "m1", "m2", "m3"];
    let mesh_ip = |i: usize| format!("10.0.4.{}", i + 1);
    let devices = (0..names.len())
        .map(|i| {
            let mut device = Device::new(names[i], &mesh_ip(i));
            for j in (0..names.len()).filter(|&j| j != i) {
                let local = 10 + j as u32;
                device = device
                    .port(local, &format!("GigabitEthernet1/0/{}", local))
                    .cdp(local, names[j], Some(mesh_ip(j).as_str()), &format!("GigabitEthernet1/0/{}", 10 + i), "cisco C9300")
                    .lldp(local, names[j], Some(mesh_ip(j).as_str()), &format!("Gi1/0/{}", 10 + i));
            }
            device
        })
        .collect();
    let net = network(devices);
    let mut walker = walker(&net, &["permit ip any"], 10);

    walker.discover(ip(&mesh_ip(0))).await.unwrap();
    let graph = walker.graph();

    assert_eq!(graph.len(), 4);
    assert_eq!(graph.link_count(), 6);
    assert_unique_identities(graph);
    assert_links_merged(graph);
    for i in 0..names.len() {
        assert!(net.connect_count(ip(&mesh_ip(i))) <= 1);
    }
    assert!(graph.nodes().iter().all(|n| n.discovered));
}

const TRACED: MacAddr = MacAddr::new([0x00, 0x50, 0x56, 0x9a, 0x00, 0x01]);

fn trace_switch(name: &str, addr: &str) -> Device {
    Device::new(name, addr)
        .port(1, "GigabitEthernet0/1")
        .port(5, "GigabitEthernet0/5")
        .port(1000, "Port-channel1")
}

#[tokio::test]
async fn test_mac_trace_to_edge_port() {
    let net = network(vec![
        trace_switch("sw1", "10.0.3.1")
            .lag(1, 1000)
            .cdp(1, "sw2", Some("10.0.3.2"), "GigabitEthernet0/1", "cisco WS-C2960")
            .learned(10, TRACED, 1000, 1000),
        trace_switch("sw2", "10.0.3.2")
            .cdp(1, "sw1", Some("10.0.3.1"), "GigabitEthernet0/1", "cisco WS-C3850")
            .learned(10, TRACED, 5, 5),
    ]);
    let tracer = MacTracer::new(context(&[]), net.clone());

    let hops = tracer.trace(ip("10.0.3.1"), TRACED).await.unwrap();

    assert_eq!(hops.len(), 2);
    assert_eq!(hops[0].name, "sw1");
    assert_eq!(hops[0].port.as_deref(), Some("po1"));
    assert_eq!(hops[0].vlan, Some(10));
    assert_eq!(hops[0].next.as_deref(), Some("sw2"));
    assert_eq!(hops[1].name, "sw2");
    assert_eq!(hops[1].ip, ip("10.0.3.2"));
    assert_eq!(hops[1].port.as_deref(), Some("gi0/5"));
    assert_eq!(hops[1].next, None);
}

#[tokio::test]
async fn test_mac_trace_loop() {
    let net = network(vec![
        trace_switch("sw1", "10.0.3.1")
            .cdp(1, "sw2", Some("10.0.3.2"), "GigabitEthernet0/1", "cisco WS-C2960")
            .learned(10, TRACED, 1, 1),
        trace_switch("sw2", "10.0.3.2")
            .cdp(1, "sw1", Some("10.0.3.1"), "GigabitEthernet0/1", "cisco WS-C3850")
            .learned(10, TRACED, 1, 1),
    ]);
    let tracer = MacTracer::new(context(&[]), net.clone());

    let err = tracer.trace(ip("10.0.3.1"), TRACED).await.unwrap_err();
    match err {
        Error::MacTraceLoop { mac, node } => {
            assert_eq!(mac, "0050.569a.0001");
            assert_eq!(node, "sw1");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_mac_trace_not_learned() {
    let net = network(vec![trace_switch("sw1", "10.0.3.1").learned(10, TRACED, 5, 5)]);
    let tracer = MacTracer::new(context(&[]), net.clone());

    let other = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let hops = tracer.trace(ip("10.0.3.1"), other).await.unwrap();

    assert_eq!(hops.len(), 1);
    assert_eq!(hops[0].port, None);
}

#[tokio::test]
async fn test_mac_trace_unreachable_start() {
    let tracer = MacTracer::new(context(&[]), network(Vec::new()));
    let err = tracer.trace(ip("10.0.3.9"), TRACED).await.unwrap_err();
    assert!(matches!(err, Error::Unreachable(_)));
}
