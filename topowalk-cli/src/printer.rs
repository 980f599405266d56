//! Terminal output: discovery progress and result tables

use topowalk_discovery::{ArpEntry, DiscoveryObserver, DiscoveryStep, FdbEntry, TraceHop};

/// Legend printed before a discovery run
pub const CODES_LEGEND: &str = "\
Discovery codes:
    [root]  seed node        !  SNMP failed
    [ cdp]  found via CDP    +  added to the graph
    [lldp]  found via LLDP   >  queued for expansion
                             i  include stub
                             L  leaf node";

/// Prints each discovery step on stdout, indented by depth
#[derive(Debug, Default)]
pub struct StepPrinter;

impl StepPrinter {
    pub fn new() -> Self {
        Self
    }
}

/// One progress line: codes, then the node indented by its depth
pub fn format_step(step: &DiscoveryStep) -> String {
    let name = if step.name.is_empty() {
        "UNKNOWN"
    } else {
        step.name.as_str()
    };
    let mut line = format!(
        "{} {:indent$}{} ({})",
        step.codes,
        "",
        name,
        step.ip,
        indent = step.depth * 2
    );
    if let Some(platform) = &step.platform {
        line.push(' ');
        line.push_str(platform);
    }
    line
}

impl DiscoveryObserver for StepPrinter {
    fn on_step(&self, step: &DiscoveryStep) {
        println!("{}", format_step(step));
    }
}

pub fn format_hop(hop: &TraceHop) -> String {
    let port = hop.port.as_deref().unwrap_or("not found");
    let vlan = hop.vlan.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    match &hop.next {
        Some(next) => format!("{:<24} {:<15} vlan {:<5} {} -> {}", hop.name, hop.ip, vlan, port, next),
        None => format!("{:<24} {:<15} vlan {:<5} {}", hop.name, hop.ip, vlan, port),
    }
}

pub fn print_fdb(entries: &[FdbEntry]) {
    println!("{:<6} {:<16} {}", "VLAN", "MAC", "Port");
    for entry in entries {
        println!(
            "{:<6} {:<16} {}",
            entry.vlan,
            entry.mac.to_string(),
            entry.port.as_deref().unwrap_or("?")
        );
    }
}

pub fn print_arp(entries: &[ArpEntry]) {
    println!("{:<16} {:<16} {:<12} {:<6} {}", "IP", "MAC", "Interface", "VLAN", "Type");
    for entry in entries {
        println!(
            "{:<16} {:<16} {:<12} {:<6} {}",
            entry.ip.to_string(),
            entry.mac.to_string(),
            entry.interface.as_deref().unwrap_or(""),
            entry.vlan.map(|v| v.to_string()).unwrap_or_default(),
            entry.entry_type
        );
    }
}
