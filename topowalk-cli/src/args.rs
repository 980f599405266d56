//! CLI argument parsing

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use topowalk_core::MacAddr;
use topowalk_discovery::DEFAULT_MAX_DEPTH;

/// Configuration file used when `-c` is not given
pub const DEFAULT_CONFIG: &str = "topowalk.json";

#[derive(Parser, Debug)]
#[command(name = "topowalk")]
#[command(version, about = "CDP/LLDP network discovery and diagramming over SNMP", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// SNMP request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value = "2", global = true)]
    pub timeout: u64,

    /// SNMP retries per request
    #[arg(long, default_value = "2", global = true)]
    pub retries: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration file argument shared by the commands that need one
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover the network from a seed device and write a diagram
    Discover {
        #[command(flatten)]
        config: ConfigArg,

        /// Seed device
        #[arg(short, long, value_name = "IP")]
        root: Ipv4Addr,

        /// Maximum hops from the seed
        #[arg(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
        depth: usize,

        /// Write the diagram (Graphviz DOT) here
        #[arg(short = 'o', long, value_name = "FILE")]
        diagram: Option<PathBuf>,

        /// Write the device catalog (CSV) here
        #[arg(short = 'C', long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Diagram title
        #[arg(short, long, default_value = "Network Diagram")]
        title: String,
    },

    /// Follow a MAC address through the switched network
    TraceMac {
        #[command(flatten)]
        config: ConfigArg,

        /// Device to start the trace at
        #[arg(short, long, value_name = "IP")]
        root: Ipv4Addr,

        /// MAC address in any common notation
        #[arg(short, long)]
        mac: MacAddr,
    },

    /// Print the forwarding database of a switch
    GetMacs {
        #[command(flatten)]
        config: ConfigArg,

        /// Device to query
        #[arg(short, long, value_name = "IP")]
        node: Ipv4Addr,

        /// Only this MAC address
        #[arg(short, long)]
        mac: Option<MacAddr>,

        /// Only this port (short name, e.g. gi1/0/5)
        #[arg(short, long)]
        port: Option<String>,

        /// Write CSV here instead of printing a table
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// Print the ARP table of a router
    GetArp {
        #[command(flatten)]
        config: ConfigArg,

        /// Device to query
        #[arg(short, long, value_name = "IP")]
        node: Ipv4Addr,

        /// Only this IP address
        #[arg(short, long)]
        ip: Option<Ipv4Addr>,

        /// Only this MAC address
        #[arg(short, long)]
        mac: Option<MacAddr>,

        /// Write CSV here instead of printing a table
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// Write a starter configuration file
    NewConfig {
        /// Destination; printed to stdout when omitted
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    CheckConfig {
        #[command(flatten)]
        config: ConfigArg,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn snmp_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Default log filter for the `-v` count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
