//! CLI interface for topowalk
//!
//! This crate provides the command-line interface: argument parsing,
//! command dispatch and the terminal printers for discovery progress,
//! MAC traces and ARP/forwarding tables.

pub mod args;
pub mod commands;
pub mod printer;

pub use args::{Cli, Commands};
pub use commands::{discover, run, DiscoverOptions};
pub use printer::StepPrinter;
