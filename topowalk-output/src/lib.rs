//! Topowalk Output Library
//!
//! Writers for a discovered graph: the device catalog (CSV), the network
//! diagram (Graphviz DOT) with its node-label templates, and CSV exports of
//! ARP and forwarding-database tables.

pub mod catalog;
pub mod diagram;
pub mod tables;
pub mod template;

// Re-export commonly used types
pub use catalog::{rows_for, save_catalog, write_catalog, CatalogRow};
pub use diagram::Diagram;
pub use tables::{write_arp, write_fdb};
pub use template::{render, FieldSource};
