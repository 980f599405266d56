//! Topowalk Core Library
//!
//! This crate provides the error type, shared value types, the run
//! configuration and the discovery ACL used by every other topowalk crate.

pub mod acl;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use acl::{Acl, AclAction, AclEntry, AclSubject};
pub use config::{AuthProtocol, Config, Credential, DiagramConfig, PrivProtocol, UsmCredential};
pub use error::{Error, Result};
pub use types::*;
