//! Transport seam
//!
//! Everything above this module talks to devices through [`SnmpAgent`] and
//! opens agents through a [`Connector`]. The production connector speaks
//! SNMP over UDP; the test suites plug in in-memory agents.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use topowalk_core::{Credential, Result};

use crate::value::{SnmpValue, VarBind};

/// One device reachable with one credential
#[async_trait]
pub trait SnmpAgent: Send + Sync {
    /// Single GET. `Ok(None)` when the agent reports the object absent.
    async fn get(&self, oid: &str) -> Result<Option<SnmpValue>>;

    /// Single GETBULK request starting after `oid`.
    ///
    /// Returns at most `max_repetitions` rows in agent order. The rows may
    /// run past the subtree of `oid`; callers decide where to stop.
    async fn get_bulk(&self, oid: &str, max_repetitions: u8) -> Result<Vec<VarBind>>;
}

/// Opens agents for a device address and credential
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, ip: Ipv4Addr, credential: &Credential) -> Result<Box<dyn SnmpAgent>>;
}
