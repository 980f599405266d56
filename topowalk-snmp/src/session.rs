//! Per-device SNMP session
//!
//! A session is created by probing a device with each configured credential
//! in turn. The first credential that gets any answer to a `sysName.0` GET
//! is kept for every later request to that device.
//!
//! Once established, individual operations never fail loudly: a transport
//! error on a GET or a walk is logged and reported as `None`, and the caller
//! treats the affected attribute as unknown.

use std::fmt;
use std::net::Ipv4Addr;

use topowalk_core::{Credential, Error, Result};
use tracing::{debug, info};

use crate::agent::{Connector, SnmpAgent};
use crate::oid;
use crate::table::{is_absent_text, SnmpTable};
use crate::value::SnmpValue;

/// sysName.0, used to test a credential
pub const LOGIN_OID: &str = "1.3.6.1.2.1.1.5.0";

/// Rows requested per GETBULK
pub const BULK_MAX_REPETITIONS: u8 = 25;

/// An SNMP conversation with one device and its working credential
pub struct SnmpSession {
    ip: Ipv4Addr,
    credential: Credential,
    agent: Box<dyn SnmpAgent>,
}

impl fmt::Debug for SnmpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnmpSession")
            .field("ip", &self.ip)
            .field("credential", &self.credential.label())
            .finish()
    }
}

impl SnmpSession {
    /// Try `credentials` in order until one answers.
    ///
    /// Returns [`Error::Unreachable`] once the list is exhausted.
    pub async fn open(
        connector: &dyn Connector,
        ip: Ipv4Addr,
        credentials: &[Credential],
    ) -> Result<Self> {
        for credential in credentials {
            let agent = match connector.connect(ip, credential).await {
                Ok(agent) => agent,
                Err(e) => {
                    debug!(ip = %ip, credential = %credential.label(), error = %e, "Connect failed");
                    continue;
                }
            };

            match agent.get(LOGIN_OID).await {
                Ok(_) => {
                    info!(ip = %ip, credential = %credential.label(), "SNMP credential accepted");
                    return Ok(Self {
                        ip,
                        credential: credential.clone(),
                        agent,
                    });
                }
                Err(e) => {
                    debug!(ip = %ip, credential = %credential.label(), error = %e, "Credential rejected");
                }
            }
        }

        Err(Error::Unreachable(ip.to_string()))
    }

    /// Wrap an already opened agent
    pub fn with_agent(ip: Ipv4Addr, credential: Credential, agent: Box<dyn SnmpAgent>) -> Self {
        Self {
            ip,
            credential,
            agent,
        }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Single GET; absent objects and transport errors are `None`.
    pub async fn get(&self, oid: &str) -> Option<SnmpValue> {
        match self.agent.get(oid).await {
            Ok(Some(value)) => {
                if let SnmpValue::Octets(_) = value {
                    if is_absent_text(&value.to_text()) {
                        return None;
                    }
                }
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                debug!(ip = %self.ip, oid = oid, error = %e, "GET failed");
                None
            }
        }
    }

    /// GET rendered as text; empty values are `None`.
    pub async fn get_text(&self, oid: &str) -> Option<String> {
        let text = self.get(oid).await?.to_text();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Walk the subtree under `prefix` with repeated GETBULK requests.
    ///
    /// The walk stops at the first row outside the subtree, at
    /// endOfMibView, on an empty response, or if the agent stops advancing.
    /// Any transport error discards the partial walk and returns `None`.
    pub async fn bulk(&self, prefix: &str) -> Option<SnmpTable> {
        let mut rows = Vec::new();
        let mut cursor = prefix.trim_start_matches('.').to_string();

        'walk: loop {
            let batch = match self.agent.get_bulk(&cursor, BULK_MAX_REPETITIONS).await {
                Ok(batch) => batch,
                Err(e) => {
                    debug!(ip = %self.ip, oid = prefix, error = %e, "Bulk walk failed");
                    return None;
                }
            };

            if batch.is_empty() {
                break;
            }

            for row in batch {
                if row.value.is_end_of_view() || !oid::starts_with(&row.oid, prefix) {
                    break 'walk;
                }
                if oid::compare(&row.oid, &cursor) != std::cmp::Ordering::Greater {
                    debug!(ip = %self.ip, oid = %row.oid, "Agent did not advance, ending walk");
                    break 'walk;
                }
                cursor = row.oid.trim_start_matches('.').to_string();
                rows.push(row);
            }
        }

        Some(SnmpTable::new(rows))
    }

    /// Session for the VLAN-indexed context of this device.
    ///
    /// SNMPv2c selects the VLAN with the `community@vlan` convention; SNMPv3
    /// credentials reuse the default context.
    pub async fn for_vlan(&self, connector: &dyn Connector, vlan: u16) -> Result<SnmpSession> {
        let credential = match &self.credential {
            Credential::V2c { community } => Credential::v2c(format!("{}@{}", community, vlan)),
            v3 => v3.clone(),
        };
        let agent = connector.connect(self.ip, &credential).await?;
        Ok(Self::with_agent(self.ip, credential, agent))
    }
}

#[cfg(test)]
mod tests;
