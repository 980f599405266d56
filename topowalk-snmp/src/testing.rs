//! In-memory SNMP agents
//!
//! Each simulated device is a sorted OID → value map served with GET and
//! GETBULK semantics, plus the credentials it accepts. A wrong community
//! behaves like a real agent: the connection opens, every request times out.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use topowalk_core::{Credential, Error, Result};

use crate::agent::{Connector, SnmpAgent};
use crate::oid;
use crate::value::{SnmpValue, VarBind};

type OidKey = Vec<u64>;

fn key(oid: &str) -> OidKey {
    oid::components(oid)
        .iter()
        .map(|c| c.parse().unwrap_or(0))
        .collect()
}

fn render(key: &OidKey) -> String {
    key.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

type ObjectMap = BTreeMap<OidKey, SnmpValue>;

/// A simulated device
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    objects: ObjectMap,
    vlan_objects: HashMap<u16, ObjectMap>,
    communities: Vec<String>,
    users: Vec<String>,
    failing: Vec<String>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept this v2c community
    pub fn community(mut self, community: &str) -> Self {
        self.communities.push(community.to_string());
        self
    }

    /// Accept this v3 user
    pub fn user(mut self, username: &str) -> Self {
        self.users.push(username.to_string());
        self
    }

    /// Store a value
    pub fn set<V: Into<SnmpValue>>(mut self, oid: &str, value: V) -> Self {
        self.objects.insert(key(oid), value.into());
        self
    }

    /// Store a raw octet string
    pub fn set_octets(self, oid: &str, bytes: &[u8]) -> Self {
        self.set(oid, SnmpValue::Octets(bytes.to_vec()))
    }

    /// Store a value visible only in the context of `vlan`
    pub fn set_vlan<V: Into<SnmpValue>>(mut self, vlan: u16, oid: &str, value: V) -> Self {
        self.vlan_objects
            .entry(vlan)
            .or_default()
            .insert(key(oid), value.into());
        self
    }

    /// Make every walk under `prefix` fail with a timeout
    pub fn fail_walks_under(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    fn view_for(&self, credential: &Credential) -> Option<ObjectMap> {
        match credential {
            Credential::V2c { community } => {
                if self.communities.iter().any(|c| c == community) {
                    return Some(self.objects.clone());
                }
                let (base, vlan) = community.rsplit_once('@')?;
                let vlan: u16 = vlan.parse().ok()?;
                if !self.communities.iter().any(|c| c == base) {
                    return None;
                }
                Some(self.vlan_objects.get(&vlan).cloned().unwrap_or_default())
            }
            Credential::V3(usm) => self
                .users
                .iter()
                .any(|u| *u == usm.username)
                .then(|| self.objects.clone()),
        }
    }
}

/// Connector over a set of simulated devices
#[derive(Debug, Default)]
pub struct MemoryConnector {
    devices: HashMap<Ipv4Addr, Arc<MemoryDevice>>,
    connects: HashMap<Ipv4Addr, AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `device` at `ip`
    pub fn add_device(&mut self, ip: Ipv4Addr, device: MemoryDevice) {
        self.devices.insert(ip, Arc::new(device));
        self.connects.insert(ip, AtomicUsize::new(0));
    }

    /// Builder form of [`MemoryConnector::add_device`]
    pub fn with_device(mut self, ip: Ipv4Addr, device: MemoryDevice) -> Self {
        self.add_device(ip, device);
        self
    }

    /// How many sessions were opened against `ip`
    pub fn connect_count(&self, ip: Ipv4Addr) -> usize {
        self.connects
            .get(&ip)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, ip: Ipv4Addr, credential: &Credential) -> Result<Box<dyn SnmpAgent>> {
        let device = self
            .devices
            .get(&ip)
            .ok_or_else(|| Error::snmp(format!("{}: no route to host", ip)))?;
        if let Some(counter) = self.connects.get(&ip) {
            counter.fetch_add(1, Ordering::SeqCst);
        }

        Ok(Box::new(MemoryAgent {
            objects: device.view_for(credential),
            failing: device.failing.clone(),
        }))
    }
}

struct MemoryAgent {
    /// `None` when the credential was rejected
    objects: Option<ObjectMap>,
    failing: Vec<String>,
}

impl MemoryAgent {
    fn objects(&self) -> Result<&ObjectMap> {
        self.objects
            .as_ref()
            .ok_or_else(|| Error::snmp("request timed out"))
    }
}

#[async_trait]
impl SnmpAgent for MemoryAgent {
    async fn get(&self, oid: &str) -> Result<Option<SnmpValue>> {
        Ok(self.objects()?.get(&key(oid)).cloned())
    }

    async fn get_bulk(&self, oid: &str, max_repetitions: u8) -> Result<Vec<VarBind>> {
        let objects = self.objects()?;
        if self.failing.iter().any(|p| oid::starts_with(oid, p)) {
            return Err(Error::snmp("request timed out"));
        }

        let start = key(oid);
        let mut rows: Vec<VarBind> = objects
            .range((Bound::Excluded(start), Bound::Unbounded))
            .take(usize::from(max_repetitions))
            .map(|(k, v)| VarBind::new(render(k), v.clone()))
            .collect();

        if rows.len() < usize::from(max_repetitions) {
            let last = rows
                .last()
                .map(|r| r.oid.clone())
                .unwrap_or_else(|| oid.to_string());
            rows.push(VarBind::new(last, SnmpValue::EndOfView));
        }
        Ok(rows)
    }
}
