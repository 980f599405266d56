//! Per-device cache of walked tables
//!
//! Several queries read the same tables (ifName, ipAddrTable, the entity
//! table), so each subtree is walked at most once per device and run. A
//! failed walk is cached as well and reads as an absent table.

use std::collections::HashMap;

use topowalk_snmp::{SnmpSession, SnmpTable};

#[derive(Debug, Default)]
pub struct QueryCache {
    tables: HashMap<&'static str, Option<SnmpTable>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk every prefix not walked yet
    pub async fn load(&mut self, session: &SnmpSession, prefixes: &[&'static str]) {
        for &prefix in prefixes {
            if !self.tables.contains_key(prefix) {
                let table = session.bulk(prefix).await;
                self.tables.insert(prefix, table);
            }
        }
    }

    /// A previously loaded table; `None` if it was never loaded or the walk failed
    pub fn table(&self, prefix: &str) -> Option<&SnmpTable> {
        self.tables.get(prefix).and_then(Option::as_ref)
    }

    /// Text at `oid` inside the table loaded for `prefix`
    pub fn text(&self, prefix: &str, oid: &str) -> Option<String> {
        self.table(prefix)?.lookup_text(oid)
    }
}
