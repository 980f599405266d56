//! Walked subtree with random access by OID

use std::collections::HashMap;

use crate::oid;
use crate::value::{SnmpValue, VarBind};

/// Text some agents return in place of a missing object
pub const NO_SUCH_OBJECT: &str = "No Such Object currently exists at this OID";
/// Text some agents return in place of a missing instance
pub const NO_SUCH_INSTANCE: &str = "No Such Instance currently exists at this OID";

/// Returns true for the textual "object absent" sentinels
pub fn is_absent_text(text: &str) -> bool {
    text == NO_SUCH_OBJECT || text == NO_SUCH_INSTANCE
}

/// Rows from a bulk walk, in walk order, indexed by OID
#[derive(Debug, Clone, Default)]
pub struct SnmpTable {
    rows: Vec<VarBind>,
    index: HashMap<String, usize>,
}

impl SnmpTable {
    pub fn new(rows: Vec<VarBind>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.oid.trim_start_matches('.').to_string(), i))
            .collect();
        Self { rows, index }
    }

    pub fn rows(&self) -> &[VarBind] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value stored at exactly `oid`
    pub fn lookup(&self, oid: &str) -> Option<&SnmpValue> {
        self.index
            .get(oid.trim_start_matches('.'))
            .map(|&i| &self.rows[i].value)
    }

    /// Text of the value at `oid`; absent sentinels and empty values are `None`.
    pub fn lookup_text(&self, oid: &str) -> Option<String> {
        let text = self.lookup(oid)?.to_text();
        if text.is_empty() || is_absent_text(&text) {
            None
        } else {
            Some(text)
        }
    }

    /// Rows under `prefix`, in walk order
    pub fn column<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a VarBind> + 'a {
        self.rows
            .iter()
            .filter(move |row| oid::starts_with(&row.oid, prefix))
    }
}

impl FromIterator<VarBind> for SnmpTable {
    fn from_iter<I: IntoIterator<Item = VarBind>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
