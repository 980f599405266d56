//! Dotted OID helpers
//!
//! OIDs travel through topowalk as dotted strings. Tables are indexed by
//! OID components, so most parsers only need to split and compare them.

use std::cmp::Ordering;

/// Split a dotted OID into its components (a leading dot is ignored)
pub fn components(oid: &str) -> Vec<&str> {
    oid.trim_start_matches('.')
        .split('.')
        .filter(|c| !c.is_empty())
        .collect()
}

/// Component-wise prefix test: `1.3.6.1.2.1.1` is under `1.3.6.1.2`
/// but `1.3.6.10` is not under `1.3.6.1`.
pub fn starts_with(oid: &str, prefix: &str) -> bool {
    let oid = components(oid);
    let prefix = components(prefix);
    oid.len() >= prefix.len() && oid[..prefix.len()] == prefix[..]
}

/// The component at `index`, if present
pub fn component(oid: &str, index: usize) -> Option<&str> {
    components(oid).get(index).copied()
}

/// The last component
pub fn last(oid: &str) -> Option<&str> {
    components(oid).last().copied()
}

/// Components from `index` to the end, re-joined with dots
pub fn tail_from(oid: &str, index: usize) -> String {
    components(oid)
        .get(index..)
        .map(|rest| rest.join("."))
        .unwrap_or_default()
}

/// The part of `oid` after `prefix`, without the separating dot
pub fn suffix<'a>(oid: &'a str, prefix: &str) -> Option<&'a str> {
    if !starts_with(oid, prefix) {
        return None;
    }
    let rest = oid
        .trim_start_matches('.')
        .get(prefix.trim_start_matches('.').len()..)?;
    Some(rest.trim_start_matches('.'))
}

/// Join a base OID and an index
pub fn join(base: &str, index: &str) -> String {
    format!("{}.{}", base.trim_end_matches('.'), index.trim_start_matches('.'))
}

/// Lexicographic order on numeric components, the order agents walk in
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = components(a);
    let b = components(b);
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}
