//! Discovery ACL
//!
//! Not a packet filter: an ordered policy list deciding which devices the
//! walker crawls. Each entry reads `<action> <type> <pattern>`:
//!
//! - action: `permit`, `deny`, `leaf`, `include` (lines starting with `;`
//!   are comments)
//! - type: `ip`, `host`, `platform`, `software`, `serial`
//! - pattern: a CIDR (or `any`) for `ip`, a regular expression (or `*`)
//!   for the other types
//!
//! The first matching entry wins; with no match the implicit action is
//! `deny`. Attributes that are not known yet (platform, software and serial
//! before a device has been queried) never match, so the same list can be
//! evaluated before and after the query.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use regex::Regex;

use crate::{Error, Result};

/// What the walker does with a candidate device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclAction {
    /// Query the device and expand its neighbors
    Permit,
    /// Skip the device entirely
    Deny,
    /// Query the device but do not expand its neighbors
    Leaf,
    /// Add the device as a stub without querying it
    Include,
}

impl AclAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclAction::Permit => "permit",
            AclAction::Deny => "deny",
            AclAction::Leaf => "leaf",
            AclAction::Include => "include",
        }
    }
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "permit" => Ok(AclAction::Permit),
            "deny" => Ok(AclAction::Deny),
            "leaf" => Ok(AclAction::Leaf),
            "include" => Ok(AclAction::Include),
            other => Err(Error::invalid_acl(other, "unknown action")),
        }
    }
}

/// String pattern used by the non-IP entry types
#[derive(Debug, Clone)]
pub enum Pattern {
    /// `*`: matches any known value
    Any,
    /// Regular expression, matched anywhere in the value
    Regex(Regex),
}

impl Pattern {
    fn parse(entry: &str, raw: &str) -> Result<Self> {
        if raw == "*" {
            return Ok(Pattern::Any);
        }
        Regex::new(raw)
            .map(Pattern::Regex)
            .map_err(|e| Error::invalid_acl(entry.to_string(), format!("bad pattern: {}", e)))
    }

    fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Pattern::Any, Some(_)) => true,
            (Pattern::Regex(re), Some(v)) => re.is_match(v),
        }
    }
}

/// IP pattern for `ip` entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpPattern {
    /// The `any` keyword
    Any,
    /// An IPv4 network; a bare address means a /32
    Net(Ipv4Net),
}

impl IpPattern {
    fn parse(entry: &str, raw: &str) -> Result<Self> {
        if raw == "any" {
            return Ok(IpPattern::Any);
        }
        if let Ok(net) = raw.parse::<Ipv4Net>() {
            return Ok(IpPattern::Net(net.trunc()));
        }
        raw.parse::<Ipv4Addr>()
            .map(|addr| IpPattern::Net(Ipv4Net::from(addr)))
            .map_err(|_| Error::invalid_acl(entry, "bad CIDR"))
    }

    fn matches(&self, ip: &str) -> bool {
        let Ok(addr) = ip.parse::<Ipv4Addr>() else {
            return false;
        };
        match self {
            IpPattern::Any => true,
            IpPattern::Net(net) => net.contains(&addr),
        }
    }
}

/// The attribute an entry tests
#[derive(Debug, Clone)]
pub enum AclRule {
    Ip(IpPattern),
    Host(Pattern),
    Platform(Pattern),
    Software(Pattern),
    Serial(Pattern),
}

/// One parsed ACL line
#[derive(Debug, Clone)]
pub struct AclEntry {
    pub action: AclAction,
    pub rule: AclRule,
    source: String,
}

impl AclEntry {
    /// The line this entry was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Does this entry match the candidate?
    pub fn matches(&self, subject: &AclSubject<'_>) -> bool {
        match &self.rule {
            AclRule::Ip(p) => p.matches(subject.ip),
            AclRule::Host(p) => p.matches(subject.host),
            AclRule::Platform(p) => p.matches(subject.platform),
            AclRule::Software(p) => p.matches(subject.software),
            AclRule::Serial(p) => p.matches(subject.serial),
        }
    }
}

impl FromStr for AclEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let mut parts = line.splitn(3, char::is_whitespace);

        let action = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::invalid_acl(line, "empty entry"))?;
        let action: AclAction = action
            .parse()
            .map_err(|_| Error::invalid_acl(line, "unknown action"))?;

        let kind = parts
            .next()
            .ok_or_else(|| Error::invalid_acl(line, "missing type"))?;
        let pattern = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::invalid_acl(line, "missing pattern"))?;

        let rule = match kind {
            "ip" => AclRule::Ip(IpPattern::parse(line, pattern)?),
            "host" => AclRule::Host(Pattern::parse(line, pattern)?),
            "platform" => AclRule::Platform(Pattern::parse(line, pattern)?),
            "software" => AclRule::Software(Pattern::parse(line, pattern)?),
            "serial" => AclRule::Serial(Pattern::parse(line, pattern)?),
            _ => return Err(Error::invalid_acl(line, "unknown type")),
        };

        Ok(AclEntry {
            action,
            rule,
            source: line.to_string(),
        })
    }
}

/// The facts known about a candidate at evaluation time
#[derive(Debug, Clone, Copy, Default)]
pub struct AclSubject<'a> {
    pub ip: &'a str,
    pub host: Option<&'a str>,
    pub platform: Option<&'a str>,
    pub software: Option<&'a str>,
    pub serial: Option<&'a str>,
}

impl<'a> AclSubject<'a> {
    /// Subject for the first evaluation, before the device is queried
    pub fn advertised(ip: &'a str, host: Option<&'a str>) -> Self {
        Self {
            ip,
            host,
            ..Default::default()
        }
    }
}

/// Ordered discovery policy
#[derive(Debug, Clone, Default)]
pub struct Acl {
    entries: Vec<AclEntry>,
}

impl Acl {
    /// Parse policy lines; blank lines and `;` comments are skipped.
    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<AclEntry> = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            entries.push(line.parse()?);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First matching entry wins; no match means `deny`.
    pub fn evaluate(&self, subject: &AclSubject<'_>) -> AclAction {
        self.entries
            .iter()
            .find(|entry| entry.matches(subject))
            .map(|entry| entry.action)
            .unwrap_or(AclAction::Deny)
    }
}

impl TryFrom<Vec<String>> for Acl {
    type Error = Error;

    fn try_from(lines: Vec<String>) -> Result<Self> {
        Acl::parse(lines)
    }
}
