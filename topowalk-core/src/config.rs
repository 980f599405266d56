//! Run configuration
//!
//! A topowalk configuration is a JSON document with four sections:
//!
//! ```json
//! {
//!   "snmp":     [ { "ver": 2, "community": "private" } ],
//!   "domains":  [ ".example.net" ],
//!   "discover": [ "permit ip 10.0.0.0/8" ],
//!   "diagram":  { "node_text_size": 8 }
//! }
//! ```
//!
//! Every problem (bad JSON, unknown SNMP version or protocol, unparsable ACL
//! entry) is reported at load time so a run never starts half configured.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::acl::Acl;
use crate::{Error, Result};

/// USM authentication protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    None,
    Md5,
    Sha,
}

impl AuthProtocol {
    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(AuthProtocol::None),
            "MD5" => Ok(AuthProtocol::Md5),
            "SHA" | "SHA1" => Ok(AuthProtocol::Sha),
            other => Err(Error::InvalidCredential(format!(
                "unknown v3AuthProtocol '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthProtocol::None => "none",
            AuthProtocol::Md5 => "MD5",
            AuthProtocol::Sha => "SHA",
        })
    }
}

/// USM privacy protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    None,
    Des,
    TripleDes,
    Aes128,
    Aes192,
    Aes256,
}

impl PrivProtocol {
    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(PrivProtocol::None),
            "DES" => Ok(PrivProtocol::Des),
            "3DES" => Ok(PrivProtocol::TripleDes),
            "AES128" | "AES" => Ok(PrivProtocol::Aes128),
            "AES192" => Ok(PrivProtocol::Aes192),
            "AES256" => Ok(PrivProtocol::Aes256),
            other => Err(Error::InvalidCredential(format!(
                "unknown v3PrivProtocol '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrivProtocol::None => "none",
            PrivProtocol::Des => "DES",
            PrivProtocol::TripleDes => "3DES",
            PrivProtocol::Aes128 => "AES128",
            PrivProtocol::Aes192 => "AES192",
            PrivProtocol::Aes256 => "AES256",
        })
    }
}

/// SNMPv3 user-based security parameters
#[derive(Clone, PartialEq, Eq)]
pub struct UsmCredential {
    pub username: String,
    pub auth_protocol: AuthProtocol,
    pub auth_key: String,
    pub priv_protocol: PrivProtocol,
    pub priv_key: String,
}

// Keys stay out of logs.
impl fmt::Debug for UsmCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsmCredential")
            .field("username", &self.username)
            .field("auth_protocol", &self.auth_protocol)
            .field("priv_protocol", &self.priv_protocol)
            .finish_non_exhaustive()
    }
}

/// One candidate SNMP credential, tried in configuration order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCredential")]
pub enum Credential {
    V2c { community: String },
    V3(UsmCredential),
}

impl Credential {
    pub fn v2c<S: Into<String>>(community: S) -> Self {
        Credential::V2c {
            community: community.into(),
        }
    }

    /// Short label for log lines; never includes secrets.
    pub fn label(&self) -> String {
        match self {
            Credential::V2c { .. } => "v2c".to_string(),
            Credential::V3(usm) => format!("v3 user {}", usm.username),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCredential {
    ver: u8,
    #[serde(default)]
    community: Option<String>,
    #[serde(default, rename = "v3Username")]
    username: Option<String>,
    #[serde(default, rename = "v3AuthProtocol")]
    auth_protocol: Option<String>,
    #[serde(default, rename = "v3AuthKey")]
    auth_key: Option<String>,
    #[serde(default, rename = "v3PrivProtocol")]
    priv_protocol: Option<String>,
    #[serde(default, rename = "v3PrivKey")]
    priv_key: Option<String>,
}

impl TryFrom<RawCredential> for Credential {
    type Error = Error;

    fn try_from(raw: RawCredential) -> Result<Self> {
        match raw.ver {
            2 => {
                let community = raw
                    .community
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| Error::InvalidCredential("v2 entry without community".into()))?;
                Ok(Credential::V2c { community })
            }
            3 => {
                let username = raw
                    .username
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| Error::InvalidCredential("v3 entry without v3Username".into()))?;
                let auth_protocol = AuthProtocol::parse(raw.auth_protocol.as_deref().unwrap_or(""))?;
                let priv_protocol = PrivProtocol::parse(raw.priv_protocol.as_deref().unwrap_or(""))?;
                if auth_protocol == AuthProtocol::None && priv_protocol != PrivProtocol::None {
                    return Err(Error::InvalidCredential(format!(
                        "v3 user {} has privacy without authentication",
                        username
                    )));
                }
                Ok(Credential::V3(UsmCredential {
                    username,
                    auth_protocol,
                    auth_key: raw.auth_key.unwrap_or_default(),
                    priv_protocol,
                    priv_key: raw.priv_key.unwrap_or_default(),
                }))
            }
            other => Err(Error::InvalidCredential(format!(
                "unsupported SNMP version {}",
                other
            ))),
        }
    }
}

/// Default node label: name, address and whatever chassis facts are known.
pub const DEFAULT_NODE_TEXT: &str = "<font point-size=\"10\"><b>{name}</b></font><br />\
{ip}<br />\
<%if {ios}: {ios}<br />%>\
<%if {plat}: {plat}<br />%>\
<%if {serial}: {serial}<br />%>\
<%if {router}: <br />%>\
<%if {ospf_id}: OSPF {ospf_id}<br />%>\
<%if {bgp_las}: BGP {bgp_las}<br />%>\
<%if {hsrp_pri}: HSRP VIP {hsrp_vip}<br />HSRP Pri {hsrp_pri}<br />%>\
<%if {stack_count}: Stackwise {stack_count}<br />%>\
<%if {vss_domain}: VSS {vss_domain}<br />%>\
<%if {vpc_domain}: VPC {vpc_domain}<br />%>";

/// Settings for the diagram renderer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub node_text_size: u32,
    pub link_text_size: u32,
    pub title_text_size: u32,
    #[serde(deserialize_with = "bool_or_int")]
    pub get_stack_members: bool,
    #[serde(deserialize_with = "bool_or_int")]
    pub get_vss_members: bool,
    #[serde(deserialize_with = "bool_or_int")]
    pub expand_stackwise: bool,
    #[serde(deserialize_with = "bool_or_int")]
    pub expand_vss: bool,
    #[serde(deserialize_with = "bool_or_int")]
    pub expand_lag: bool,
    #[serde(deserialize_with = "bool_or_int")]
    pub group_vpc: bool,
    pub node_text: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            node_text_size: 8,
            link_text_size: 7,
            title_text_size: 15,
            get_stack_members: false,
            get_vss_members: false,
            expand_stackwise: false,
            expand_vss: false,
            expand_lag: true,
            group_vpc: false,
            node_text: DEFAULT_NODE_TEXT.to_string(),
        }
    }
}

fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// Complete run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub snmp: Vec<Credential>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub discover: Acl,
    #[serde(default)]
    pub diagram: DiagramConfig,
}

impl<'de> Deserialize<'de> for Acl {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let lines = Vec::<String>::deserialize(deserializer)?;
        Acl::try_from(lines).map_err(serde::de::Error::custom)
    }
}

/// Starter file written by `new-config`
#[derive(Serialize)]
struct TemplateFile {
    snmp: Vec<serde_json::Value>,
    domains: Vec<String>,
    discover: Vec<String>,
    diagram: serde_json::Value,
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            credentials = config.snmp.len(),
            domains = config.domains.len(),
            acl_entries = config.discover.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse a configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        if config.snmp.is_empty() {
            return Err(Error::config("no SNMP credentials configured"));
        }
        Ok(config)
    }

    /// A commented-by-example configuration to start from.
    pub fn template() -> String {
        let file = TemplateFile {
            snmp: vec![
                serde_json::json!({ "community": "private", "ver": 2 }),
                serde_json::json!({ "community": "public", "ver": 2 }),
                serde_json::json!({
                    "ver": 3,
                    "v3Username": "netops",
                    "v3AuthProtocol": "SHA",
                    "v3AuthKey": "authkey",
                    "v3PrivProtocol": "AES128",
                    "v3PrivKey": "privkey"
                }),
            ],
            domains: vec![".company.net".into(), ".company.com".into()],
            discover: vec![
                "; include ip 0.0.0.0/32".into(),
                "permit ip 10.0.0.0/8".into(),
                "permit ip 192.168.1.0/24".into(),
                "leaf platform ^AIR-CAP".into(),
                "permit ip 0.0.0.0/32".into(),
            ],
            diagram: serde_json::json!({
                "node_text_size": 8,
                "link_text_size": 7,
                "title_text_size": 15,
                "get_stack_members": 0,
                "get_vss_members": 0,
                "expand_stackwise": 0,
                "expand_vss": 0,
                "expand_lag": 1,
                "group_vpc": 0
            }),
        };
        // Serializing plain JSON values cannot fail.
        serde_json::to_string_pretty(&file).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{AclAction, AclSubject};
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "snmp": [
            { "community": "private", "ver": 2 },
            { "ver": 3, "v3Username": "ops", "v3AuthProtocol": "SHA", "v3AuthKey": "a",
              "v3PrivProtocol": "AES128", "v3PrivKey": "p" }
        ],
        "domains": [".example.net", ".example.com"],
        "discover": ["permit ip 10.0.0.0/8", "deny host ^test-", "leaf platform WS-C2960.*"],
        "diagram": { "node_text_size": 10, "expand_lag": 0, "group_vpc": true }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_json(SAMPLE).unwrap();

        assert_eq!(config.snmp.len(), 2);
        assert_eq!(config.snmp[0], Credential::v2c("private"));
        match &config.snmp[1] {
            Credential::V3(usm) => {
                assert_eq!(usm.username, "ops");
                assert_eq!(usm.auth_protocol, AuthProtocol::Sha);
                assert_eq!(usm.priv_protocol, PrivProtocol::Aes128);
            }
            other => panic!("expected v3 credential, got {:?}", other),
        }

        assert_eq!(config.domains, vec![".example.net", ".example.com"]);
        assert_eq!(config.discover.len(), 3);
        assert_eq!(
            config
                .discover
                .evaluate(&AclSubject::advertised("10.9.9.9", Some("core"))),
            AclAction::Permit
        );

        assert_eq!(config.diagram.node_text_size, 10);
        assert_eq!(config.diagram.link_text_size, 7);
        assert!(!config.diagram.expand_lag);
        assert!(config.diagram.group_vpc);
    }

    #[test]
    fn test_diagram_defaults() {
        let config = Config::from_json(r#"{ "snmp": [ { "community": "c", "ver": 2 } ] }"#).unwrap();
        assert_eq!(config.diagram, DiagramConfig::default());
        assert!(config.diagram.expand_lag);
        assert!(config.discover.is_empty());
    }

    #[test]
    fn test_rejects_bad_credentials() {
        let cases = [
            r#"{ "snmp": [ { "community": "c", "ver": 1 } ] }"#,
            r#"{ "snmp": [ { "ver": 2 } ] }"#,
            r#"{ "snmp": [ { "ver": 3 } ] }"#,
            r#"{ "snmp": [ { "ver": 3, "v3Username": "u", "v3AuthProtocol": "SHA512" } ] }"#,
            r#"{ "snmp": [ { "ver": 3, "v3Username": "u", "v3PrivProtocol": "AES128" } ] }"#,
            r#"{ "snmp": [] }"#,
        ];
        for case in cases {
            assert!(Config::from_json(case).is_err(), "{}", case);
        }
    }

    #[test]
    fn test_rejects_bad_acl() {
        let text = r#"{ "snmp": [ { "community": "c", "ver": 2 } ], "discover": ["allow ip any"] }"#;
        let err = Config::from_json(text).unwrap_err();
        assert!(err.to_string().contains("allow ip any"));
    }

    #[test]
    fn test_v3_never_carries_community() {
        let text = r#"{ "snmp": [ { "ver": 3, "community": "ignored", "v3Username": "u",
            "v3AuthProtocol": "MD5", "v3AuthKey": "k", "v3PrivProtocol": "3DES", "v3PrivKey": "p" } ] }"#;
        let config = Config::from_json(text).unwrap();
        assert!(matches!(
            &config.snmp[0],
            Credential::V3(UsmCredential { priv_protocol: PrivProtocol::TripleDes, .. })
        ));
    }

    #[test]
    fn test_debug_hides_keys() {
        let cred = Credential::V3(UsmCredential {
            username: "u".into(),
            auth_protocol: AuthProtocol::Md5,
            auth_key: "secret-auth".into(),
            priv_protocol: PrivProtocol::Des,
            priv_key: "secret-priv".into(),
        });
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("secret"));
        assert_eq!(cred.label(), "v3 user u");
    }

    #[test]
    fn test_template_loads() {
        let config = Config::from_json(&Config::template()).unwrap();
        assert_eq!(config.snmp.len(), 3);
        assert_eq!(
            config
                .discover
                .evaluate(&AclSubject::advertised("0.0.0.0", Some("esx"))),
            AclAction::Permit
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.snmp.len(), 2);

        assert!(matches!(
            Config::load("/nonexistent/topowalk.json"),
            Err(Error::Io(_))
        ));
    }
}
