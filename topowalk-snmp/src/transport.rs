//! SNMP over UDP, backed by `async-snmp`

use std::net::Ipv4Addr;
use std::time::Duration;

use async_snmp::{Auth, Client, Oid, Retry, UdpClient, Value};
use async_trait::async_trait;
use topowalk_core::{AuthProtocol, Credential, Error, PrivProtocol, Result, UsmCredential};
use tracing::{debug, warn};

use crate::agent::{Connector, SnmpAgent};
use crate::value::{SnmpValue, VarBind};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Default retry budget per request
pub const DEFAULT_RETRIES: u8 = 2;

const SNMP_PORT: u16 = 161;

/// Connector for real devices
#[derive(Debug, Clone)]
pub struct UdpConnector {
    timeout: Duration,
    retries: u8,
}

impl Default for UdpConnector {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl UdpConnector {
    pub fn new(timeout: Duration, retries: u8) -> Self {
        Self { timeout, retries }
    }

    /// Retries are sent back to back; the timeout already paces them.
    fn retry_policy(&self) -> Retry {
        match self.retries {
            0 => Retry::none(),
            n => Retry::fixed(u32::from(n), Duration::ZERO),
        }
    }

    fn auth(credential: &Credential) -> Result<Auth> {
        match credential {
            Credential::V2c { community } => Ok(Auth::v2c(community.as_str())),
            Credential::V3(usm) => Self::usm_auth(usm),
        }
    }

    fn usm_auth(usm: &UsmCredential) -> Result<Auth> {
        let builder = Auth::usm(usm.username.as_str());

        let builder = match usm.auth_protocol {
            AuthProtocol::None => return Ok(builder.into()),
            AuthProtocol::Md5 => builder.auth(async_snmp::AuthProtocol::Md5, usm.auth_key.as_str()),
            AuthProtocol::Sha => builder.auth(async_snmp::AuthProtocol::Sha1, usm.auth_key.as_str()),
        };

        let privacy = match usm.priv_protocol {
            PrivProtocol::None => return Ok(builder.into()),
            PrivProtocol::Des => async_snmp::PrivProtocol::Des,
            PrivProtocol::Aes128 => async_snmp::PrivProtocol::Aes128,
            PrivProtocol::Aes192 => async_snmp::PrivProtocol::Aes192,
            PrivProtocol::Aes256 => async_snmp::PrivProtocol::Aes256,
            PrivProtocol::TripleDes => {
                return Err(Error::InvalidCredential(format!(
                    "3DES privacy is not supported (v3 user {})",
                    usm.username
                )))
            }
        };

        Ok(builder.privacy(privacy, usm.priv_key.as_str()).into())
    }
}

#[async_trait]
impl Connector for UdpConnector {
    async fn connect(&self, ip: Ipv4Addr, credential: &Credential) -> Result<Box<dyn SnmpAgent>> {
        let auth = match Self::auth(credential) {
            Ok(auth) => auth,
            Err(e) => {
                warn!(ip = %ip, credential = %credential.label(), error = %e, "Skipping credential");
                return Err(e);
            }
        };

        let target = format!("{}:{}", ip, SNMP_PORT);
        let client = Client::builder(target, auth)
            .timeout(self.timeout)
            .retry(self.retry_policy())
            .connect()
            .await
            .map_err(|e| Error::snmp(format!("{}: {}", ip, e)))?;

        debug!(ip = %ip, credential = %credential.label(), "Opened SNMP client");
        Ok(Box::new(UdpAgent { client }))
    }
}

struct UdpAgent {
    client: UdpClient,
}

fn parse_oid(oid: &str) -> Result<Oid> {
    Oid::parse(oid.trim_start_matches('.')).map_err(|e| Error::snmp(format!("bad OID {}: {}", oid, e)))
}

fn convert(value: &Value) -> SnmpValue {
    match value {
        Value::Integer(i) => SnmpValue::Integer(i64::from(*i)),
        Value::OctetString(bytes) | Value::Opaque(bytes) => SnmpValue::Octets(bytes.to_vec()),
        Value::IpAddress(addr) => SnmpValue::IpAddress(Ipv4Addr::from(*addr)),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
            SnmpValue::Unsigned(u64::from(*v))
        }
        Value::Counter64(v) => SnmpValue::Unsigned(*v),
        Value::ObjectIdentifier(oid) => SnmpValue::ObjectId(oid.to_string()),
        Value::EndOfMibView => SnmpValue::EndOfView,
        Value::Null | Value::NoSuchObject | Value::NoSuchInstance => SnmpValue::Null,
        other => SnmpValue::text(other.to_string()),
    }
}

#[async_trait]
impl SnmpAgent for UdpAgent {
    async fn get(&self, oid: &str) -> Result<Option<SnmpValue>> {
        let request = parse_oid(oid)?;
        let varbind = self
            .client
            .get(&request)
            .await
            .map_err(|e| Error::snmp(e.to_string()))?;

        Ok(match convert(&varbind.value) {
            SnmpValue::Null | SnmpValue::EndOfView => None,
            value => Some(value),
        })
    }

    async fn get_bulk(&self, oid: &str, max_repetitions: u8) -> Result<Vec<VarBind>> {
        let request = parse_oid(oid)?;
        let varbinds = self
            .client
            .get_bulk(&[request], 0, max_repetitions.into())
            .await
            .map_err(|e| Error::snmp(e.to_string()))?;

        Ok(varbinds
            .iter()
            .map(|vb| VarBind::new(vb.oid.to_string(), convert(&vb.value)))
            .collect())
    }
}
