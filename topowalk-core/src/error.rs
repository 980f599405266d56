//! Error types for topowalk

use thiserror::Error;

/// Result type alias for topowalk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for topowalk
#[derive(Error, Debug)]
pub enum Error {
    /// File or socket I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration is structurally valid JSON but semantically wrong
    #[error("Configuration error: {0}")]
    Config(String),

    /// A discovery ACL line could not be parsed
    #[error("Invalid ACL entry '{entry}': {reason}")]
    InvalidAcl { entry: String, reason: String },

    /// An SNMP credential block is incomplete or unsupported
    #[error("Invalid SNMP credential: {0}")]
    InvalidCredential(String),

    /// MAC address could not be parsed
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// SNMP transport or encoding failure
    #[error("SNMP error: {0}")]
    Snmp(String),

    /// No configured credential produced a response
    #[error("Device {0} is not reachable with any configured SNMP credential")]
    Unreachable(String),

    /// The seed device of a discovery run could not be queried
    #[error("Could not query root node {0}")]
    RootUnreachable(String),

    /// A MAC trace returned to a node it already visited
    #[error("Loop detected while tracing {mac}: {node} was already visited")]
    MacTraceLoop { mac: String, node: String },

    /// Writing a catalog or diagram failed
    #[error("Output error: {0}")]
    Output(String),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an SNMP error with a custom message
    pub fn snmp<S: Into<String>>(msg: S) -> Self {
        Error::Snmp(msg.into())
    }

    /// Create an invalid ACL error
    pub fn invalid_acl<S: Into<String>>(entry: S, reason: S) -> Self {
        Error::InvalidAcl {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error with a custom message
    pub fn output<S: Into<String>>(msg: S) -> Self {
        Error::Output(msg.into())
    }
}
