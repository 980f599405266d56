//! Topowalk SNMP Library
//!
//! Credential probing, GET and GETBULK walks against a single device, with
//! the transport kept behind the [`Connector`] and [`SnmpAgent`] traits.

pub mod agent;
pub mod oid;
pub mod session;
pub mod table;
pub mod transport;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::{Connector, SnmpAgent};
pub use session::SnmpSession;
pub use table::SnmpTable;
pub use transport::UdpConnector;
pub use value::{SnmpValue, VarBind};
