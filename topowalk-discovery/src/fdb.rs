//! Bridge forwarding database
//!
//! Cisco switches keep one bridge MIB instance per VLAN, reachable through
//! a VLAN-indexed session. A MAC resolves to a bridge port, the bridge port
//! to an ifIndex and the ifIndex to a port name.

use topowalk_core::MacAddr;
use topowalk_snmp::{oid, Connector, SnmpSession, SnmpTable};
use tracing::debug;

use crate::names::shorten_port_name;
use crate::query::oids::IF_NAME;

const VTP_VLAN_STATE: &str = "1.3.6.1.4.1.9.9.46.1.3.1.1.2";
const FDB_ADDRESS: &str = "1.3.6.1.2.1.17.4.3.1.1";
const FDB_PORT: &str = "1.3.6.1.2.1.17.4.3.1.2";
const BASE_PORT_IF_INDEX: &str = "1.3.6.1.2.1.17.1.4.1.2";

/// First component of the MAC index in dot1dTpFdbTable rows
const FDB_MAC_POS: usize = 11;

/// VLANs 1002-1005 are the FDDI and Token Ring defaults
const FIRST_RESERVED_VLAN: u16 = 1002;

/// One learned MAC address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbEntry {
    pub vlan: u16,
    pub mac: MacAddr,
    /// Short port name, when the bridge port maps to a named interface
    pub port: Option<String>,
    pub if_index: Option<u32>,
}

/// VLANs with a bridge instance, in ascending order
pub async fn vlans(session: &SnmpSession) -> Vec<u16> {
    let Some(table) = session.bulk(VTP_VLAN_STATE).await else {
        debug!(ip = %session.ip(), "VTP VLAN table not available");
        return Vec::new();
    };

    let mut vlans: Vec<u16> = table
        .column(VTP_VLAN_STATE)
        .filter_map(|row| oid::last(&row.oid)?.parse().ok())
        .filter(|&vlan| vlan < FIRST_RESERVED_VLAN)
        .collect();
    vlans.sort_unstable();
    vlans.dedup();
    vlans
}

fn port_name(if_names: Option<&SnmpTable>, if_index: u32) -> Option<String> {
    if_names?
        .lookup_text(&oid::join(IF_NAME, &if_index.to_string()))
        .map(|name| shorten_port_name(&name))
}

fn if_index_of(bridge: &SnmpTable, bridge_port: &str) -> Option<u32> {
    bridge
        .lookup(&oid::join(BASE_PORT_IF_INDEX, bridge_port))?
        .as_i64()
        .and_then(|i| u32::try_from(i).ok())
}

/// Every MAC address learned in every VLAN
pub async fn collect(session: &SnmpSession, connector: &dyn Connector) -> Vec<FdbEntry> {
    let if_names = session.bulk(IF_NAME).await;
    let mut entries = Vec::new();

    for vlan in vlans(session).await {
        let vlan_session = match session.for_vlan(connector, vlan).await {
            Ok(s) => s,
            Err(e) => {
                debug!(ip = %session.ip(), vlan, error = %e, "No session for VLAN");
                continue;
            }
        };

        let Some(addresses) = vlan_session.bulk(FDB_ADDRESS).await else {
            continue;
        };
        let ports = vlan_session.bulk(FDB_PORT).await.unwrap_or_default();
        let bridge = vlan_session.bulk(BASE_PORT_IF_INDEX).await.unwrap_or_default();

        for row in addresses.column(FDB_ADDRESS) {
            let index = oid::tail_from(&row.oid, FDB_MAC_POS);
            let mac = row
                .value
                .as_bytes()
                .and_then(MacAddr::from_slice)
                .or_else(|| MacAddr::from_oid_components(&oid::components(&index)));
            let Some(mac) = mac else {
                debug!(oid = %row.oid, "Malformed FDB row");
                continue;
            };

            let if_index = ports
                .lookup_text(&oid::join(FDB_PORT, &index))
                .and_then(|port| if_index_of(&bridge, &port));
            entries.push(FdbEntry {
                vlan,
                mac,
                port: if_index.and_then(|i| port_name(if_names.as_ref(), i)),
                if_index,
            });
        }
    }

    debug!(ip = %session.ip(), entries = entries.len(), "Forwarding database collected");
    entries
}

/// Where `mac` was learned, checking each VLAN in turn
pub async fn find(session: &SnmpSession, connector: &dyn Connector, mac: MacAddr) -> Option<FdbEntry> {
    let index = mac.to_oid_index();

    for vlan in vlans(session).await {
        let Ok(vlan_session) = session.for_vlan(connector, vlan).await else {
            continue;
        };
        let Some(bridge_port) = vlan_session
            .get_text(&oid::join(FDB_PORT, &index))
            .await
            .filter(|port| port != "0")
        else {
            continue;
        };

        let if_index = vlan_session
            .get(&oid::join(BASE_PORT_IF_INDEX, &bridge_port))
            .await
            .and_then(|v| v.as_i64())
            .and_then(|i| u32::try_from(i).ok());
        let port = match if_index {
            Some(i) => session
                .get_text(&oid::join(IF_NAME, &i.to_string()))
                .await
                .map(|name| shorten_port_name(&name)),
            None => None,
        };

        debug!(ip = %session.ip(), mac = %mac, vlan, port = ?port, "MAC found");
        return Some(FdbEntry {
            vlan,
            mac,
            port,
            if_index,
        });
    }
    None
}
