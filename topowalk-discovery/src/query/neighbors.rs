//! CDP and LLDP neighbor tables

use std::net::Ipv4Addr;

use topowalk_snmp::{oid, SnmpTable, SnmpValue};
use tracing::debug;

use super::{oids, NodeQuery};
use crate::link::{DiscoveryProtocol, LinkType, Neighbor, RemoteDevice};
use crate::names::{format_chassis_id, format_software_version, shorten_port_name};
use crate::vlan::decode_allowed_vlans;

/// cdpCacheAddress is four raw octets; some agents hand it back as hex.
fn cdp_address(value: &SnmpValue) -> Option<String> {
    match value {
        SnmpValue::IpAddress(ip) => Some(ip.to_string()),
        SnmpValue::Octets(bytes) if bytes.len() == 4 => {
            Some(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]).to_string())
        }
        other => {
            let text = other.to_text();
            let bytes = hex::decode(text.strip_prefix("0x")?).ok()?;
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
    }
}

fn chassis_id(value: &SnmpValue) -> String {
    match value.as_bytes() {
        Some(bytes) if bytes.len() == 6 => format_chassis_id(&value.hex_string()),
        _ => value.to_text(),
    }
}

/// IPv4 management address of one LLDP neighbor, taken from the
/// lldpRemManAddrTable index
fn lldp_management_address(table: &SnmpTable, local_port: &str, rem_index: &str) -> Option<String> {
    table.column(oids::LLDP_REM_MAN_ADDR).find_map(|row| {
        let parts = oid::components(&row.oid);
        if parts.get(oids::LLDP_LOCAL_PORT_POS) != Some(&local_port)
            || parts.get(oids::LLDP_REM_INDEX_POS) != Some(&rem_index)
            || parts.get(oids::LLDP_MAN_ADDR_SUBTYPE_POS) != Some(&"1")
        {
            return None;
        }
        let ip = oid::tail_from(&row.oid, oids::LLDP_MAN_ADDR_POS);
        ip.parse::<Ipv4Addr>().ok().map(|ip| ip.to_string())
    })
}

impl NodeQuery<'_> {
    async fn load_port_tables(&mut self) {
        self.load_addresses().await;
        self.cache
            .load(
                self.session,
                &[
                    oids::TRUNK_STATUS,
                    oids::TRUNK_NATIVE,
                    oids::TRUNK_ALLOWED,
                    oids::ACCESS_VLAN,
                    oids::LAG_AGGREGATOR,
                ],
            )
            .await;
    }

    pub(super) async fn cdp_neighbors(&mut self) -> Vec<Neighbor> {
        let Some(table) = self.session.bulk(oids::CDP_CACHE).await else {
            debug!(ip = %self.session.ip(), "CDP walk failed");
            return Vec::new();
        };
        if table.is_empty() {
            return Vec::new();
        }
        self.load_port_tables().await;

        let mut neighbors = Vec::new();
        for row in table.column(oids::CDP_DEVICE_ID) {
            let parts = oid::components(&row.oid);
            let (Some(if_index), Some(instance)) = (
                parts.get(oids::CDP_IF_INDEX_POS),
                parts.get(oids::CDP_INSTANCE_POS),
            ) else {
                debug!(oid = %row.oid, "Malformed CDP row");
                continue;
            };
            let index = format!("{}.{}", if_index, instance);

            let remote = RemoteDevice {
                name: Some(row.value.to_text()).filter(|n| !n.is_empty()),
                ip: table
                    .lookup(&oid::join(oids::CDP_ADDRESS, &index))
                    .and_then(cdp_address),
                platform: table.lookup_text(&oid::join(oids::CDP_PLATFORM, &index)),
                software: table
                    .lookup_text(&oid::join(oids::CDP_VERSION, &index))
                    .map(|raw| format_software_version(&raw)),
                chassis_id: None,
            };

            let mut neighbor = Neighbor::new(remote, DiscoveryProtocol::Cdp);
            neighbor.remote_port = table
                .lookup_text(&oid::join(oids::CDP_DEVICE_PORT, &index))
                .map(|port| shorten_port_name(&port));
            self.fill_local_side(&mut neighbor, if_index);
            neighbors.push(neighbor);
        }
        neighbors
    }

    pub(super) async fn lldp_neighbors(&mut self) -> Vec<Neighbor> {
        let Some(table) = self.session.bulk(oids::LLDP_REMOTE).await else {
            debug!(ip = %self.session.ip(), "LLDP walk failed");
            return Vec::new();
        };
        if table.is_empty() {
            return Vec::new();
        }
        self.load_port_tables().await;

        let mut neighbors = Vec::new();
        for row in table.column(oids::LLDP_REM_CHASSIS_SUBTYPE) {
            let parts = oid::components(&row.oid);
            let (Some(time_mark), Some(local_port), Some(rem_index)) = (
                parts.get(oids::LLDP_TIME_MARK_POS),
                parts.get(oids::LLDP_LOCAL_PORT_POS),
                parts.get(oids::LLDP_REM_INDEX_POS),
            ) else {
                debug!(oid = %row.oid, "Malformed LLDP row");
                continue;
            };
            let index = format!("{}.{}.{}", time_mark, local_port, rem_index);

            let remote = RemoteDevice {
                name: table.lookup_text(&oid::join(oids::LLDP_REM_SYS_NAME, &index)),
                ip: lldp_management_address(&table, local_port, rem_index),
                platform: None,
                software: table
                    .lookup_text(&oid::join(oids::LLDP_REM_SYS_DESC, &index))
                    .map(|raw| format_software_version(&raw)),
                chassis_id: table
                    .lookup(&oid::join(oids::LLDP_REM_CHASSIS_ID, &index))
                    .map(chassis_id),
            };

            let mut neighbor = Neighbor::new(remote, DiscoveryProtocol::Lldp);
            neighbor.remote_port = table
                .lookup_text(&oid::join(oids::LLDP_REM_PORT_ID, &index))
                .map(|port| shorten_port_name(&port));
            self.fill_local_side(&mut neighbor, local_port);
            neighbors.push(neighbor);
        }
        neighbors
    }

    /// Port name, VLAN role, LAG and address of the local end of a link
    fn fill_local_side(&self, link: &mut Neighbor, if_index: &str) {
        let at = |base: &'static str| oid::join(base, if_index);

        link.local_port = self.if_name(if_index).map(|name| shorten_port_name(&name));

        let trunk_status = self.cache.text(oids::TRUNK_STATUS, &at(oids::TRUNK_STATUS));
        let access_vlan = self.cache.text(oids::ACCESS_VLAN, &at(oids::ACCESS_VLAN));
        match trunk_status.as_deref() {
            Some(oids::TRUNK_STATUS_TRUNKING) => {
                link.link_type = LinkType::Trunk;
                link.local_native_vlan = self.cache.text(oids::TRUNK_NATIVE, &at(oids::TRUNK_NATIVE));
                link.local_allowed_vlans = self
                    .cache
                    .table(oids::TRUNK_ALLOWED)
                    .and_then(|t| t.lookup(&at(oids::TRUNK_ALLOWED)))
                    .map(|bitmap| decode_allowed_vlans(&bitmap.hex_string()));
            }
            Some(_) => {
                link.link_type = LinkType::Access;
                link.vlan = access_vlan;
            }
            None if access_vlan.is_some() => {
                link.link_type = LinkType::Access;
                link.vlan = access_vlan;
            }
            None => link.link_type = LinkType::Routed,
        }

        if let Some(aggregator) = self.cache.text(oids::LAG_AGGREGATOR, &at(oids::LAG_AGGREGATOR)) {
            if aggregator != "0" && aggregator != if_index {
                link.local_lag = self.if_name(&aggregator).map(|name| shorten_port_name(&name));
                link.local_lag_ips = self.cidrs(&aggregator);
            }
        }

        link.local_if_ip = self.cidrs(if_index).into_iter().next();
    }
}
