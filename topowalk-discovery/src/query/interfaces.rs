//! Interface facts: names, addresses, SVIs, loopbacks and the VPC peer-link

use std::net::Ipv4Addr;

use topowalk_snmp::oid;
use tracing::debug;

use super::{oids, NodeQuery};
use crate::names::shorten_port_name;
use crate::node::{Loopback, Node, Svi};

/// Prefix length of a dotted netmask
fn mask_len(mask: &str) -> Option<u32> {
    let mask: Ipv4Addr = mask.parse().ok()?;
    Some(u32::from(mask).count_ones())
}

impl NodeQuery<'_> {
    pub(super) async fn load_addresses(&mut self) {
        self.cache
            .load(
                self.session,
                &[oids::IF_NAME, oids::IP_ADDR_IF_INDEX, oids::IP_ADDR_NETMASK],
            )
            .await;
    }

    /// ifName of `if_index`, as reported
    pub(super) fn if_name(&self, if_index: &str) -> Option<String> {
        self.cache
            .text(oids::IF_NAME, &oid::join(oids::IF_NAME, if_index))
    }

    /// Every address configured on `if_index` as `a.b.c.d/len`.
    /// Needs [`load_addresses`](Self::load_addresses) first.
    pub(super) fn cidrs(&self, if_index: &str) -> Vec<String> {
        let Some(table) = self.cache.table(oids::IP_ADDR_IF_INDEX) else {
            return Vec::new();
        };

        table
            .column(oids::IP_ADDR_IF_INDEX)
            .filter(|row| row.value.to_text() == if_index)
            .filter_map(|row| {
                let ip = oid::tail_from(&row.oid, oids::IP_ADDR_INDEX_POS);
                if ip.is_empty() {
                    return None;
                }
                let mask = self
                    .cache
                    .text(oids::IP_ADDR_NETMASK, &oid::join(oids::IP_ADDR_NETMASK, &ip));
                Some(match mask.as_deref().and_then(mask_len) {
                    Some(len) => format!("{}/{}", ip, len),
                    None => ip,
                })
            })
            .collect()
    }

    pub(super) async fn query_svis(&mut self, node: &mut Node) {
        self.load_addresses().await;
        self.cache.load(self.session, &[oids::SVI_VLAN_IF]).await;
        let Some(table) = self.cache.table(oids::SVI_VLAN_IF) else {
            return;
        };

        let mut svis = Vec::new();
        for row in table.column(oids::SVI_VLAN_IF) {
            let Some(vlan) = oid::component(&row.oid, oids::SVI_VLAN_POS).and_then(|v| v.parse::<u16>().ok()) else {
                debug!(oid = %row.oid, "Malformed SVI row");
                continue;
            };
            let ips = self.cidrs(&row.value.to_text());
            svis.push(Svi { vlan, ips });
        }
        node.svis = svis;
    }

    pub(super) async fn query_loopbacks(&mut self, node: &mut Node) {
        self.load_addresses().await;
        self.cache
            .load(self.session, &[oids::IF_TYPE, oids::IF_DESCR])
            .await;
        let Some(types) = self.cache.table(oids::IF_TYPE) else {
            return;
        };

        let mut loopbacks = Vec::new();
        for row in types.column(oids::IF_TYPE) {
            if row.value.as_i64() != Some(oids::IF_TYPE_SOFTWARE_LOOPBACK) {
                continue;
            }
            let Some(if_index) = oid::last(&row.oid) else {
                continue;
            };
            let name = self
                .cache
                .text(oids::IF_DESCR, &oid::join(oids::IF_DESCR, if_index))
                .or_else(|| self.if_name(if_index))
                .unwrap_or_else(|| format!("ifIndex {}", if_index));
            loopbacks.push(Loopback {
                name,
                ips: self.cidrs(if_index),
            });
        }
        node.loopbacks = loopbacks;
    }

    pub(super) async fn query_vpc(&mut self, node: &mut Node) {
        self.load_addresses().await;
        self.cache.load(self.session, &[oids::VPC_PEERLINK_IF]).await;
        let Some(table) = self.cache.table(oids::VPC_PEERLINK_IF) else {
            return;
        };
        let Some(row) = table.column(oids::VPC_PEERLINK_IF).next() else {
            return;
        };

        node.vpc_domain = oid::last(&row.oid).map(str::to_string);
        let if_index = row.value.to_text();
        node.vpc_peerlink_if = self.if_name(&if_index).map(|name| shorten_port_name(&name));
    }
}
