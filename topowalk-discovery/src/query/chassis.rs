//! Chassis facts from the entity MIB, Stackwise members and VSS chassis

use topowalk_core::MacAddr;
use topowalk_snmp::oid;
use tracing::debug;

use super::{oids, NodeQuery, QueryFlags};
use crate::names::format_software_version;
use crate::node::{Node, StackInfo, StackMember, StackRole, VssInfo, VssMember};

const ENTITY_COLUMNS: [&str; 4] = [
    oids::ENT_CLASS,
    oids::ENT_SOFTWARE,
    oids::ENT_SERIAL,
    oids::ENT_PLATFORM,
];

impl NodeQuery<'_> {
    fn entity_text(&self, column: &'static str, index: &str) -> Option<String> {
        self.cache.text(column, &oid::join(column, index))
    }

    fn entity_software(&self, index: &str) -> Option<String> {
        self.entity_text(oids::ENT_SOFTWARE, index)
            .map(|raw| format_software_version(&raw))
    }

    /// Index of the first entity row of `class`
    fn first_entity_of_class(&self, class: i64) -> Option<String> {
        self.cache
            .table(oids::ENT_CLASS)?
            .column(oids::ENT_CLASS)
            .find(|row| row.value.as_i64() == Some(class))
            .and_then(|row| oid::component(&row.oid, oids::ENT_INDEX_POS))
            .map(str::to_string)
    }

    pub(super) async fn query_chassis(&mut self, node: &mut Node, flags: QueryFlags) {
        self.cache.load(self.session, &ENTITY_COLUMNS).await;

        let chassis = self.first_entity_of_class(oids::ENT_CLASS_CHASSIS);
        if chassis.is_none() {
            debug!(ip = %self.session.ip(), "No chassis entity");
        }

        if let Some(index) = chassis.as_deref() {
            if flags.contains(QueryFlags::SERIAL) {
                if let Some(serial) = self.entity_text(oids::ENT_SERIAL, index) {
                    node.serial = Some(serial);
                }
            }
            if flags.contains(QueryFlags::PLAT) && node.platform.is_none() {
                node.platform = self.entity_text(oids::ENT_PLATFORM, index);
            }
        }

        if flags.contains(QueryFlags::IOS) && node.software.is_none() {
            node.software = chassis
                .as_deref()
                .and_then(|index| self.entity_software(index))
                .or_else(|| self.module_software());
        }
    }

    /// Software of the first module that reports any
    fn module_software(&self) -> Option<String> {
        self.cache
            .table(oids::ENT_CLASS)?
            .column(oids::ENT_CLASS)
            .filter(|row| row.value.as_i64() == Some(oids::ENT_CLASS_MODULE))
            .filter_map(|row| oid::component(&row.oid, oids::ENT_INDEX_POS))
            .find_map(|index| self.entity_software(index))
    }

    pub(super) async fn query_stack(&mut self, node: &mut Node) {
        self.cache
            .load(
                self.session,
                &[
                    oids::STACK_NUM,
                    oids::STACK_ROLE,
                    oids::STACK_PRIORITY,
                    oids::STACK_MAC,
                    oids::STACK_IMAGE,
                    oids::ENT_SERIAL,
                    oids::ENT_PLATFORM,
                ],
            )
            .await;
        let Some(table) = self.cache.table(oids::STACK_NUM) else {
            return;
        };

        let rows: Vec<_> = table.column(oids::STACK_NUM).collect();
        let mut stack = StackInfo {
            count: rows.len(),
            members: Vec::new(),
        };
        if !stack.is_stacked() {
            node.stack = stack;
            return;
        }

        for row in rows {
            let Some(index) = oid::component(&row.oid, oids::STACK_INDEX_POS) else {
                continue;
            };
            let column = |base: &'static str| oid::join(base, index);

            let mac = self
                .cache
                .table(oids::STACK_MAC)
                .and_then(|t| t.lookup(&column(oids::STACK_MAC)))
                .and_then(|v| v.as_bytes())
                .and_then(MacAddr::from_slice);

            stack.members.push(StackMember {
                num: row.value.as_i64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
                role: self
                    .cache
                    .table(oids::STACK_ROLE)
                    .and_then(|t| t.lookup(&column(oids::STACK_ROLE)))
                    .and_then(|v| v.as_i64())
                    .and_then(StackRole::from_code),
                priority: self
                    .cache
                    .text(oids::STACK_PRIORITY, &column(oids::STACK_PRIORITY))
                    .and_then(|p| p.parse().ok()),
                mac,
                image: self.cache.text(oids::STACK_IMAGE, &column(oids::STACK_IMAGE)),
                platform: self.entity_text(oids::ENT_PLATFORM, index),
                serial: self.entity_text(oids::ENT_SERIAL, index),
            });
        }

        debug!(name = %node.name, members = stack.count, "Stackwise detected");
        node.stack = stack;
    }

    pub(super) async fn query_vss(&mut self, node: &mut Node) {
        if self.session.get_text(oids::VSS_MODE).await.as_deref() != Some(oids::VSS_MODE_ENABLED) {
            node.vss = VssInfo::default();
            return;
        }

        let mut vss = VssInfo {
            enabled: true,
            domain: self.session.get_text(oids::VSS_DOMAIN).await,
            members: Vec::new(),
        };

        self.cache
            .load(self.session, &[oids::VSS_MODULES, oids::ENT_SOFTWARE, oids::ENT_SERIAL, oids::ENT_PLATFORM])
            .await;
        if let Some(modules) = self.cache.table(oids::VSS_MODULES) {
            vss.members = modules
                .column(oids::VSS_MODULES)
                .filter(|row| row.value.as_i64() == Some(1))
                .filter_map(|row| oid::last(&row.oid))
                .filter_map(|index| {
                    let software = self.entity_software(index)?;
                    Some(VssMember {
                        software: Some(software),
                        platform: self.entity_text(oids::ENT_PLATFORM, index),
                        serial: self.entity_text(oids::ENT_SERIAL, index),
                    })
                })
                .take(oids::VSS_MAX_MEMBERS)
                .collect();
        }

        debug!(name = %node.name, domain = ?vss.domain, "VSS detected");
        node.vss = vss;
    }
}
