//! Declarative step of the chain: reads properties from a class query tree

use std::sync::Arc;

use async_trait::async_trait;
use errors::{ProbeError, Result};
use netprobe_model::{DiskStorage, Fan, Interface, PowerSupply, SbcAgent, SbcRealm, Value};
use serde::de::DeserializeOwned;

use super::DeviceCommunicator;
use crate::devclass::DeviceClass;
use crate::query::reader::shape_error;
use crate::query::{PollContext, PropertyGroups, QueryLeaf, QueryNode, QueryTree};

/// Resolves properties from the merged query tree of one [`DeviceClass`]
///
/// A path the class's own overlay doesn't define is `NotImplemented`, even when
/// an ancestor defines it; a path that is defined but produced no rows on the
/// device is `NotFound`. A group defined in part by the class is read as merged
/// with its ancestors.
#[derive(Debug, Clone)]
pub struct ClassCommunicator {
    class: Arc<DeviceClass>,
}

impl ClassCommunicator {
    pub fn new(class: Arc<DeviceClass>) -> Self {
        Self { class }
    }

    pub fn class(&self) -> &Arc<DeviceClass> {
        &self.class
    }

    fn undefined(&self, path: &str) -> ProbeError {
        ProbeError::not_implemented(format!(
            "'{}' is not defined by class '{}'",
            path,
            self.class.name()
        ))
    }

    fn lookup(&self, path: &str) -> Option<&QueryNode> {
        if !self.class.declares(path) {
            return None;
        }
        self.class.tree().lookup(path)
    }

    fn leaf(&self, path: &str) -> Result<&QueryLeaf> {
        match self.lookup(path) {
            Some(QueryNode::Leaf(leaf)) => Ok(leaf),
            Some(QueryNode::Group(_)) => Err(shape_error(path, "leaf")),
            None => Err(self.undefined(path)),
        }
    }

    fn group(&self, path: &str) -> Result<&QueryTree> {
        match self.lookup(path) {
            Some(QueryNode::Group(tree)) => Ok(tree),
            Some(QueryNode::Leaf(_)) => Err(shape_error(path, "group")),
            None => Err(self.undefined(path)),
        }
    }

    /// Values of a leaf ordered by row index
    async fn column(&self, ctx: &PollContext, path: &str) -> Result<Vec<Value>> {
        let mut rows: Vec<(u64, Value)> = self.leaf(path)?.read(ctx).await?.into_iter().collect();
        if rows.is_empty() {
            return Err(ProbeError::not_found(format!("no value for '{}'", path)));
        }
        rows.sort_unstable_by_key(|(index, _)| *index);
        Ok(rows.into_iter().map(|(_, value)| value).collect())
    }

    /// Value of the lowest row of a leaf
    async fn scalar<T>(&self, ctx: &PollContext, path: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = ProbeError>,
    {
        let value = self
            .column(ctx, path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::not_found(format!("no value for '{}'", path)))?;
        T::try_from(value).map_err(|e| e.context(format!("'{}'", path)))
    }

    async fn list<T>(&self, ctx: &PollContext, path: &str) -> Result<Vec<T>>
    where
        T: TryFrom<Value, Error = ProbeError>,
    {
        self.column(ctx, path)
            .await?
            .into_iter()
            .map(|value| T::try_from(value).map_err(|e| e.context(format!("'{}'", path))))
            .collect()
    }

    async fn groups(&self, ctx: &PollContext, path: &str) -> Result<PropertyGroups> {
        let groups = PropertyGroups::from(self.group(path)?.read_all(ctx).await?);
        if groups.is_empty() {
            return Err(ProbeError::not_found(format!("no rows for '{}'", path)));
        }
        Ok(groups)
    }

    async fn records<T: DeserializeOwned>(&self, ctx: &PollContext, path: &str) -> Result<Vec<T>> {
        self.groups(ctx, path)
            .await?
            .decode()
            .map_err(|e| e.context(format!("'{}'", path)))
    }

    async fn interface_rows(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        self.groups(ctx, "interfaces")
            .await?
            .iter()
            .map(|group| -> Result<Interface> {
                let mut interface: Interface = group.decode()?;
                interface.if_index.get_or_insert(group.index);
                Ok(interface)
            })
            .collect()
    }
}

#[async_trait]
impl DeviceCommunicator for ClassCommunicator {
    async fn vendor(&self, ctx: &PollContext) -> Result<String> {
        self.scalar(ctx, "identify.vendor").await
    }

    async fn model(&self, ctx: &PollContext) -> Result<String> {
        self.scalar(ctx, "identify.model").await
    }

    async fn model_series(&self, ctx: &PollContext) -> Result<String> {
        self.scalar(ctx, "identify.model_series").await
    }

    async fn serial_number(&self, ctx: &PollContext) -> Result<String> {
        self.scalar(ctx, "identify.serial_number").await
    }

    async fn os_version(&self, ctx: &PollContext) -> Result<String> {
        self.scalar(ctx, "identify.os_version").await
    }

    async fn interfaces(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        self.interface_rows(ctx).await
    }

    async fn if_table(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        self.interface_rows(ctx).await
    }

    async fn interface_count(&self, ctx: &PollContext) -> Result<u64> {
        self.scalar(ctx, "interface_count").await
    }

    async fn cpu_load(&self, ctx: &PollContext) -> Result<Vec<f64>> {
        self.list(ctx, "cpu.load").await
    }

    async fn cpu_temperature(&self, ctx: &PollContext) -> Result<Vec<f64>> {
        self.list(ctx, "cpu.temperature").await
    }

    async fn memory_usage(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "memory.usage").await
    }

    async fn ups_alarm_low_voltage_disconnect(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "ups.alarm_low_voltage_disconnect").await
    }

    async fn ups_battery_amperage(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.battery_amperage").await
    }

    async fn ups_battery_capacity(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.battery_capacity").await
    }

    async fn ups_battery_current(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.battery_current").await
    }

    async fn ups_battery_remaining_time(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.battery_remaining_time").await
    }

    async fn ups_battery_temperature(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.battery_temperature").await
    }

    async fn ups_battery_voltage(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.battery_voltage").await
    }

    async fn ups_current_load(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.current_load").await
    }

    async fn ups_mains_voltage_applied(&self, ctx: &PollContext) -> Result<bool> {
        self.scalar(ctx, "ups.mains_voltage_applied").await
    }

    async fn ups_rectifier_current(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.rectifier_current").await
    }

    async fn ups_system_voltage(&self, ctx: &PollContext) -> Result<f64> {
        self.scalar(ctx, "ups.system_voltage").await
    }

    async fn sbc_agents(&self, ctx: &PollContext) -> Result<Vec<SbcAgent>> {
        self.records(ctx, "sbc.agents").await
    }

    async fn sbc_realms(&self, ctx: &PollContext) -> Result<Vec<SbcRealm>> {
        self.records(ctx, "sbc.realms").await
    }

    async fn sbc_global_call_per_second(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.global_call_per_second").await
    }

    async fn sbc_global_concurrent_sessions(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.global_concurrent_sessions").await
    }

    async fn sbc_active_local_contacts(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.active_local_contacts").await
    }

    async fn sbc_transcoding_capacity(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.transcoding_capacity").await
    }

    async fn sbc_license_capacity(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.license_capacity").await
    }

    async fn sbc_system_redundancy(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.system_redundancy").await
    }

    async fn sbc_system_health_score(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "sbc.system_health_score").await
    }

    async fn server_procs(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "server.procs").await
    }

    async fn server_users(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "server.users").await
    }

    async fn disk_storages(&self, ctx: &PollContext) -> Result<Vec<DiskStorage>> {
        self.records(ctx, "disk.storages").await
    }

    async fn hardware_health_environment_monitor_state(&self, ctx: &PollContext) -> Result<i64> {
        self.scalar(ctx, "hardware_health.environment_monitor_state")
            .await
    }

    async fn hardware_health_fans(&self, ctx: &PollContext) -> Result<Vec<Fan>> {
        self.records(ctx, "hardware_health.fans").await
    }

    async fn hardware_health_power_supply(&self, ctx: &PollContext) -> Result<Vec<PowerSupply>> {
        self.records(ctx, "hardware_health.power_supply").await
    }
}
