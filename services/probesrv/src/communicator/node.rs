//! One link of the resolution chain

use std::sync::Arc;

use async_trait::async_trait;
use errors::{ProbeError, Result};
use futures::future::BoxFuture;
use netprobe_model::{ComponentKind, DiskStorage, Fan, Interface, PowerSupply, SbcAgent, SbcRealm};

use super::chain::{try_in_order, Step};
use super::{ClassCommunicator, DeviceCommunicator};
use crate::devclass::DeviceClass;
use crate::query::PollContext;

/// `ifSpeed` value meaning "too fast for this counter, see `ifHighSpeed`"
pub const IF_SPEED_SENTINEL: u64 = u32::MAX as u64;

/// Class step, optional override and optional parent node for one class
///
/// Only the head node (the device's own class) gates properties on the
/// class's advertised components and normalizes interface listings.
pub struct CommunicatorNode {
    class: ClassCommunicator,
    code: Option<Arc<dyn DeviceCommunicator>>,
    sub: Option<Arc<CommunicatorNode>>,
    head: bool,
}

impl std::fmt::Debug for CommunicatorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommunicatorNode")
            .field("class", &self.class.class().name())
            .field("has_override", &self.code.is_some())
            .field("sub", &self.sub)
            .field("head", &self.head)
            .finish()
    }
}

impl CommunicatorNode {
    pub fn new(
        class: Arc<DeviceClass>,
        code: Option<Arc<dyn DeviceCommunicator>>,
        sub: Option<Arc<CommunicatorNode>>,
        head: bool,
    ) -> Self {
        Self {
            class: ClassCommunicator::new(class),
            code,
            sub,
            head,
        }
    }

    pub fn class(&self) -> &Arc<DeviceClass> {
        self.class.class()
    }

    pub fn sub(&self) -> Option<&Arc<CommunicatorNode>> {
        self.sub.as_ref()
    }

    pub fn is_head(&self) -> bool {
        self.head
    }

    fn gate(&self, kind: ComponentKind) -> Result<()> {
        if self.head && !self.class().has_component(kind) {
            return Err(ProbeError::component_not_found(format!(
                "no {} component available for this device",
                kind
            )));
        }
        Ok(())
    }

    async fn resolve<'a, T, F>(&'a self, property: &str, f: F) -> Result<T>
    where
        F: Fn(&'a dyn DeviceCommunicator) -> BoxFuture<'a, Result<T>> + Send,
    {
        let class: &'a dyn DeviceCommunicator = &self.class;
        let code = self.code.as_deref().map(|c| f(c));
        let sub = self
            .sub
            .as_deref()
            .map(|sub| f(sub as &'a dyn DeviceCommunicator));

        try_in_order(property, [
            (Step::Class, Some(f(class))),
            (Step::Override, code),
            (Step::Inherited, sub),
        ])
        .await
    }

    async fn resolve_string<'a, F>(&'a self, property: &str, f: F) -> Result<String>
    where
        F: Fn(&'a dyn DeviceCommunicator) -> BoxFuture<'a, Result<String>> + Send,
    {
        let value = self.resolve(property, f).await?;
        if value.is_empty() {
            return Err(ProbeError::not_found(format!("empty string returned for {}", property)));
        }
        Ok(value)
    }
}

/// Replace the `ifSpeed` sentinel by `ifHighSpeed` (Mbit/s) scaled to bit/s
pub fn normalize_interfaces(mut interfaces: Vec<Interface>) -> Vec<Interface> {
    for interface in &mut interfaces {
        if let (Some(IF_SPEED_SENTINEL), Some(high)) = (interface.if_speed, interface.if_high_speed) {
            interface.if_speed = Some(high.saturating_mul(1_000_000));
        }
    }
    interfaces
}

#[async_trait]
impl DeviceCommunicator for CommunicatorNode {
    async fn vendor(&self, ctx: &PollContext) -> Result<String> {
        self.resolve_string("vendor", |c| c.vendor(ctx)).await
    }

    async fn model(&self, ctx: &PollContext) -> Result<String> {
        self.resolve_string("model", |c| c.model(ctx)).await
    }

    async fn model_series(&self, ctx: &PollContext) -> Result<String> {
        self.resolve_string("model series", |c| c.model_series(ctx))
            .await
    }

    async fn serial_number(&self, ctx: &PollContext) -> Result<String> {
        self.resolve_string("serial number", |c| c.serial_number(ctx))
            .await
    }

    async fn os_version(&self, ctx: &PollContext) -> Result<String> {
        self.resolve_string("os version", |c| c.os_version(ctx))
            .await
    }

    async fn interfaces(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        self.gate(ComponentKind::Interfaces)?;
        let interfaces = self.resolve("interfaces", |c| c.interfaces(ctx)).await?;
        if self.head {
            return Ok(normalize_interfaces(interfaces));
        }
        Ok(interfaces)
    }

    async fn if_table(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        self.gate(ComponentKind::Interfaces)?;
        self.resolve("interface table", |c| c.if_table(ctx)).await
    }

    async fn interface_count(&self, ctx: &PollContext) -> Result<u64> {
        self.resolve("interface count", |c| c.interface_count(ctx))
            .await
    }

    async fn cpu_load(&self, ctx: &PollContext) -> Result<Vec<f64>> {
        self.gate(ComponentKind::Cpu)?;
        self.resolve("cpu load", |c| c.cpu_load(ctx)).await
    }

    async fn cpu_temperature(&self, ctx: &PollContext) -> Result<Vec<f64>> {
        self.gate(ComponentKind::Cpu)?;
        self.resolve("cpu temperature", |c| c.cpu_temperature(ctx))
            .await
    }

    async fn memory_usage(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Memory)?;
        self.resolve("memory usage", |c| c.memory_usage(ctx)).await
    }

    async fn ups_alarm_low_voltage_disconnect(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups alarm low voltage disconnect", |c| {
            c.ups_alarm_low_voltage_disconnect(ctx)
        })
        .await
    }

    async fn ups_battery_amperage(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups battery amperage", |c| c.ups_battery_amperage(ctx))
            .await
    }

    async fn ups_battery_capacity(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups battery capacity", |c| c.ups_battery_capacity(ctx))
            .await
    }

    async fn ups_battery_current(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups battery current", |c| c.ups_battery_current(ctx))
            .await
    }

    async fn ups_battery_remaining_time(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups battery remaining time", |c| {
            c.ups_battery_remaining_time(ctx)
        })
        .await
    }

    async fn ups_battery_temperature(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups battery temperature", |c| c.ups_battery_temperature(ctx))
            .await
    }

    async fn ups_battery_voltage(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups battery voltage", |c| c.ups_battery_voltage(ctx))
            .await
    }

    async fn ups_current_load(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups current load", |c| c.ups_current_load(ctx))
            .await
    }

    async fn ups_mains_voltage_applied(&self, ctx: &PollContext) -> Result<bool> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups mains voltage applied", |c| {
            c.ups_mains_voltage_applied(ctx)
        })
        .await
    }

    async fn ups_rectifier_current(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups rectifier current", |c| c.ups_rectifier_current(ctx))
            .await
    }

    async fn ups_system_voltage(&self, ctx: &PollContext) -> Result<f64> {
        self.gate(ComponentKind::Ups)?;
        self.resolve("ups system voltage", |c| c.ups_system_voltage(ctx))
            .await
    }

    async fn sbc_agents(&self, ctx: &PollContext) -> Result<Vec<SbcAgent>> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc agents", |c| c.sbc_agents(ctx)).await
    }

    async fn sbc_realms(&self, ctx: &PollContext) -> Result<Vec<SbcRealm>> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc realms", |c| c.sbc_realms(ctx)).await
    }

    async fn sbc_global_call_per_second(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc global call per second", |c| {
            c.sbc_global_call_per_second(ctx)
        })
        .await
    }

    async fn sbc_global_concurrent_sessions(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc global concurrent sessions", |c| {
            c.sbc_global_concurrent_sessions(ctx)
        })
        .await
    }

    async fn sbc_active_local_contacts(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc active local contacts", |c| {
            c.sbc_active_local_contacts(ctx)
        })
        .await
    }

    async fn sbc_transcoding_capacity(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc transcoding capacity", |c| c.sbc_transcoding_capacity(ctx))
            .await
    }

    async fn sbc_license_capacity(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc license capacity", |c| c.sbc_license_capacity(ctx))
            .await
    }

    async fn sbc_system_redundancy(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc system redundancy", |c| c.sbc_system_redundancy(ctx))
            .await
    }

    async fn sbc_system_health_score(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Sbc)?;
        self.resolve("sbc system health score", |c| c.sbc_system_health_score(ctx))
            .await
    }

    async fn server_procs(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Server)?;
        self.resolve("server procs", |c| c.server_procs(ctx)).await
    }

    async fn server_users(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::Server)?;
        self.resolve("server users", |c| c.server_users(ctx)).await
    }

    async fn disk_storages(&self, ctx: &PollContext) -> Result<Vec<DiskStorage>> {
        self.gate(ComponentKind::Disk)?;
        self.resolve("disk storages", |c| c.disk_storages(ctx)).await
    }

    async fn hardware_health_environment_monitor_state(&self, ctx: &PollContext) -> Result<i64> {
        self.gate(ComponentKind::HardwareHealth)?;
        self.resolve("hardware health environment monitor state", |c| {
            c.hardware_health_environment_monitor_state(ctx)
        })
        .await
    }

    async fn hardware_health_fans(&self, ctx: &PollContext) -> Result<Vec<Fan>> {
        self.gate(ComponentKind::HardwareHealth)?;
        self.resolve("hardware health fans", |c| c.hardware_health_fans(ctx))
            .await
    }

    async fn hardware_health_power_supply(&self, ctx: &PollContext) -> Result<Vec<PowerSupply>> {
        self.gate(ComponentKind::HardwareHealth)?;
        self.resolve("hardware health power supply", |c| {
            c.hardware_health_power_supply(ctx)
        })
        .await
    }
}
