//! Head communicator: identity bundle and component aggregation

use std::sync::Arc;

use errors::{ProbeError, Result};
use netprobe_model::{
    ComponentKind, ComponentRecord, CpuComponent, DiskComponent, HardwareHealthComponent,
    Interface, MemoryComponent, Properties, SbcComponent, ServerComponent, UpsComponent,
};
use tracing::debug;

use super::{CommunicatorNode, DeviceCommunicator, OverrideRegistry};
use crate::devclass::{ClassCatalog, DeviceClass};
use crate::query::PollContext;

/// Entry point for polling one device
///
/// Wraps the head [`CommunicatorNode`] of a chain built from a device class,
/// its ancestors and the registered overrides.
#[derive(Debug, Clone)]
pub struct Communicator {
    head: Arc<CommunicatorNode>,
}

fn build_node(class: &Arc<DeviceClass>, registry: &OverrideRegistry, head: bool) -> Arc<CommunicatorNode> {
    let sub = class
        .parent()
        .map(|parent| build_node(parent, registry, false));
    let code = registry.create(class.name(), sub.clone());
    Arc::new(CommunicatorNode::new(Arc::clone(class), code, sub, head))
}

/// Keep a field value, or drop an unavailable one
fn optional<T>(field: &str, res: Result<T>) -> Result<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() || e.is_not_implemented() => Ok(None),
        Err(e) => Err(e.context(format!("error occurred during get {}", field))),
    }
}

/// Tracks whether an aggregated record received any value
#[derive(Debug, Default)]
struct Populated {
    any: bool,
}

impl Populated {
    fn take<T>(&mut self, field: &str, res: Result<T>) -> Result<Option<T>> {
        let value = optional(field, res)?;
        self.any |= value.is_some();
        Ok(value)
    }

    fn finish<T>(self, kind: ComponentKind, record: T) -> Result<T> {
        if !self.any {
            return Err(ProbeError::component_not_found(format!("no {} data available", kind)));
        }
        debug!(component = %kind, "Component assembled");
        Ok(record)
    }
}

impl Communicator {
    /// Build the chain for `class` and all of its ancestors
    pub fn build(class: Arc<DeviceClass>, registry: &OverrideRegistry) -> Self {
        Self {
            head: build_node(&class, registry, true),
        }
    }

    pub fn from_catalog(
        catalog: &dyn ClassCatalog,
        class: &str,
        registry: &OverrideRegistry,
    ) -> Result<Self> {
        Ok(Self::build(catalog.class(class)?, registry))
    }

    /// Head node of the chain
    pub fn node(&self) -> &Arc<CommunicatorNode> {
        &self.head
    }

    pub fn device_class(&self) -> &str {
        self.head.class().name()
    }

    pub fn available_components(&self) -> Vec<ComponentKind> {
        self.head.class().component_kinds().iter().copied().collect()
    }

    fn require(&self, kind: ComponentKind) -> Result<()> {
        if !self.head.class().has_component(kind) {
            return Err(ProbeError::component_not_found(format!(
                "no {} component available for this device",
                kind
            )));
        }
        Ok(())
    }

    /// Resolve the identity properties in order
    ///
    /// Each resolved value is visible to the lookups that follow it through the
    /// context's properties.
    pub async fn identify(&self, ctx: &PollContext) -> Result<Properties> {
        let mut properties = Properties::default();
        let mut ctx = ctx.clone();

        if let Some(vendor) = optional("vendor", self.head.vendor(&ctx).await)? {
            properties.vendor = Some(vendor);
            ctx = ctx.with_properties(properties.clone());
        }
        if let Some(model) = optional("model", self.head.model(&ctx).await)? {
            properties.model = Some(model);
            ctx = ctx.with_properties(properties.clone());
        }
        if let Some(series) = optional("model series", self.head.model_series(&ctx).await)? {
            properties.model_series = Some(series);
            ctx = ctx.with_properties(properties.clone());
        }
        if let Some(serial) = optional("serial number", self.head.serial_number(&ctx).await)? {
            properties.serial_number = Some(serial);
            ctx = ctx.with_properties(properties.clone());
        }
        properties.os_version = optional("os version", self.head.os_version(&ctx).await)?;

        debug!(class = %self.device_class(), ?properties, "Device identified");
        Ok(properties)
    }

    /// Normalized interface listing
    pub async fn interfaces(&self, ctx: &PollContext) -> Result<Vec<Interface>> {
        self.head.interfaces(ctx).await
    }

    pub async fn cpu(&self, ctx: &PollContext) -> Result<CpuComponent> {
        self.require(ComponentKind::Cpu)?;
        let (load, temperature) =
            tokio::join!(self.head.cpu_load(ctx), self.head.cpu_temperature(ctx));

        let mut fields = Populated::default();
        let cpu = CpuComponent {
            load: fields.take("cpu load", load)?,
            temperature: fields.take("cpu temperature", temperature)?,
        };
        fields.finish(ComponentKind::Cpu, cpu)
    }

    pub async fn memory(&self, ctx: &PollContext) -> Result<MemoryComponent> {
        self.require(ComponentKind::Memory)?;
        let mut fields = Populated::default();
        let memory = MemoryComponent {
            usage: fields.take("memory usage", self.head.memory_usage(ctx).await)?,
        };
        fields.finish(ComponentKind::Memory, memory)
    }

    pub async fn ups(&self, ctx: &PollContext) -> Result<UpsComponent> {
        self.require(ComponentKind::Ups)?;
        let head = &self.head;
        let (
            alarm_low_voltage_disconnect,
            battery_amperage,
            battery_capacity,
            battery_current,
            battery_remaining_time,
            battery_temperature,
            battery_voltage,
            current_load,
            mains_voltage_applied,
            rectifier_current,
            system_voltage,
        ) = tokio::join!(
            head.ups_alarm_low_voltage_disconnect(ctx),
            head.ups_battery_amperage(ctx),
            head.ups_battery_capacity(ctx),
            head.ups_battery_current(ctx),
            head.ups_battery_remaining_time(ctx),
            head.ups_battery_temperature(ctx),
            head.ups_battery_voltage(ctx),
            head.ups_current_load(ctx),
            head.ups_mains_voltage_applied(ctx),
            head.ups_rectifier_current(ctx),
            head.ups_system_voltage(ctx),
        );

        let mut fields = Populated::default();
        let ups = UpsComponent {
            alarm_low_voltage_disconnect: fields
                .take("ups alarm low voltage disconnect", alarm_low_voltage_disconnect)?,
            battery_amperage: fields.take("ups battery amperage", battery_amperage)?,
            battery_capacity: fields.take("ups battery capacity", battery_capacity)?,
            battery_current: fields.take("ups battery current", battery_current)?,
            battery_remaining_time: fields
                .take("ups battery remaining time", battery_remaining_time)?,
            battery_temperature: fields.take("ups battery temperature", battery_temperature)?,
            battery_voltage: fields.take("ups battery voltage", battery_voltage)?,
            current_load: fields.take("ups current load", current_load)?,
            mains_voltage_applied: fields.take("ups mains voltage applied", mains_voltage_applied)?,
            rectifier_current: fields.take("ups rectifier current", rectifier_current)?,
            system_voltage: fields.take("ups system voltage", system_voltage)?,
        };
        fields.finish(ComponentKind::Ups, ups)
    }

    pub async fn sbc(&self, ctx: &PollContext) -> Result<SbcComponent> {
        self.require(ComponentKind::Sbc)?;
        let head = &self.head;
        let (
            agents,
            realms,
            global_call_per_second,
            global_concurrent_sessions,
            active_local_contacts,
            transcoding_capacity,
            license_capacity,
            system_redundancy,
            system_health_score,
        ) = tokio::join!(
            head.sbc_agents(ctx),
            head.sbc_realms(ctx),
            head.sbc_global_call_per_second(ctx),
            head.sbc_global_concurrent_sessions(ctx),
            head.sbc_active_local_contacts(ctx),
            head.sbc_transcoding_capacity(ctx),
            head.sbc_license_capacity(ctx),
            head.sbc_system_redundancy(ctx),
            head.sbc_system_health_score(ctx),
        );

        let mut fields = Populated::default();
        let sbc = SbcComponent {
            agents: fields.take("sbc agents", agents)?,
            realms: fields.take("sbc realms", realms)?,
            global_call_per_second: fields
                .take("sbc global call per second", global_call_per_second)?,
            global_concurrent_sessions: fields
                .take("sbc global concurrent sessions", global_concurrent_sessions)?,
            active_local_contacts: fields.take("sbc active local contacts", active_local_contacts)?,
            transcoding_capacity: fields.take("sbc transcoding capacity", transcoding_capacity)?,
            license_capacity: fields.take("sbc license capacity", license_capacity)?,
            system_redundancy: fields.take("sbc system redundancy", system_redundancy)?,
            system_health_score: fields.take("sbc system health score", system_health_score)?,
        };
        fields.finish(ComponentKind::Sbc, sbc)
    }

    pub async fn server(&self, ctx: &PollContext) -> Result<ServerComponent> {
        self.require(ComponentKind::Server)?;
        let (procs, users) =
            tokio::join!(self.head.server_procs(ctx), self.head.server_users(ctx));

        let mut fields = Populated::default();
        let server = ServerComponent {
            procs: fields.take("server procs", procs)?,
            users: fields.take("server users", users)?,
        };
        fields.finish(ComponentKind::Server, server)
    }

    pub async fn disk(&self, ctx: &PollContext) -> Result<DiskComponent> {
        self.require(ComponentKind::Disk)?;
        let mut fields = Populated::default();
        let disk = DiskComponent {
            storages: fields.take("disk storages", self.head.disk_storages(ctx).await)?,
        };
        fields.finish(ComponentKind::Disk, disk)
    }

    pub async fn hardware_health(&self, ctx: &PollContext) -> Result<HardwareHealthComponent> {
        self.require(ComponentKind::HardwareHealth)?;
        let head = &self.head;
        let (environment_monitor_state, fans, power_supply) = tokio::join!(
            head.hardware_health_environment_monitor_state(ctx),
            head.hardware_health_fans(ctx),
            head.hardware_health_power_supply(ctx),
        );

        let mut fields = Populated::default();
        let health = HardwareHealthComponent {
            environment_monitor_state: fields.take(
                "hardware health environment monitor state",
                environment_monitor_state,
            )?,
            fans: fields.take("hardware health fans", fans)?,
            power_supply: fields.take("hardware health power supply", power_supply)?,
        };
        fields.finish(ComponentKind::HardwareHealth, health)
    }

    /// Any component as a tagged record
    pub async fn component(&self, ctx: &PollContext, kind: ComponentKind) -> Result<ComponentRecord> {
        Ok(match kind {
            ComponentKind::Interfaces => ComponentRecord::Interfaces(self.interfaces(ctx).await?),
            ComponentKind::Cpu => ComponentRecord::Cpu(self.cpu(ctx).await?),
            ComponentKind::Memory => ComponentRecord::Memory(self.memory(ctx).await?),
            ComponentKind::Ups => ComponentRecord::Ups(self.ups(ctx).await?),
            ComponentKind::Sbc => ComponentRecord::Sbc(self.sbc(ctx).await?),
            ComponentKind::Server => ComponentRecord::Server(self.server(ctx).await?),
            ComponentKind::Disk => ComponentRecord::Disk(self.disk(ctx).await?),
            ComponentKind::HardwareHealth => {
                ComponentRecord::HardwareHealth(self.hardware_health(ctx).await?)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::ErrorKind;

    #[test]
    fn test_optional_swallows_unavailable() {
        assert_eq!(optional::<u8>("x", Err(ProbeError::not_found("x"))).unwrap(), None);
        assert_eq!(optional::<u8>("x", Err(ProbeError::not_implemented("x"))).unwrap(), None);
        assert_eq!(optional("x", Ok(1u8)).unwrap(), Some(1));

        let err = optional::<u8>("vendor", Err(ProbeError::timeout("slow"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("error occurred during get vendor"));
    }

    #[test]
    fn test_nothing_populated_is_component_not_found() {
        let mut fields = Populated::default();
        let usage = fields.take::<f64>("memory usage", Err(ProbeError::not_found("x"))).unwrap();
        let err = fields
            .finish(ComponentKind::Memory, MemoryComponent { usage })
            .unwrap_err();
        assert!(err.is_component_not_found());
    }
}
