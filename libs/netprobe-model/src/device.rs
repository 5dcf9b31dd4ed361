//! Typed device records
//!
//! Field names follow the labels used in class query trees, so row groups read
//! from a device decode straight into these structs. Every field is optional:
//! a missing label leaves the field unset.

use serde::{Deserialize, Serialize};

use crate::ComponentKind;

/// Identification properties of a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

impl Properties {
    pub fn is_empty(&self) -> bool {
        self.vendor.is_none()
            && self.model.is_none()
            && self.model_series.is_none()
            && self.serial_number.is_none()
            && self.os_version.is_none()
    }
}

// ============================================================================
// Interfaces
// ============================================================================

/// Service access point counters attached to an interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SapInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound: Option<u64>,
}

/// One row of the interface table (IF-MIB naming)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Interface {
    pub if_index: Option<u64>,
    pub if_descr: Option<String>,
    pub if_type: Option<String>,
    pub if_mtu: Option<u64>,
    pub if_speed: Option<u64>,
    pub if_phys_address: Option<String>,
    pub if_admin_status: Option<String>,
    pub if_oper_status: Option<String>,
    pub if_last_change: Option<u64>,
    pub if_in_octets: Option<u64>,
    pub if_in_ucast_pkts: Option<u64>,
    pub if_in_n_ucast_pkts: Option<u64>,
    pub if_in_discards: Option<u64>,
    pub if_in_errors: Option<u64>,
    pub if_in_unknown_protos: Option<u64>,
    pub if_out_octets: Option<u64>,
    pub if_out_ucast_pkts: Option<u64>,
    pub if_out_n_ucast_pkts: Option<u64>,
    pub if_out_discards: Option<u64>,
    pub if_out_errors: Option<u64>,
    pub if_out_q_len: Option<u64>,
    pub if_specific: Option<String>,

    pub if_name: Option<String>,
    pub if_in_multicast_pkts: Option<u64>,
    pub if_in_broadcast_pkts: Option<u64>,
    pub if_out_multicast_pkts: Option<u64>,
    pub if_out_broadcast_pkts: Option<u64>,
    #[serde(rename = "ifHCInOctets")]
    pub if_hc_in_octets: Option<u64>,
    #[serde(rename = "ifHCInUcastPkts")]
    pub if_hc_in_ucast_pkts: Option<u64>,
    #[serde(rename = "ifHCInMulticastPkts")]
    pub if_hc_in_multicast_pkts: Option<u64>,
    #[serde(rename = "ifHCInBroadcastPkts")]
    pub if_hc_in_broadcast_pkts: Option<u64>,
    #[serde(rename = "ifHCOutOctets")]
    pub if_hc_out_octets: Option<u64>,
    #[serde(rename = "ifHCOutUcastPkts")]
    pub if_hc_out_ucast_pkts: Option<u64>,
    #[serde(rename = "ifHCOutMulticastPkts")]
    pub if_hc_out_multicast_pkts: Option<u64>,
    #[serde(rename = "ifHCOutBroadcastPkts")]
    pub if_hc_out_broadcast_pkts: Option<u64>,
    pub if_high_speed: Option<u64>,
    pub if_promiscuous_mode: Option<bool>,
    pub if_connector_present: Option<bool>,
    pub if_alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sap: Option<SapInterface>,
}

// ============================================================================
// Components
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsComponent {
    pub alarm_low_voltage_disconnect: Option<i64>,
    pub battery_amperage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub battery_current: Option<f64>,
    pub battery_remaining_time: Option<f64>,
    pub battery_temperature: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub current_load: Option<f64>,
    pub mains_voltage_applied: Option<bool>,
    pub rectifier_current: Option<f64>,
    pub system_voltage: Option<f64>,
}

/// Session agent of a session border controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbcAgent {
    pub hostname: Option<String>,
    pub current_active_sessions_inbound: Option<i64>,
    pub current_session_rate_inbound: Option<i64>,
    pub current_active_sessions_outbound: Option<i64>,
    pub current_session_rate_outbound: Option<i64>,
    pub period_asr: Option<i64>,
    pub status: Option<i64>,
}

/// Realm of a session border controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbcRealm {
    pub name: Option<String>,
    pub current_active_sessions_inbound: Option<i64>,
    pub current_session_rate_inbound: Option<i64>,
    pub current_active_sessions_outbound: Option<i64>,
    pub current_session_rate_outbound: Option<i64>,
    pub period_asr: Option<i64>,
    pub active_local_contacts: Option<i64>,
    pub status: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbcComponent {
    pub agents: Option<Vec<SbcAgent>>,
    pub realms: Option<Vec<SbcRealm>>,
    pub global_call_per_second: Option<i64>,
    pub global_concurrent_sessions: Option<i64>,
    pub active_local_contacts: Option<i64>,
    pub transcoding_capacity: Option<i64>,
    pub license_capacity: Option<i64>,
    pub system_redundancy: Option<i64>,
    pub system_health_score: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerComponent {
    pub procs: Option<i64>,
    pub users: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskStorage {
    #[serde(rename = "type")]
    pub storage_type: Option<String>,
    pub description: Option<String>,
    pub available: Option<u64>,
    pub used: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskComponent {
    pub storages: Option<Vec<DiskStorage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fan {
    pub description: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerSupply {
    pub description: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareHealthComponent {
    pub environment_monitor_state: Option<i64>,
    pub fans: Option<Vec<Fan>>,
    pub power_supply: Option<Vec<PowerSupply>>,
}

/// Any component record, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", content = "data", rename_all = "snake_case")]
pub enum ComponentRecord {
    Interfaces(Vec<Interface>),
    Cpu(CpuComponent),
    Memory(MemoryComponent),
    Ups(UpsComponent),
    Sbc(SbcComponent),
    Server(ServerComponent),
    Disk(DiskComponent),
    HardwareHealth(HardwareHealthComponent),
}

impl ComponentRecord {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Interfaces(_) => ComponentKind::Interfaces,
            Self::Cpu(_) => ComponentKind::Cpu,
            Self::Memory(_) => ComponentKind::Memory,
            Self::Ups(_) => ComponentKind::Ups,
            Self::Sbc(_) => ComponentKind::Sbc,
            Self::Server(_) => ComponentKind::Server,
            Self::Disk(_) => ComponentKind::Disk,
            Self::HardwareHealth(_) => ComponentKind::HardwareHealth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_labels() {
        let iface: Interface = serde_json::from_value(serde_json::json!({
            "ifIndex": 3,
            "ifDescr": "ge-0/0/1",
            "ifHCInOctets": 1024,
            "ifHighSpeed": 1000,
            "unknownLabel": "ignored",
        }))
        .unwrap();
        assert_eq!(iface.if_index, Some(3));
        assert_eq!(iface.if_descr.as_deref(), Some("ge-0/0/1"));
        assert_eq!(iface.if_hc_in_octets, Some(1024));
        assert_eq!(iface.if_high_speed, Some(1000));
        assert!(iface.sap.is_none());
    }

    #[test]
    fn test_interface_type_mismatch_fails() {
        let res: Result<Interface, _> =
            serde_json::from_value(serde_json::json!({ "ifSpeed": "fast" }));
        assert!(res.is_err());
    }

    #[test]
    fn test_disk_storage_type_label() {
        let storage: DiskStorage =
            serde_json::from_value(serde_json::json!({ "type": "fixed", "used": 10 })).unwrap();
        assert_eq!(storage.storage_type.as_deref(), Some("fixed"));
        assert_eq!(storage.used, Some(10));
    }

    #[test]
    fn test_component_record_kind() {
        let record = ComponentRecord::Server(ServerComponent {
            procs: Some(120),
            users: None,
        });
        assert_eq!(record.kind(), ComponentKind::Server);
        assert!(Properties::default().is_empty());
    }
}
