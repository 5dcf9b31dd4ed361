//! Component kinds a device class can advertise

use std::fmt;
use std::str::FromStr;

use errors::ProbeError;
use serde::{Deserialize, Serialize};

/// Logical subsystem of a device whose metrics are aggregated as a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Interfaces,
    Cpu,
    Memory,
    Ups,
    Sbc,
    Server,
    Disk,
    HardwareHealth,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Interfaces,
        ComponentKind::Cpu,
        ComponentKind::Memory,
        ComponentKind::Ups,
        ComponentKind::Sbc,
        ComponentKind::Server,
        ComponentKind::Disk,
        ComponentKind::HardwareHealth,
    ];

    /// Label used in class definitions
    ///
    /// # Examples
    /// ```
    /// # use netprobe_model::ComponentKind;
    /// assert_eq!(ComponentKind::HardwareHealth.as_str(), "hardware_health");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Interfaces => "interfaces",
            ComponentKind::Cpu => "cpu",
            ComponentKind::Memory => "memory",
            ComponentKind::Ups => "ups",
            ComponentKind::Sbc => "sbc",
            ComponentKind::Server => "server",
            ComponentKind::Disk => "disk",
            ComponentKind::HardwareHealth => "hardware_health",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProbeError::invalid_class(format!("unknown component '{}'", s)))
    }
}
