use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical topology role values across both architectures.
///
/// Declaration order is the top-down tier order used when sorting BOM rows
/// and connection sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    External,
    SuperSpine,
    Core,
    Spine,
    Distribution,
    PatchPanel,
    Leaf,
    Access,
    GpuNode,
    MgmtSwitch,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::External,
        Role::SuperSpine,
        Role::Core,
        Role::Spine,
        Role::Distribution,
        Role::PatchPanel,
        Role::Leaf,
        Role::Access,
        Role::GpuNode,
        Role::MgmtSwitch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::External => "external",
            Role::SuperSpine => "super-spine",
            Role::Core => "core",
            Role::Spine => "spine",
            Role::Distribution => "distribution",
            Role::PatchPanel => "patch-panel",
            Role::Leaf => "leaf",
            Role::Access => "access",
            Role::GpuNode => "gpu-node",
            Role::MgmtSwitch => "mgmt-switch",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    /// Rack units a device of this role occupies
    pub fn rack_units(&self) -> u32 {
        match self {
            Role::GpuNode => 4,
            _ => 1,
        }
    }

    /// Spine-class roles sit directly above the patch-panel tier
    pub fn is_spine_class(&self) -> bool {
        matches!(self, Role::Spine | Role::Distribution)
    }

    /// Leaf-class roles sit directly below the patch-panel tier and host GPU nodes
    pub fn is_leaf_class(&self) -> bool {
        matches!(self, Role::Leaf | Role::Access)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a device is part of the managed fabric or an outside peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Internal,
    External,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Internal => "internal",
            DeviceType::External => "external",
        }
    }
}

/// Which slice of the facility a management switch serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum MgmtScope {
    Hall { hall: usize },
    Row { hall: usize, row: usize },
    /// `rack` is the 1-based position within the row, network rack included
    Rack { hall: usize, row: usize, rack: usize },
}

impl MgmtScope {
    pub fn hall(&self) -> usize {
        match self {
            MgmtScope::Hall { hall } | MgmtScope::Row { hall, .. } | MgmtScope::Rack { hall, .. } => *hall,
        }
    }

    /// `None` for hall-wide switches
    pub fn row(&self) -> Option<usize> {
        match self {
            MgmtScope::Hall { .. } => None,
            MgmtScope::Row { row, .. } | MgmtScope::Rack { row, .. } => Some(*row),
        }
    }
}

/// Role-specific device attributes. Each variant carries only the fields
/// meaningful for that role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "kebab-case")]
pub enum DeviceRole {
    External { loopback: String, asn: u32, mgmt_ip: String },
    SuperSpine { loopback: String, asn: u32, mgmt_ip: String },
    Core { loopback: String, asn: u32, mgmt_ip: String },
    Spine { pod: usize, loopback: String, asn: u32, mgmt_ip: String },
    Distribution { loopback: String, asn: u32, mgmt_ip: String },
    PatchPanel { hall: usize, row: usize },
    Leaf { pod: usize, loopback: String, asn: u32, mgmt_ip: String },
    Access { loopback: String, asn: u32, mgmt_ip: String },
    GpuNode { cluster: String, leaf: String, mgmt_ip: String },
    MgmtSwitch { scope: MgmtScope, mgmt_ip: String },
}

impl DeviceRole {
    pub fn kind(&self) -> Role {
        match self {
            DeviceRole::External { .. } => Role::External,
            DeviceRole::SuperSpine { .. } => Role::SuperSpine,
            DeviceRole::Core { .. } => Role::Core,
            DeviceRole::Spine { .. } => Role::Spine,
            DeviceRole::Distribution { .. } => Role::Distribution,
            DeviceRole::PatchPanel { .. } => Role::PatchPanel,
            DeviceRole::Leaf { .. } => Role::Leaf,
            DeviceRole::Access { .. } => Role::Access,
            DeviceRole::GpuNode { .. } => Role::GpuNode,
            DeviceRole::MgmtSwitch { .. } => Role::MgmtSwitch,
        }
    }

    pub fn mgmt_ip(&self) -> Option<&str> {
        match self {
            DeviceRole::External { mgmt_ip, .. }
            | DeviceRole::SuperSpine { mgmt_ip, .. }
            | DeviceRole::Core { mgmt_ip, .. }
            | DeviceRole::Spine { mgmt_ip, .. }
            | DeviceRole::Distribution { mgmt_ip, .. }
            | DeviceRole::Leaf { mgmt_ip, .. }
            | DeviceRole::Access { mgmt_ip, .. }
            | DeviceRole::GpuNode { mgmt_ip, .. }
            | DeviceRole::MgmtSwitch { mgmt_ip, .. } => Some(mgmt_ip),
            DeviceRole::PatchPanel { .. } => None,
        }
    }

    /// (loopback, asn) for routed roles
    pub fn routing(&self) -> Option<(&str, u32)> {
        match self {
            DeviceRole::External { loopback, asn, .. }
            | DeviceRole::SuperSpine { loopback, asn, .. }
            | DeviceRole::Core { loopback, asn, .. }
            | DeviceRole::Spine { loopback, asn, .. }
            | DeviceRole::Distribution { loopback, asn, .. }
            | DeviceRole::Leaf { loopback, asn, .. }
            | DeviceRole::Access { loopback, asn, .. } => Some((loopback, *asn)),
            _ => None,
        }
    }
}

/// Where a device sits in the facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSlot {
    pub rack_index: usize,
    pub rack_name: String,
    pub hall: usize,
    pub row: usize,
    /// Lowest rack unit the device occupies (1 = bottom)
    pub rack_position: u32,
}

/// Device is one generated fabric member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub index: usize,
    pub hostname: String,
    pub model: String,
    pub device_type: DeviceType,
    #[serde(flatten)]
    pub role: DeviceRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<RackSlot>,
}

impl Device {
    pub fn kind(&self) -> Role {
        self.role.kind()
    }

    pub fn rack_index(&self) -> Option<usize> {
        self.placement.as_ref().map(|p| p.rack_index)
    }

    pub fn rack_position(&self) -> Option<u32> {
        self.placement.as_ref().map(|p| p.rack_position)
    }
}
