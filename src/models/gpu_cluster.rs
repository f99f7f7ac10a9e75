use serde::{Deserialize, Serialize};
use std::fmt;

use super::FabricLink;

/// GPU cluster interconnect technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interconnect {
    InfiniBand,
    InfinityFabric,
    #[serde(rename = "RoCE")]
    Roce,
    Ethernet,
    #[serde(rename = "NVLink")]
    NvLink,
}

impl Interconnect {
    /// Case-insensitive parse of the interconnect names accepted in requests
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "infiniband" | "ib" => Some(Self::InfiniBand),
            "infinityfabric" => Some(Self::InfinityFabric),
            "roce" | "rocev2" => Some(Self::Roce),
            "ethernet" => Some(Self::Ethernet),
            "nvlink" => Some(Self::NvLink),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InfiniBand => "InfiniBand",
            Self::InfinityFabric => "InfinityFabric",
            Self::Roce => "RoCE",
            Self::Ethernet => "Ethernet",
            Self::NvLink => "NVLink",
        }
    }

    /// Fabric mesh ports come from the separate IB counter
    pub fn uses_ib_ports(&self) -> bool {
        matches!(self, Self::InfiniBand | Self::InfinityFabric)
    }
}

impl fmt::Display for Interconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-cluster request entry; unset fields fall back to the flat GPU fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuClusterSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gpu_model: Option<String>,
    #[serde(default)]
    pub node_count: Option<usize>,
    #[serde(default)]
    pub gpus_per_node: Option<usize>,
    #[serde(default)]
    pub interconnect: Option<String>,
}

/// GpuCluster is a generated cluster of GPU nodes striped across leaves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuCluster {
    pub name: String,
    pub gpu_model: String,
    pub node_count: usize,
    pub gpus_per_node: usize,
    pub interconnect: Interconnect,
    /// Leaf hostnames this cluster's nodes are striped across
    pub leaf_assignments: Vec<String>,
    /// Indices into the preview device list for this cluster's GPU nodes
    #[serde(default)]
    pub device_indices: Vec<usize>,
    /// GPU node → leaf links
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaf_uplink_links: Vec<FabricLink>,
    /// Full mesh within the cluster
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fabric_links: Vec<FabricLink>,
}
