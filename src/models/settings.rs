use serde::{Deserialize, Serialize};

/// FacilityDefaults supplies every model name, the hostname pattern and the
/// cable slack used when a topology request leaves them unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityDefaults {
    #[serde(default = "default_spine_model")]
    pub spine_model: String,
    #[serde(default = "default_leaf_model")]
    pub leaf_model: String,
    #[serde(default = "default_spine_model")]
    pub super_spine_model: String,
    #[serde(default = "default_external_model")]
    pub external_model: String,
    #[serde(default = "default_external_model")]
    pub core_model: String,
    #[serde(default = "default_mgmt_switch_model")]
    pub mgmt_switch_model: String,
    #[serde(default = "default_gpu_model")]
    pub gpu_model: String,
    #[serde(default = "default_patch_panel_model")]
    pub patch_panel_model: String,
    // Device naming
    #[serde(default = "default_hostname_pattern")]
    pub hostname_pattern: String,
    // Topology builder
    #[serde(default = "default_cable_slack_percent")]
    pub cable_slack_percent: i32,
}

fn default_spine_model() -> String { "7050CX3-32S".to_string() }
fn default_leaf_model() -> String { "7050SX3-48YC8".to_string() }
fn default_external_model() -> String { "7280R3".to_string() }
fn default_mgmt_switch_model() -> String { "CCS-720XP-48ZC2".to_string() }
fn default_gpu_model() -> String { "MI300X".to_string() }
fn default_patch_panel_model() -> String { "PP-192-RJ45".to_string() }
fn default_hostname_pattern() -> String {
    "$datacenter-$role-#".to_string()
}
fn default_cable_slack_percent() -> i32 { 20 }

impl Default for FacilityDefaults {
    fn default() -> Self {
        Self {
            spine_model: default_spine_model(),
            leaf_model: default_leaf_model(),
            super_spine_model: default_spine_model(),
            external_model: default_external_model(),
            core_model: default_external_model(),
            mgmt_switch_model: default_mgmt_switch_model(),
            gpu_model: default_gpu_model(),
            patch_panel_model: default_patch_panel_model(),
            hostname_pattern: default_hostname_pattern(),
            cable_slack_percent: default_cable_slack_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let d: FacilityDefaults =
            serde_json::from_str(r#"{"leaf_model": "DCS-7060X", "cable_slack_percent": 10}"#).unwrap();
        assert_eq!(d.leaf_model, "DCS-7060X");
        assert_eq!(d.cable_slack_percent, 10);
        assert_eq!(d.spine_model, "7050CX3-32S");
        assert_eq!(d.hostname_pattern, "$datacenter-$role-#");
    }
}
