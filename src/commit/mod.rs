//! Writes a preview into the inventory, hall → row → rack → device → port
//! assignment. Every level needs the ids of the level above, so the walk is
//! sequential. A failed item is logged and counted; its children are skipped
//! and everything else carries on.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::db::Store;
use crate::models::*;
use crate::topology::cabling::CableRun;

/// The inventory operations a commit needs
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn upsert_hall(&self, req: &CreateHallRequest) -> anyhow::Result<Upserted>;
    async fn upsert_row(&self, req: &CreateRowRequest) -> anyhow::Result<Upserted>;
    async fn upsert_rack(&self, req: &CreateRackRequest) -> anyhow::Result<Upserted>;
    async fn upsert_device(&self, req: &CreateDeviceRequest) -> anyhow::Result<Upserted>;
    async fn upsert_port_assignment(&self, req: &SetPortAssignmentRequest) -> anyhow::Result<Upserted>;
}

#[async_trait]
impl Inventory for Store {
    async fn upsert_hall(&self, req: &CreateHallRequest) -> anyhow::Result<Upserted> {
        Store::upsert_hall(self, req).await
    }

    async fn upsert_row(&self, req: &CreateRowRequest) -> anyhow::Result<Upserted> {
        Store::upsert_row(self, req).await
    }

    async fn upsert_rack(&self, req: &CreateRackRequest) -> anyhow::Result<Upserted> {
        Store::upsert_rack(self, req).await
    }

    async fn upsert_device(&self, req: &CreateDeviceRequest) -> anyhow::Result<Upserted> {
        Store::upsert_device(self, req).await
    }

    async fn upsert_port_assignment(&self, req: &SetPortAssignmentRequest) -> anyhow::Result<Upserted> {
        Store::upsert_port_assignment(self, req).await
    }
}

/// Per-item result of a commit step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    AlreadyExists,
    Failed(String),
}

impl From<&anyhow::Result<Upserted>> for UpsertOutcome {
    fn from(result: &anyhow::Result<Upserted>) -> Self {
        match result {
            Ok(Upserted::Created(_)) => UpsertOutcome::Created,
            Ok(Upserted::AlreadyExists(_)) => UpsertOutcome::AlreadyExists,
            Err(e) => UpsertOutcome::Failed(format!("{:#}", e)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepCounts {
    pub created: usize,
    pub already_existed: usize,
    pub failed: usize,
    /// Not attempted because a parent failed
    pub skipped: usize,
}

impl StepCounts {
    fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::AlreadyExists => self.already_existed += 1,
            UpsertOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// What a commit did, level by level
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitSummary {
    pub halls: StepCounts,
    pub rows: StepCounts,
    pub racks: StepCounts,
    pub devices: StepCounts,
    pub port_assignments: StepCounts,
    pub failures: Vec<String>,
}

impl CommitSummary {
    pub fn failed(&self) -> usize {
        self.halls.failed + self.rows.failed + self.racks.failed + self.devices.failed + self.port_assignments.failed
    }

    /// Record an upsert result and return the row id on success
    fn settle(&mut self, step: Step, what: &str, result: anyhow::Result<Upserted>) -> Option<i64> {
        let outcome = UpsertOutcome::from(&result);
        self.counts(step).record(&outcome);
        match result {
            Ok(u) => Some(u.id()),
            Err(e) => {
                warn!("Commit: failed to create {} {}: {:#}", step.noun(), what, e);
                self.failures.push(format!("{} {}: {:#}", step.noun(), what, e));
                None
            }
        }
    }

    fn counts(&mut self, step: Step) -> &mut StepCounts {
        match step {
            Step::Hall => &mut self.halls,
            Step::Row => &mut self.rows,
            Step::Rack => &mut self.racks,
            Step::Device => &mut self.devices,
            Step::PortAssignment => &mut self.port_assignments,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Hall,
    Row,
    Rack,
    Device,
    PortAssignment,
}

impl Step {
    fn noun(&self) -> &'static str {
        match self {
            Step::Hall => "hall",
            Step::Row => "row",
            Step::Rack => "rack",
            Step::Device => "device",
            Step::PortAssignment => "port assignment",
        }
    }
}

/// Commit a preview and its cable runs. Re-running against a partially
/// committed inventory reports the existing rows as `already_existed`.
pub async fn commit(
    inventory: &dyn Inventory,
    preview: &TopologyPreview,
    datacenter_id: Option<i64>,
    runs: &[CableRun],
) -> CommitSummary {
    let mut summary = CommitSummary::default();
    let mut hall_ids: HashMap<usize, i64> = HashMap::new();
    let mut row_ids: HashMap<(usize, usize), i64> = HashMap::new();
    let mut rack_ids: HashMap<usize, i64> = HashMap::new();

    // ── 1. Facility ──
    for hall in facility_tree(&preview.racks) {
        let result = inventory
            .upsert_hall(&CreateHallRequest {
                datacenter_id,
                name: hall.name.clone(),
            })
            .await;
        let Some(hall_id) = summary.settle(Step::Hall, &hall.name, result) else {
            summary.rows.skipped += hall.rows.len();
            summary.racks.skipped += hall.rows.iter().map(|r| r.rack_indices.len()).sum::<usize>();
            continue;
        };
        hall_ids.insert(hall.number, hall_id);

        for row in &hall.rows {
            let result = inventory
                .upsert_row(&CreateRowRequest {
                    hall_id,
                    name: row.name.clone(),
                })
                .await;
            let Some(row_id) = summary.settle(Step::Row, &row.name, result) else {
                summary.racks.skipped += row.rack_indices.len();
                continue;
            };
            row_ids.insert((hall.number, row.number), row_id);

            for &index in &row.rack_indices {
                let Some(rack) = preview.racks.get(index) else { continue };
                let result = inventory
                    .upsert_rack(&CreateRackRequest {
                        row_id,
                        name: rack.name.clone(),
                        rack_type: rack.rack_type,
                        width_cm: rack.width_cm,
                        height_ru: rack.height_ru,
                        depth_cm: rack.depth_cm,
                    })
                    .await;
                if let Some(rack_id) = summary.settle(Step::Rack, &rack.name, result) {
                    rack_ids.insert(rack.index, rack_id);
                }
            }
        }
    }

    // ── 2. Devices ──
    let mut device_ids: HashMap<&str, i64> = HashMap::new();
    for d in &preview.devices {
        let (hall_id, row_id, rack_id) = match &d.placement {
            Some(slot) => {
                let rack_id = rack_ids.get(&slot.rack_index).copied();
                if rack_id.is_none() {
                    summary.devices.skipped += 1;
                    continue;
                }
                (
                    hall_ids.get(&slot.hall).copied(),
                    row_ids.get(&(slot.hall, slot.row)).copied(),
                    rack_id,
                )
            }
            None => (None, None, None),
        };
        let (loopback, asn) = match d.role.routing() {
            Some((loopback, asn)) => (Some(loopback.to_string()), Some(asn)),
            None => (None, None),
        };
        let req = CreateDeviceRequest {
            hostname: d.hostname.clone(),
            role: d.kind(),
            model: d.model.clone(),
            device_type: d.device_type,
            topology_name: preview.topology_name.clone(),
            loopback,
            asn,
            mgmt_ip: d.role.mgmt_ip().map(str::to_string),
            hall_id,
            row_id,
            rack_id,
            rack_position: d.rack_position(),
        };
        let result = inventory.upsert_device(&req).await;
        if let Some(id) = summary.settle(Step::Device, &d.hostname, result) {
            device_ids.insert(d.hostname.as_str(), id);
        }
    }

    // ── 3. Port assignments, one per cable end ──
    for run in runs {
        let (Some(&a), Some(&b)) = (
            device_ids.get(run.side_a_hostname.as_str()),
            device_ids.get(run.side_b_hostname.as_str()),
        ) else {
            summary.port_assignments.skipped += 2;
            continue;
        };
        let pp = |h: &Option<String>| h.as_deref().and_then(|h| device_ids.get(h).copied());
        let ends = [
            SetPortAssignmentRequest {
                device_id: a,
                port_name: run.side_a_interface.clone(),
                remote_device_id: b,
                remote_port_name: run.side_b_interface.clone(),
                description: None,
                patch_panel_a_id: pp(&run.side_a_patch_panel),
                patch_panel_a_port: run.side_a_pp_port.clone(),
                patch_panel_b_id: pp(&run.side_b_patch_panel),
                patch_panel_b_port: run.side_b_pp_port.clone(),
                cable_length_meters: run.cable_length_meters,
            },
            SetPortAssignmentRequest {
                device_id: b,
                port_name: run.side_b_interface.clone(),
                remote_device_id: a,
                remote_port_name: run.side_a_interface.clone(),
                description: None,
                patch_panel_a_id: pp(&run.side_b_patch_panel),
                patch_panel_a_port: run.side_b_pp_port.clone(),
                patch_panel_b_id: pp(&run.side_a_patch_panel),
                patch_panel_b_port: run.side_a_pp_port.clone(),
                cable_length_meters: run.cable_length_meters,
            },
        ];
        for req in &ends {
            let what = format!("{}:{}", run_host(run, req.device_id == a), req.port_name);
            let result = inventory.upsert_port_assignment(req).await;
            summary.settle(Step::PortAssignment, &what, result);
        }
    }

    info!(
        "Commit complete: {} halls, {} rows, {} racks, {} devices, {} port assignments created; {} failed",
        summary.halls.created,
        summary.rows.created,
        summary.racks.created,
        summary.devices.created,
        summary.port_assignments.created,
        summary.failed()
    );
    summary
}

fn run_host(run: &CableRun, side_a: bool) -> &str {
    if side_a {
        &run.side_a_hostname
    } else {
        &run.side_b_hostname
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{cabling::cable_runs, preview};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// Records calls; fails any hall or device whose name is listed
    #[derive(Default)]
    struct MockInventory {
        next_id: AtomicI64,
        fail: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockInventory {
        fn issue(&self, call: String, name: &str) -> anyhow::Result<Upserted> {
            self.calls.lock().unwrap().push(call);
            if self.fail.iter().any(|f| f == name) {
                anyhow::bail!("inventory rejected {}", name);
            }
            Ok(Upserted::Created(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    #[async_trait]
    impl Inventory for MockInventory {
        async fn upsert_hall(&self, req: &CreateHallRequest) -> anyhow::Result<Upserted> {
            self.issue(format!("hall {}", req.name), &req.name)
        }
        async fn upsert_row(&self, req: &CreateRowRequest) -> anyhow::Result<Upserted> {
            self.issue(format!("row {}", req.name), &req.name)
        }
        async fn upsert_rack(&self, req: &CreateRackRequest) -> anyhow::Result<Upserted> {
            self.issue(format!("rack {}", req.name), &req.name)
        }
        async fn upsert_device(&self, req: &CreateDeviceRequest) -> anyhow::Result<Upserted> {
            self.issue(format!("device {}", req.hostname), &req.hostname)
        }
        async fn upsert_port_assignment(&self, req: &SetPortAssignmentRequest) -> anyhow::Result<Upserted> {
            self.issue(format!("port {}", req.port_name), &req.port_name)
        }
    }

    fn small() -> TopologyPreview {
        let cfg = TopologyConfig {
            external_count: 0,
            tier1_count: 2,
            tier2_count: 2,
            tier1_to_tier2_ratio: Some(1),
            racks_per_row: 2,
            mgmt_switch_distribution: "none".to_string(),
            ..Default::default()
        };
        preview(&cfg, &FacilityDefaults::default()).unwrap()
    }

    #[test]
    fn test_commit_follows_facility_hierarchy() {
        let p = small();
        let runs = cable_runs(&p, &[]);
        let inv = MockInventory::default();
        let summary = tokio_test::block_on(commit(&inv, &p, Some(1), &runs));

        let calls = inv.calls.lock().unwrap().clone();
        let first_of = |prefix: &str| calls.iter().position(|c| c.starts_with(prefix)).unwrap();
        let last_of = |prefix: &str| calls.iter().rposition(|c| c.starts_with(prefix)).unwrap();
        assert!(last_of("hall") < first_of("row"));
        assert!(last_of("row") < first_of("rack"));
        assert!(last_of("rack") < first_of("device"));
        assert!(last_of("device") < first_of("port"));

        assert_eq!(summary.halls.created, 1);
        assert_eq!(summary.rows.created, 1);
        assert_eq!(summary.racks.created, p.racks.len());
        assert_eq!(summary.devices.created, p.devices.len());
        assert_eq!(summary.port_assignments.created, runs.len() * 2);
        assert_eq!(summary.failed(), 0);
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let p = small();
        let runs = cable_runs(&p, &[]);
        let inv = MockInventory {
            fail: vec!["leaf-1".to_string()],
            ..Default::default()
        };
        let summary = tokio_test::block_on(commit(&inv, &p, None, &runs));

        assert_eq!(summary.devices.failed, 1);
        assert_eq!(summary.devices.created, p.devices.len() - 1);
        let touching_leaf1 = runs.iter().filter(|r| r.touches("leaf-1")).count();
        assert_eq!(summary.port_assignments.skipped, touching_leaf1 * 2);
        assert_eq!(summary.port_assignments.created, (runs.len() - touching_leaf1) * 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].contains("leaf-1"));
    }

    #[test]
    fn test_failed_hall_skips_its_children() {
        let p = small();
        let inv = MockInventory {
            fail: vec!["Hall 1".to_string()],
            ..Default::default()
        };
        let summary = tokio_test::block_on(commit(&inv, &p, None, &[]));
        assert_eq!(summary.halls.failed, 1);
        assert_eq!(summary.rows.skipped, 1);
        assert_eq!(summary.racks.skipped, p.racks.len());
        let racked = p.devices.iter().filter(|d| d.placement.is_some()).count();
        assert_eq!(summary.devices.skipped, racked);
    }

    #[tokio::test]
    async fn test_recommit_against_store_reports_existing() {
        let store = Store::in_memory().await.unwrap();
        let p = small();
        let runs = cable_runs(&p, &[]);

        let first = commit(&store, &p, Some(1), &runs).await;
        assert_eq!(first.failed(), 0);
        assert_eq!(first.devices.created, p.devices.len());

        let second = commit(&store, &p, Some(1), &runs).await;
        assert_eq!(second.failed(), 0);
        assert_eq!(second.devices.created, 0);
        assert_eq!(second.devices.already_existed, p.devices.len());
        assert_eq!(second.racks.already_existed, p.racks.len());
        assert_eq!(second.port_assignments.already_existed, runs.len() * 2);
        assert_eq!(store.list_devices().await.unwrap().len(), p.devices.len());

        let assignments = store.list_port_assignments().await.unwrap();
        assert_eq!(assignments.len(), runs.len() * 2);
        let spine_end = assignments
            .iter()
            .find(|a| a.device == "spine-1" && a.port_name == "Ethernet1")
            .unwrap();
        assert_eq!(spine_end.remote_device, "leaf-1");
        assert_eq!(spine_end.patch_panel_a.as_deref(), Some("hall-1-row-1-pp"));
        assert_eq!(spine_end.patch_panel_a_port.as_deref(), Some("Port 1"));
    }
}
