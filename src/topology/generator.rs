use std::collections::HashMap;
use tracing::debug;

use crate::models::{
    Architecture, Device, DeviceRole, DeviceType, FabricLink, GpuCluster, Interconnect, MgmtScope,
    Role,
};

use super::naming::{
    resolve_hostname, AddressPool, InterfaceAllocator, CLOS_LOOPBACK_POOL, CLOS_P2P_POOL,
    HIERARCHICAL_LOOPBACK_POOL, HIERARCHICAL_P2P_POOL, MGMT_POOL,
};
use super::resolver::ResolvedConfig;

const SPINE_ASN: u32 = 65000;
const SUPER_SPINE_ASN: u32 = 64900;
const LEAF_ASN_BASE: u32 = 65000;
/// Externals and cores count down from here
const EDGE_PEER_ASN_TOP: u32 = 64999;
const DISTRIBUTION_ASN: u32 = 65100;
const ACCESS_ASN_BASE: u32 = 65200;

/// Device count and model of one tier
#[derive(Debug, Clone, PartialEq)]
pub struct TierPlan {
    pub count: usize,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuClusterPlan {
    pub name: String,
    pub gpu_model: String,
    pub node_count: usize,
    pub gpus_per_node: usize,
    pub interconnect: Interconnect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuPlan {
    pub clusters: Vec<GpuClusterPlan>,
    pub uplinks_per_node: usize,
    pub leaf_uplinks: bool,
    pub fabric_cabling: bool,
}

impl GpuPlan {
    pub fn node_count(&self) -> usize {
        self.clusters.iter().fold(0, |n, c| n.saturating_add(c.node_count))
    }
}

/// How management switches are spread over the facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MgmtDistribution {
    None,
    PerRow,
    PerRack,
    PerHall,
    CountPerRow(usize),
}

impl MgmtDistribution {
    /// Accepts `count-per-row` (count taken from `per_row`) and the
    /// `count-per-row[N]` / `count-per-row:N` shorthands.
    pub fn parse(s: &str, per_row: usize) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "" | "per-row" => return Some(Self::PerRow),
            "per-rack" => return Some(Self::PerRack),
            "per-hall" => return Some(Self::PerHall),
            "none" => return Some(Self::None),
            "count-per-row" => return Some(Self::CountPerRow(per_row)),
            _ => {}
        }
        let rest = s.strip_prefix("count-per-row")?;
        let n = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .or_else(|| rest.strip_prefix(':'))?;
        n.trim().parse().ok().map(Self::CountPerRow)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MgmtPlan {
    pub model: String,
    pub distribution: MgmtDistribution,
}

/// Output of a generator run, before placement
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFabric {
    pub devices: Vec<Device>,
    pub fabric_links: Vec<FabricLink>,
    pub gpu_clusters: Vec<GpuCluster>,
}

/// Expand a resolved configuration into devices and links.
/// Identical input always yields identical output.
pub fn generate(cfg: &ResolvedConfig) -> GeneratedFabric {
    let mut builder = FabricBuilder::new(cfg);
    match cfg.architecture {
        Architecture::Clos => builder.build_clos(),
        Architecture::Hierarchical => builder.build_hierarchical(),
    }
    builder.build_gpu_clusters();
    builder.build_mgmt_switches();

    debug!(
        "Generated {} devices, {} fabric links, {} GPU clusters",
        builder.devices.len(),
        builder.fabric_links.len(),
        builder.gpu_clusters.len()
    );
    GeneratedFabric {
        devices: builder.devices,
        fabric_links: builder.fabric_links,
        gpu_clusters: builder.gpu_clusters,
    }
}

struct FabricBuilder<'a> {
    cfg: &'a ResolvedConfig,
    devices: Vec<Device>,
    fabric_links: Vec<FabricLink>,
    gpu_clusters: Vec<GpuCluster>,
    /// Leaf-class devices GPU nodes are striped across
    edge: Vec<usize>,
    interfaces: InterfaceAllocator,
    p2p: AddressPool,
    loopbacks: AddressPool,
    mgmt: AddressPool,
    ordinals: HashMap<Role, usize>,
}

impl<'a> FabricBuilder<'a> {
    fn new(cfg: &'a ResolvedConfig) -> Self {
        let (p2p, loopbacks) = match cfg.architecture {
            Architecture::Clos => (CLOS_P2P_POOL, CLOS_LOOPBACK_POOL),
            Architecture::Hierarchical => (HIERARCHICAL_P2P_POOL, HIERARCHICAL_LOOPBACK_POOL),
        };
        Self {
            cfg,
            devices: Vec::new(),
            fabric_links: Vec::new(),
            gpu_clusters: Vec::new(),
            edge: Vec::new(),
            interfaces: InterfaceAllocator::new(cfg.interface_style),
            p2p,
            loopbacks,
            mgmt: MGMT_POOL,
            ordinals: HashMap::new(),
        }
    }

    fn next_hostname(&mut self, role: Role, hall: &str) -> String {
        let n = self.ordinals.entry(role).or_insert(0);
        *n += 1;
        resolve_hostname(
            &self.cfg.hostname_pattern,
            &self.cfg.datacenter_name,
            &self.cfg.region_name,
            hall,
            role.as_str(),
            *n,
        )
    }

    fn push(&mut self, hostname: String, model: &str, device_type: DeviceType, role: DeviceRole) -> usize {
        let index = self.devices.len();
        self.devices.push(Device {
            index,
            hostname,
            model: model.to_string(),
            device_type,
            role,
            placement: None,
        });
        index
    }

    /// Add a device that gets a loopback and management address
    fn push_routed(
        &mut self,
        hostname: String,
        model: &str,
        device_type: DeviceType,
        make: impl FnOnce(String, String) -> DeviceRole,
    ) -> usize {
        let loopback = self.loopbacks.next_addr();
        let mgmt_ip = self.mgmt.next_addr();
        self.push(hostname, model, device_type, make(loopback, mgmt_ip))
    }

    /// `count` parallel /31 links; `upper` takes side A and the even address
    fn connect(&mut self, upper: usize, lower: usize, count: usize) -> Vec<FabricLink> {
        let a = self.devices[upper].hostname.clone();
        let b = self.devices[lower].hostname.clone();
        let mut links = Vec::with_capacity(count);
        for _ in 0..count {
            let (ip_a, ip_b, subnet) = self.p2p.next_p2p();
            links.push(FabricLink {
                side_a_hostname: a.clone(),
                side_a_interface: self.interfaces.next_data(&a),
                side_a_ip: ip_a,
                side_b_hostname: b.clone(),
                side_b_interface: self.interfaces.next_data(&b),
                side_b_ip: ip_b,
                subnet,
                cable_length_meters: None,
            });
        }
        links
    }

    fn connect_all(&mut self, uppers: &[usize], lowers: &[usize], ratio: usize) {
        for &u in uppers {
            for &l in lowers {
                let links = self.connect(u, l, ratio);
                self.fabric_links.extend(links);
            }
        }
    }

    fn build_clos(&mut self) {
        let cfg = self.cfg;

        // ── 1. External peers ──
        let mut externals = Vec::with_capacity(cfg.externals.count);
        for i in 1..=cfg.externals.count {
            let generated = self.next_hostname(Role::External, "");
            let hostname = cfg
                .external_names
                .get(i - 1)
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or(generated);
            let asn = EDGE_PEER_ASN_TOP.saturating_sub(i as u32 - 1);
            externals.push(self.push_routed(hostname, &cfg.externals.model, DeviceType::External, |loopback, mgmt_ip| {
                DeviceRole::External { loopback, asn, mgmt_ip }
            }));
        }

        // ── 2. Super-spines ──
        let mut super_spines = Vec::new();
        if let Some(ss) = &cfg.super_spines {
            for _ in 0..ss.count {
                let hostname = self.next_hostname(Role::SuperSpine, "");
                super_spines.push(self.push_routed(hostname, &ss.model, DeviceType::Internal, |loopback, mgmt_ip| {
                    DeviceRole::SuperSpine { loopback, asn: SUPER_SPINE_ASN, mgmt_ip }
                }));
            }
        }

        // ── 3. Spines and leaves, pod by pod ──
        let mut pod_spines: Vec<Vec<usize>> = Vec::with_capacity(cfg.pods);
        for pod in 1..=cfg.pods {
            let mut spines = Vec::with_capacity(cfg.tier1.count);
            for _ in 0..cfg.tier1.count {
                let hostname = self.next_hostname(Role::Spine, "");
                spines.push(self.push_routed(hostname, &cfg.tier1.model, DeviceType::Internal, |loopback, mgmt_ip| {
                    DeviceRole::Spine { pod, loopback, asn: SPINE_ASN, mgmt_ip }
                }));
            }
            pod_spines.push(spines);
        }
        let mut pod_leaves: Vec<Vec<usize>> = Vec::with_capacity(cfg.pods);
        let mut leaf_ordinal: u32 = 0;
        for pod in 1..=cfg.pods {
            let mut leaves = Vec::with_capacity(cfg.tier2.count);
            for _ in 0..cfg.tier2.count {
                leaf_ordinal += 1;
                let asn = LEAF_ASN_BASE + leaf_ordinal;
                let hostname = self.next_hostname(Role::Leaf, "");
                leaves.push(self.push_routed(hostname, &cfg.tier2.model, DeviceType::Internal, |loopback, mgmt_ip| {
                    DeviceRole::Leaf { pod, loopback, asn, mgmt_ip }
                }));
            }
            pod_leaves.push(leaves);
        }

        // ── 4. Links: spine↔leaf per pod, super-spine↔spine, external↔spine ──
        for (spines, leaves) in pod_spines.iter().zip(&pod_leaves) {
            self.connect_all(spines, leaves, cfg.tier1_ratio);
        }
        let all_spines: Vec<usize> = pod_spines.concat();
        self.connect_all(&super_spines, &all_spines, cfg.super_spine_ratio);
        self.connect_all(&externals, &all_spines, cfg.external_ratio);

        self.edge = pod_leaves.concat();
    }

    fn build_hierarchical(&mut self) {
        let cfg = self.cfg;

        // ── 1. Core ──
        let mut cores = Vec::with_capacity(cfg.tier1.count);
        for i in 1..=cfg.tier1.count {
            let asn = EDGE_PEER_ASN_TOP.saturating_sub(i as u32 - 1);
            let hostname = self.next_hostname(Role::Core, "");
            cores.push(self.push_routed(hostname, &cfg.tier1.model, DeviceType::Internal, |loopback, mgmt_ip| {
                DeviceRole::Core { loopback, asn, mgmt_ip }
            }));
        }

        // ── 2. Distribution ──
        let mut dists = Vec::with_capacity(cfg.tier2.count);
        for _ in 0..cfg.tier2.count {
            let hostname = self.next_hostname(Role::Distribution, "");
            dists.push(self.push_routed(hostname, &cfg.tier2.model, DeviceType::Internal, |loopback, mgmt_ip| {
                DeviceRole::Distribution { loopback, asn: DISTRIBUTION_ASN, mgmt_ip }
            }));
        }

        // ── 3. Access ──
        let mut access = Vec::with_capacity(cfg.tier3.count);
        for i in 1..=cfg.tier3.count {
            let asn = ACCESS_ASN_BASE + i as u32;
            let hostname = self.next_hostname(Role::Access, "");
            access.push(self.push_routed(hostname, &cfg.tier3.model, DeviceType::Internal, |loopback, mgmt_ip| {
                DeviceRole::Access { loopback, asn, mgmt_ip }
            }));
        }

        // ── 4. Links: distribution↔access, then core↔distribution ──
        self.connect_all(&dists, &access, cfg.tier2_ratio);
        self.connect_all(&cores, &dists, cfg.tier1_ratio);

        self.edge = access;
    }

    fn build_gpu_clusters(&mut self) {
        let cfg = self.cfg;
        let leaves = self.edge.clone();
        if leaves.is_empty() {
            return;
        }

        // Global node ordinal across clusters drives leaf striping
        let mut gi = 0usize;
        for plan in &cfg.gpu.clusters {
            let model = format!("{} {}-GPU Node", plan.gpu_model, plan.gpus_per_node);
            let mut device_indices = Vec::with_capacity(plan.node_count);
            let mut leaf_assignments: Vec<String> = Vec::new();
            let mut leaf_uplink_links = Vec::new();

            for _ in 0..plan.node_count {
                let leaf = leaves[gi % leaves.len()];
                gi += 1;
                let leaf_hostname = self.devices[leaf].hostname.clone();
                let hostname = self.next_hostname(Role::GpuNode, "");
                let mgmt_ip = self.mgmt.next_addr();
                let node = self.push(
                    hostname,
                    &model,
                    DeviceType::Internal,
                    DeviceRole::GpuNode {
                        cluster: plan.name.clone(),
                        leaf: leaf_hostname.clone(),
                        mgmt_ip,
                    },
                );
                if cfg.gpu.leaf_uplinks {
                    let links = self.connect(node, leaf, cfg.gpu.uplinks_per_node);
                    leaf_uplink_links.extend(links);
                }
                if !leaf_assignments.contains(&leaf_hostname) {
                    leaf_assignments.push(leaf_hostname);
                }
                device_indices.push(node);
            }

            let mut fabric_links = Vec::new();
            if cfg.gpu.fabric_cabling {
                for (i, &a) in device_indices.iter().enumerate() {
                    for &b in &device_indices[i + 1..] {
                        fabric_links.push(self.mesh_link(a, b, plan.interconnect));
                    }
                }
            }

            self.gpu_clusters.push(GpuCluster {
                name: plan.name.clone(),
                gpu_model: plan.gpu_model.clone(),
                node_count: plan.node_count,
                gpus_per_node: plan.gpus_per_node,
                interconnect: plan.interconnect,
                leaf_assignments,
                device_indices,
                leaf_uplink_links,
                fabric_links,
            });
        }
    }

    /// Unaddressed node-to-node link inside a GPU cluster
    fn mesh_link(&mut self, a: usize, b: usize, interconnect: Interconnect) -> FabricLink {
        let ha = self.devices[a].hostname.clone();
        let hb = self.devices[b].hostname.clone();
        let (ia, ib) = if interconnect.uses_ib_ports() {
            (self.interfaces.next_ib(&ha), self.interfaces.next_ib(&hb))
        } else {
            (self.interfaces.next_data(&ha), self.interfaces.next_data(&hb))
        };
        FabricLink {
            side_a_hostname: ha,
            side_a_interface: ia,
            side_a_ip: String::new(),
            side_b_hostname: hb,
            side_b_interface: ib,
            side_b_ip: String::new(),
            subnet: String::new(),
            cable_length_meters: None,
        }
    }

    fn build_mgmt_switches(&mut self) {
        let cfg = self.cfg;
        let f = &cfg.facility;
        let rows = || (1..=f.halls).flat_map(move |hall| (1..=f.rows_per_hall).map(move |row| (hall, row)));

        let scopes: Vec<MgmtScope> = match cfg.mgmt.distribution {
            MgmtDistribution::None => Vec::new(),
            MgmtDistribution::PerHall => (1..=f.halls).map(|hall| MgmtScope::Hall { hall }).collect(),
            MgmtDistribution::PerRow => rows().map(|(hall, row)| MgmtScope::Row { hall, row }).collect(),
            MgmtDistribution::CountPerRow(n) => rows()
                .flat_map(|(hall, row)| std::iter::repeat(MgmtScope::Row { hall, row }).take(n))
                .collect(),
            MgmtDistribution::PerRack => rows()
                .flat_map(|(hall, row)| {
                    (1..=f.rack_slots_per_row()).map(move |rack| MgmtScope::Rack { hall, row, rack })
                })
                .collect(),
        };

        for scope in scopes {
            let hostname = self.next_hostname(Role::MgmtSwitch, &scope.hall().to_string());
            let mgmt_ip = self.mgmt.next_addr();
            self.push(
                hostname,
                &cfg.mgmt.model,
                DeviceType::Internal,
                DeviceRole::MgmtSwitch { scope, mgmt_ip },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FacilityDefaults, TopologyConfig};
    use crate::topology::resolver::resolve;

    fn clos(spines: usize, leaves: usize) -> TopologyConfig {
        TopologyConfig {
            external_count: 0,
            tier1_count: spines,
            tier2_count: leaves,
            racks_per_row: 8,
            gpu_cluster_count: 0,
            mgmt_switch_distribution: "none".to_string(),
            ..Default::default()
        }
    }

    fn run(cfg: &TopologyConfig) -> GeneratedFabric {
        generate(&resolve(cfg, &FacilityDefaults::default()).unwrap())
    }

    fn count_touching(links: &[FabricLink], hostname: &str) -> usize {
        links
            .iter()
            .filter(|l| l.side_a_hostname == hostname || l.side_b_hostname == hostname)
            .count()
    }

    #[test]
    fn test_spine_leaf_fan_out() {
        let fabric = run(&clos(4, 16));
        assert_eq!(fabric.fabric_links.len(), 128);
        for i in 1..=16 {
            assert_eq!(count_touching(&fabric.fabric_links, &format!("leaf-{}", i)), 8);
        }
        for i in 1..=4 {
            assert_eq!(count_touching(&fabric.fabric_links, &format!("spine-{}", i)), 32);
        }
    }

    #[test]
    fn test_links_follow_ratio() {
        let mut cfg = clos(2, 4);
        cfg.tier1_to_tier2_ratio = Some(3);
        let fabric = run(&cfg);
        assert_eq!(fabric.fabric_links.len(), 2 * 4 * 3);
    }

    #[test]
    fn test_first_link_addressing_and_interfaces() {
        let fabric = run(&clos(2, 2));
        let l = &fabric.fabric_links[0];
        assert_eq!(l.side_a_hostname, "spine-1");
        assert_eq!(l.side_a_interface, "Ethernet1");
        assert_eq!(l.side_a_ip, "10.1.0.0");
        assert_eq!(l.side_b_hostname, "leaf-1");
        assert_eq!(l.side_b_ip, "10.1.0.1");
        assert_eq!(l.subnet, "10.1.0.0/31");

        let second_leaf = &fabric.fabric_links[2];
        assert_eq!(second_leaf.side_a_interface, "Ethernet3");
        assert_eq!(second_leaf.side_b_hostname, "leaf-2");
        assert_eq!(second_leaf.side_b_interface, "Ethernet1");
    }

    #[test]
    fn test_linux_vendor_uses_eth_prefix() {
        let mut cfg = clos(1, 1);
        cfg.vendor = "frr".to_string();
        let fabric = run(&cfg);
        assert_eq!(fabric.fabric_links[0].side_a_interface, "eth1");
    }

    #[test]
    fn test_super_spine_pods_multiply_tiers() {
        let mut cfg = clos(2, 4);
        cfg.super_spine_enabled = true;
        cfg.super_spine_count = 2;
        cfg.pods = 3;
        let fabric = run(&cfg);

        let count = |role: Role| fabric.devices.iter().filter(|d| d.kind() == role).count();
        assert_eq!(count(Role::Spine), 6);
        assert_eq!(count(Role::Leaf), 12);
        assert_eq!(count(Role::SuperSpine), 2);
        // spine↔leaf within each pod plus super-spine↔every spine
        assert_eq!(fabric.fabric_links.len(), 2 * 4 * 2 * 3 + 2 * 6 * 2);

        // leaves of pod 2 only connect to spines of pod 2
        for l in fabric.fabric_links.iter().filter(|l| l.side_b_hostname == "leaf-5") {
            assert!(l.side_a_hostname == "spine-3" || l.side_a_hostname == "spine-4");
        }
    }

    #[test]
    fn test_pods_ignored_without_super_spine() {
        let mut cfg = clos(2, 4);
        cfg.pods = 4;
        let fabric = run(&cfg);
        assert_eq!(fabric.devices.iter().filter(|d| d.kind() == Role::Leaf).count(), 4);
    }

    #[test]
    fn test_external_names_and_asns() {
        let mut cfg = clos(2, 2);
        cfg.external_count = 2;
        cfg.external_names = vec!["isp-a".to_string(), String::new()];
        let fabric = run(&cfg);
        assert_eq!(fabric.devices[0].hostname, "isp-a");
        assert_eq!(fabric.devices[0].device_type, DeviceType::External);
        assert_eq!(fabric.devices[1].hostname, "external-2");
        assert_eq!(fabric.devices[0].role.routing().map(|r| r.1), Some(64999));
        assert_eq!(fabric.devices[1].role.routing().map(|r| r.1), Some(64998));
        // 2 spines × 2 leaves × 2 + 2 externals × 2 spines × 2
        assert_eq!(fabric.fabric_links.len(), 16);
        assert_eq!(fabric.fabric_links[8].side_a_hostname, "isp-a");
    }

    #[test]
    fn test_gpu_striping_is_global_across_clusters() {
        let mut cfg = clos(2, 4);
        cfg.gpu_cluster_count = 2;
        cfg.gpu_nodes_per_cluster = 5;
        let fabric = run(&cfg);

        let mut per_leaf: HashMap<String, usize> = HashMap::new();
        for d in &fabric.devices {
            if let DeviceRole::GpuNode { leaf, .. } = &d.role {
                *per_leaf.entry(leaf.clone()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<usize> = per_leaf.values().copied().collect();
        counts.sort();
        assert_eq!(counts, vec![2, 2, 3, 3]);

        let second = &fabric.gpu_clusters[1];
        let first_node = &fabric.devices[second.device_indices[0]];
        match &first_node.role {
            DeviceRole::GpuNode { leaf, .. } => assert_eq!(leaf, "leaf-2"),
            other => panic!("unexpected role {:?}", other),
        }
    }

    #[test]
    fn test_gpu_uplinks_and_infiniband_mesh() {
        let mut cfg = clos(2, 4);
        cfg.gpu_cluster_count = 1;
        cfg.gpu_nodes_per_cluster = 8;
        let fabric = run(&cfg);
        let cluster = &fabric.gpu_clusters[0];

        assert_eq!(cluster.leaf_uplink_links.len(), 16);
        assert_eq!(cluster.fabric_links.len(), 8 * 7 / 2);
        assert_eq!(cluster.leaf_assignments.len(), 4);
        assert!(cluster.fabric_links.iter().all(|l| l.side_a_interface.starts_with("IB")));
        assert!(cluster.fabric_links.iter().all(|l| l.subnet.is_empty()));

        let first = &cluster.leaf_uplink_links[0];
        assert_eq!(first.side_a_hostname, "gpu-node-1");
        assert_eq!(first.side_a_interface, "Ethernet1");
        assert_eq!(first.side_b_hostname, "leaf-1");
        // leaf-1 already used Ethernet1..4 towards the two spines
        assert_eq!(first.side_b_interface, "Ethernet5");
    }

    #[test]
    fn test_ethernet_gpu_mesh_uses_data_ports() {
        let mut cfg = clos(1, 1);
        cfg.gpu_cluster_count = 1;
        cfg.gpu_nodes_per_cluster = 2;
        cfg.gpu_interconnect = "RoCE".to_string();
        cfg.gpu_include_leaf_uplinks = false;
        let fabric = run(&cfg);
        let mesh = &fabric.gpu_clusters[0].fabric_links;
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh[0].side_a_interface, "Ethernet1");
        assert!(fabric.gpu_clusters[0].leaf_uplink_links.is_empty());
    }

    #[test]
    fn test_hierarchical_emission_order() {
        let cfg = TopologyConfig {
            architecture: Architecture::Hierarchical,
            tier1_count: 2,
            tier2_count: 2,
            tier3_count: 4,
            mgmt_switch_distribution: "none".to_string(),
            ..Default::default()
        };
        let fabric = run(&cfg);
        assert_eq!(fabric.fabric_links.len(), 2 * 4 * 2 + 2 * 2 * 2);
        assert_eq!(fabric.fabric_links[0].side_a_hostname, "distribution-1");
        assert_eq!(fabric.fabric_links[0].side_b_hostname, "access-1");
        assert_eq!(fabric.fabric_links[0].subnet, "10.2.0.0/31");
        assert_eq!(fabric.fabric_links.last().unwrap().side_a_hostname, "core-2");
        assert!(fabric.devices.iter().all(|d| d.kind() != Role::External));
    }

    #[test]
    fn test_mgmt_switch_distributions() {
        let mut cfg = clos(2, 2);
        cfg.halls = 2;
        cfg.rows_per_hall = 2;
        cfg.racks_per_row = 3;

        let mgmt_count = |dist: &str| {
            let mut c = cfg.clone();
            c.mgmt_switch_distribution = dist.to_string();
            run(&c).devices.iter().filter(|d| d.kind() == Role::MgmtSwitch).count()
        };
        assert_eq!(mgmt_count("per-hall"), 2);
        assert_eq!(mgmt_count("per-row"), 4);
        assert_eq!(mgmt_count("per-rack"), 16);
        assert_eq!(mgmt_count("count-per-row[3]"), 12);
        assert_eq!(mgmt_count("none"), 0);
    }

    #[test]
    fn test_mgmt_distribution_parse() {
        assert_eq!(MgmtDistribution::parse("", 1), Some(MgmtDistribution::PerRow));
        assert_eq!(MgmtDistribution::parse("count-per-row", 2), Some(MgmtDistribution::CountPerRow(2)));
        assert_eq!(MgmtDistribution::parse("count-per-row:4", 1), Some(MgmtDistribution::CountPerRow(4)));
        assert_eq!(MgmtDistribution::parse("per-pod", 1), None);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut cfg = clos(4, 8);
        cfg.gpu_cluster_count = 2;
        cfg.mgmt_switch_distribution = "per-rack".to_string();
        assert_eq!(run(&cfg), run(&cfg));
    }

    #[test]
    fn test_datacenter_prefix_in_hostnames() {
        let mut cfg = clos(1, 1);
        cfg.datacenter_name = "dc1".to_string();
        let fabric = run(&cfg);
        assert_eq!(fabric.devices[0].hostname, "dc1-spine-1");
    }
}
