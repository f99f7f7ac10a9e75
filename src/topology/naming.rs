use regex_lite::Regex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use super::error::ConfigError;

/// Expand a hostname pattern.
///
/// Supported variables: `$region`, `$datacenter`, `$hall`, `$role` and `#`
/// (the per-role ordinal). Variables that expand to nothing leave no stray
/// hyphens behind, so `$datacenter-$role-#` without a datacenter gives `spine-1`.
pub fn resolve_hostname(
    pattern: &str,
    datacenter: &str,
    region: &str,
    hall: &str,
    role: &str,
    index: usize,
) -> String {
    let result = pattern
        .replace("$region", region)
        .replace("$datacenter", datacenter)
        .replace("$hall", hall)
        .replace("$role", role)
        .replace('#', &index.to_string());
    let collapsed = match hyphen_runs() {
        Some(re) => re.replace_all(&result, "-").into_owned(),
        None => result,
    };
    collapsed.trim_matches('-').to_string()
}

/// A pattern must carry the `#` ordinal, or every device of a role gets the same name
pub fn check_hostname_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::invalid("hostname_pattern must not be empty"));
    }
    if !pattern.contains('#') {
        return Err(ConfigError::invalid(format!(
            "hostname_pattern '{}' has no '#' ordinal",
            pattern
        )));
    }
    Ok(())
}

fn hyphen_runs() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-{2,}").ok()).as_ref()
}

/// Data-plane interface naming family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceStyle {
    /// `eth1`, `eth2`, ... for Linux-based network OSes
    Linux,
    /// `Ethernet1`, `Ethernet2`, ...
    Ethernet,
}

impl InterfaceStyle {
    pub fn for_vendor(vendor: &str) -> Self {
        match vendor.trim().to_ascii_lowercase().as_str() {
            "frr" | "gobgp" | "linux" | "sonic-vs" => Self::Linux,
            _ => Self::Ethernet,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Linux => "eth",
            Self::Ethernet => "Ethernet",
        }
    }
}

/// Per-device monotonically increasing interface counters.
/// Data-plane and InfiniBand ports count independently, both from 1.
#[derive(Debug)]
pub struct InterfaceAllocator {
    style: InterfaceStyle,
    data: HashMap<String, usize>,
    ib: HashMap<String, usize>,
}

impl InterfaceAllocator {
    pub fn new(style: InterfaceStyle) -> Self {
        Self {
            style,
            data: HashMap::new(),
            ib: HashMap::new(),
        }
    }

    pub fn next_data(&mut self, hostname: &str) -> String {
        let n = bump(&mut self.data, hostname);
        format!("{}{}", self.style.prefix(), n)
    }

    pub fn next_ib(&mut self, hostname: &str) -> String {
        let n = bump(&mut self.ib, hostname);
        format!("IB{}", n)
    }
}

fn bump(counters: &mut HashMap<String, usize>, hostname: &str) -> usize {
    let n = counters.entry(hostname.to_string()).or_insert(0);
    *n += 1;
    *n
}

/// Sequential IPv4 allocator over a fixed pool
#[derive(Debug, Clone)]
pub struct AddressPool {
    base: u32,
    next: u32,
    size: u32,
}

impl AddressPool {
    /// `first` is the offset of the first handed-out address within the pool
    pub const fn new(base: Ipv4Addr, prefix_len: u8, first: u32) -> Self {
        let size = 1u32 << (32 - prefix_len as u32);
        Self {
            base: u32::from_be_bytes(base.octets()),
            next: first,
            size,
        }
    }

    /// Addresses still available for single allocation
    pub fn remaining(&self) -> usize {
        self.size.saturating_sub(self.next) as usize
    }

    pub fn next_addr(&mut self) -> String {
        let addr = Ipv4Addr::from(self.base.wrapping_add(self.next));
        self.next += 1;
        addr.to_string()
    }

    /// Next /31: (even address, odd address, subnet in CIDR form)
    pub fn next_p2p(&mut self) -> (String, String, String) {
        if self.next % 2 == 1 {
            self.next += 1;
        }
        let even = Ipv4Addr::from(self.base.wrapping_add(self.next));
        let odd = Ipv4Addr::from(self.base.wrapping_add(self.next + 1));
        self.next += 2;
        (even.to_string(), odd.to_string(), format!("{}/31", even))
    }
}

pub const CLOS_P2P_POOL: AddressPool = AddressPool::new(Ipv4Addr::new(10, 1, 0, 0), 16, 0);
pub const HIERARCHICAL_P2P_POOL: AddressPool = AddressPool::new(Ipv4Addr::new(10, 2, 0, 0), 16, 0);
pub const CLOS_LOOPBACK_POOL: AddressPool = AddressPool::new(Ipv4Addr::new(10, 255, 0, 0), 16, 1);
pub const HIERARCHICAL_LOOPBACK_POOL: AddressPool =
    AddressPool::new(Ipv4Addr::new(10, 254, 0, 0), 16, 1);
pub const MGMT_POOL: AddressPool = AddressPool::new(Ipv4Addr::new(172, 20, 0, 0), 16, 10);
