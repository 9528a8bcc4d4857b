//! Fixed-address orchestration.
//!
//! This module coordinates a full run: read the host networks, build a
//! fixed-address pool for every DHCP-enabled network, load the VMs and hand
//! each qualifying interface the next address of its network's pool.

use std::collections::BTreeMap;

use color_eyre::eyre::{eyre, Result};
use log::{debug, info, warn};

use crate::config::{Settings, VmSource};
use crate::dhcpd::parse_dhcpd_file;
use crate::ip::{find_subnet, FixedAddressPool, PoolRegistry};
use crate::networking::{parse_networking_file, HostNetwork};
use crate::output::{FixedAddressRecord, NetworkGroup};
use crate::vmx::{collect_vmx_paths, discover_vmx_files, load_machines, VirtualMachine};

/// Connection types that map onto a fixed host network
pub const CONNECTION_NETWORKS: &[(&str, &str)] = &[("hostonly", "vmnet1"), ("nat", "vmnet8")];

/// Host network used by a connection type, if any
pub fn network_for_connection(connection_type: &str) -> Option<&'static str> {
    CONNECTION_NETWORKS
        .iter()
        .find(|(conn, _)| *conn == connection_type)
        .map(|(_, network)| *network)
}

/// Build the fixed-address pools of all DHCP-enabled networks
pub fn prepare_pools(settings: &Settings, networks: &BTreeMap<String, HostNetwork>) -> Result<PoolRegistry> {
    let mut registry = PoolRegistry::new();

    for (name, network) in networks {
        if !network.dhcp() {
            debug!("Ignoring non-DHCP network {} {:?}", name, network.attributes);
            continue;
        }

        let path = settings.dhcpd_conf_path(name);
        info!("Reading {} DHCP config {:?}", name, path);
        let config = parse_dhcpd_file(&path)?;
        let subnet = config
            .subnet
            .ok_or_else(|| eyre!("DHCP config '{}' has no subnet block", path.display()))?;

        match network.network {
            Some(declared) if declared != subnet.network => warn!(
                "{} network / dhcpd config mismatch {} {}",
                name, declared, subnet.network
            ),
            None => warn!("{} declares no host-only subnet, using dhcpd config {}", name, subnet.network),
            _ => {}
        }

        let domain = subnet.domain.as_deref().unwrap_or(settings.default_domain.as_str());
        let free = find_subnet(subnet.network, &subnet.reserved);
        match free {
            Some(block) => info!("Using {} as {} fixed-address range (domain {})", block, name, domain),
            None => warn!("No free fixed-address range left in {} for {}", subnet.network, name),
        }

        registry.insert(FixedAddressPool::new(name, subnet.network, free, domain));
    }

    Ok(registry)
}

/// Assign addresses to every qualifying interface.
///
/// VMs are taken in display-name order and interfaces in section order, so the
/// result only depends on the input files. Adding or renaming a VM shifts the
/// addresses of every VM sorted after it.
pub fn assign_addresses(machines: &[VirtualMachine], pools: &mut PoolRegistry) -> Result<Vec<NetworkGroup>> {
    let mut ordered: Vec<&VirtualMachine> = machines.iter().collect();
    ordered.sort_by(|a, b| a.hostname.cmp(&b.hostname));

    let mut grouped: BTreeMap<&'static str, Vec<FixedAddressRecord>> = BTreeMap::new();

    for vm in ordered {
        for interface in vm.interfaces() {
            let connection_type = interface.connection_type().unwrap_or_default();
            let Some(network) = network_for_connection(connection_type) else {
                debug!(
                    "{:?} {:?} unknown connection type {:?}",
                    vm.hostname, interface.section, connection_type
                );
                continue;
            };
            let Some(mac) = interface.mac_address() else {
                warn!("{:?} {:?} has no hardware address, skipping", vm.hostname, interface.section);
                continue;
            };

            let ip = pools.assign(network)?;
            grouped.entry(network).or_default().push(FixedAddressRecord {
                host: vm.hostname.clone(),
                mac,
                ip,
                connection_type: connection_type.to_string(),
                network: network.to_string(),
                device: interface.section.to_string(),
                vmx_path: vm.vmx_path.clone(),
            });
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(network, records)| {
            let pool = pools.get(network);
            NetworkGroup {
                network: network.to_string(),
                subnet: pool.and_then(|pool| pool.subnet),
                domain: pool.map(|pool| pool.domain.clone()).unwrap_or_default(),
                records,
            }
        })
        .collect())
}

/// Load the VMs named by the settings
pub fn load_vms(settings: &Settings) -> Result<Vec<VirtualMachine>> {
    let paths = match &settings.vms {
        VmSource::Discover(root) => discover_vmx_files(root)?,
        VmSource::Explicit(paths) => collect_vmx_paths(paths)?,
    };
    load_machines(&paths)
}

/// Run the whole pipeline and return the records grouped per network
pub fn generate_fixed_addresses(settings: &Settings) -> Result<Vec<NetworkGroup>> {
    let path = settings.networking_path();
    info!("Reading VMware networking config {:?}", path);
    let networks = parse_networking_file(&path)?;
    info!(
        "Found networks: {}",
        networks.keys().cloned().collect::<Vec<_>>().join(" ")
    );

    let mut pools = prepare_pools(settings, &networks)?;
    let machines = load_vms(settings)?;
    assign_addresses(&machines, &mut pools)
}
