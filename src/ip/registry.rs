//! Fixed-address pools.
//!
//! One pool exists per DHCP-enabled host network. Addresses are handed out
//! in order from the start of the free block and never reused.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::Serialize;

/// Address allocation failures
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("{network}: no free sub-network left in {parent}")]
    NoFreeSubnet { network: String, parent: Ipv4Net },

    #[error("{network}: all {capacity} addresses of {subnet} are already assigned")]
    PoolExhausted {
        network: String,
        subnet: Ipv4Net,
        capacity: u64,
    },

    #[error("{network}: no fixed-address pool (DHCP disabled or not configured)")]
    NoPool { network: String },
}

/// Free block of one host network plus how much of it is handed out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedAddressPool {
    pub network: String,
    /// Network declared by the lease configuration
    pub parent: Ipv4Net,
    /// Largest free block, if any
    pub subnet: Option<Ipv4Net>,
    pub domain: String,
    issued: u64,
}

impl FixedAddressPool {
    pub fn new(network: &str, parent: Ipv4Net, subnet: Option<Ipv4Net>, domain: &str) -> Self {
        Self {
            network: network.to_string(),
            parent,
            subnet,
            domain: domain.to_string(),
            issued: 0,
        }
    }

    /// Number of addresses in the free block
    pub fn capacity(&self) -> u64 {
        self.subnet
            .map(|subnet| 1u64 << (subnet.max_prefix_len() - subnet.prefix_len()))
            .unwrap_or(0)
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Hand out the next address, starting at the block's network address
    pub fn next_address(&mut self) -> Result<Ipv4Addr, AllocationError> {
        let Some(subnet) = self.subnet else {
            return Err(AllocationError::NoFreeSubnet {
                network: self.network.clone(),
                parent: self.parent,
            });
        };
        if self.issued >= self.capacity() {
            return Err(AllocationError::PoolExhausted {
                network: self.network.clone(),
                subnet,
                capacity: self.capacity(),
            });
        }

        let base = u64::from(u32::from(subnet.network()));
        let address = u32::try_from(base + self.issued).map_err(|_| AllocationError::PoolExhausted {
            network: self.network.clone(),
            subnet,
            capacity: self.capacity(),
        })?;
        self.issued += 1;
        Ok(Ipv4Addr::from(address))
    }
}

/// Pools keyed by host network name
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: BTreeMap<String, FixedAddressPool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pool: FixedAddressPool) {
        self.pools.insert(pool.network.clone(), pool);
    }

    pub fn get(&self, network: &str) -> Option<&FixedAddressPool> {
        self.pools.get(network)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Next address from the named network's pool
    pub fn assign(&mut self, network: &str) -> Result<Ipv4Addr, AllocationError> {
        self.pools
            .get_mut(network)
            .ok_or_else(|| AllocationError::NoPool {
                network: network.to_string(),
            })?
            .next_address()
    }
}
