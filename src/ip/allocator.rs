//! Free sub-network search.
//!
//! VMware hands out dynamic leases from the upper part of each host-only
//! network, so the widest block that avoids every reserved range is usually
//! the `.64/26` just below it.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use ipnet::{Ipv4Net, Ipv4Subnets};

/// True if the two networks share at least one address
pub fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    // CIDR blocks are either nested or disjoint
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Minimal set of CIDR blocks whose union is exactly `[start, end]`
pub fn summarize_range(start: Ipv4Addr, end: Ipv4Addr) -> Vec<Ipv4Net> {
    Ipv4Subnets::new(start, end, 0).collect()
}

/// Find the biggest sub-network of `network` that overlaps none of `reserved`.
///
/// Prefix lengths are tried from one bit longer than the parent up to, but not
/// including, the two most specific sizes (/31 and /32 for IPv4). Within a
/// prefix length the lowest address wins.
pub fn find_subnet(network: Ipv4Net, reserved: &BTreeSet<Ipv4Net>) -> Option<Ipv4Net> {
    let first = network.prefix_len() + 1;
    let last = network.max_prefix_len() - 1;

    for prefix_len in first..last {
        let Ok(candidates) = network.subnets(prefix_len) else {
            continue;
        };
        for candidate in candidates {
            if reserved.iter().all(|taken| !overlaps(&candidate, taken)) {
                return Some(candidate);
            }
        }
    }

    None
}
