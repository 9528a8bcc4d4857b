//! IP address allocation.
//!
//! This module finds unused address blocks inside a host network and hands
//! out fixed addresses from them.

pub mod allocator;
pub mod registry;

// Re-export commonly used types
pub use allocator::{find_subnet, overlaps, summarize_range};
pub use registry::{AllocationError, FixedAddressPool, PoolRegistry};
