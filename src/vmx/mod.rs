//! VM descriptor (`.vmx`) parsing.
//!
//! Descriptors are flat `section.key = "value"` files. This module turns them
//! into typed records and exposes the network interfaces each VM declares.

pub mod machine;
pub mod parser;
pub mod value;

pub use machine::{collect_vmx_paths, discover_vmx_files, load_machines, Interface, VirtualMachine};
pub use parser::{parse_vmx, parse_vmx_file, VmxRecord};
pub use value::{Coercion, Value};
