//! # vmfixed - fixed-address DHCP stanzas for VMware virtual machines
//!
//! VMware Fusion and Workstation run a private dhcpd per host-only/NAT network.
//! This library reads those networks, finds an unused block of addresses in
//! each one, and assigns every VM interface a stable address from that block
//! as a ready-to-paste `host` stanza.
//!
//! ## Overview
//!
//! A run reads three kinds of files:
//!
//! - the host `networking` answer file (`answer VNET_8_DHCP yes`, ...)
//! - one `dhcpd.conf` per DHCP-enabled network
//! - the `.vmx` descriptor of every virtual machine
//!
//! Dynamic ranges, routers, name servers and broadcast addresses found in each
//! dhcpd.conf are treated as reserved. The widest sub-network that avoids all
//! of them becomes the fixed-address pool; on a stock VMware install this is
//! the `.64/26` just below the dynamic range.
//!
//! ## Architecture
//!
//! - `vmx`: descriptor parsing into typed values, VM and interface model
//! - `networking`: host network answer file parsing
//! - `dhcpd`: tokenizer and line-dispatch parser for dhcpd.conf subnets
//! - `ip`: free sub-network search and fixed-address pools
//! - `orchestrator`: end-to-end pipeline
//! - `output`: dhcpd text and JSON rendering
//! - `config`: settings resolved once from the command line and platform
//! - `utils`: path helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use vmfixed::config::{CliOverrides, Platform, Settings};
//! use vmfixed::{orchestrator, output};
//!
//! let settings = Settings::resolve(
//!     Platform::current(),
//!     CliOverrides {
//!         vm_dir: Some(PathBuf::from("~/vmware")),
//!         ..Default::default()
//!     },
//! )?;
//! let groups = orchestrator::generate_fixed_addresses(&settings)?;
//! let now = chrono::Local::now().naive_local();
//! print!("{}", output::render_text(&groups, now));
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Application-level functions return `color_eyre::Result` with file context.
//! Module-level failures are typed: [`dhcpd::DhcpdParseError`],
//! [`networking::NetworkingError`], [`config::SettingsError`] and
//! [`ip::AllocationError`]. Running out of addresses is always an
//! `AllocationError`, so callers can tell it apart from bad input.

pub mod config;
pub mod dhcpd;
pub mod ip;
pub mod networking;
pub mod orchestrator;
pub mod output;
pub mod utils;
pub mod vmx;
