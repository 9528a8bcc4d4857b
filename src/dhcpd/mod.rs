//! Reader for VMware's ISC dhcpd configuration files.
//!
//! Only `subnet` blocks are interpreted. Within them, dynamic ranges and the
//! addresses of routers, name servers and the broadcast address are collected
//! as reserved networks, so the fixed-address search can steer around them.
//! Host blocks and any other block kinds are recognised and skipped.

pub mod lexer;
pub mod parser;

use std::collections::BTreeSet;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use ipnet::Ipv4Net;
use serde::Serialize;

pub use parser::{classify, parse_dhcpd_conf, BlockHeader, Line, Statement};

/// Errors in lines the parser recognised but could not interpret
#[derive(Debug, thiserror::Error)]
pub enum DhcpdParseError {
    #[error("line {line}: invalid address {value:?}")]
    InvalidAddress { line: usize, value: String },

    #[error("line {line}: invalid netmask {value:?}")]
    InvalidNetmask { line: usize, value: String },

    #[error("line {line}: range start {start} is after range end {end}")]
    InvalidRange {
        line: usize,
        start: Ipv4Addr,
        end: Ipv4Addr,
    },

    #[error("line {line}: range statement without addresses")]
    MissingAddress { line: usize },
}

/// A `subnet` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetDecl {
    pub network: Ipv4Net,
    /// Dynamic ranges and single reserved addresses, all as networks
    pub reserved: BTreeSet<Ipv4Net>,
    pub domain: Option<String>,
}

impl SubnetDecl {
    pub fn new(network: Ipv4Net) -> Self {
        Self {
            network,
            reserved: BTreeSet::new(),
            domain: None,
        }
    }
}

/// Parsed dhcpd.conf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DhcpdConfig {
    pub subnet: Option<SubnetDecl>,
}

/// Read and parse a dhcpd.conf file
pub fn parse_dhcpd_file(path: &Path) -> Result<DhcpdConfig> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read DHCP config '{}'", path.display()))?;
    let config = parse_dhcpd_conf(&content)
        .wrap_err_with(|| format!("Invalid DHCP config '{}'", path.display()))?;
    Ok(config)
}
