//! Rendering of fixed-address records.
//!
//! Text output is a series of dhcpd `host` stanzas grouped per host network,
//! ready to paste into the user-editable part of a VMware dhcpd.conf.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use color_eyre::eyre::{Result, WrapErr};
use ipnet::Ipv4Net;
use serde::Serialize;

use crate::config::OutputFormat;

/// Header timestamp format, seconds precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One VM interface with its assigned address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedAddressRecord {
    pub host: String,
    pub mac: String,
    pub ip: Ipv4Addr,
    pub connection_type: String,
    pub network: String,
    pub device: String,
    pub vmx_path: PathBuf,
}

impl FixedAddressRecord {
    /// Descriptive key=value pairs for the comment line, sorted by key
    pub fn metadata(&self) -> BTreeMap<&'static str, &str> {
        BTreeMap::from([
            ("conn", self.connection_type.as_str()),
            ("net", self.network.as_str()),
            ("dev", self.device.as_str()),
        ])
    }

    /// dhcpd host stanza
    pub fn render(&self) -> String {
        let extra = self
            .metadata()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "# {host} {extra}\nhost {host} {{\n    hardware ethernet {mac};\n    fixed-address {ip};\n}}\n",
            host = self.host,
            extra = extra,
            mac = self.mac,
            ip = self.ip,
        )
    }
}

/// Records assigned from one host network's pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkGroup {
    pub network: String,
    pub subnet: Option<Ipv4Net>,
    pub domain: String,
    pub records: Vec<FixedAddressRecord>,
}

/// Render groups as dhcpd text
pub fn render_text(groups: &[NetworkGroup], timestamp: NaiveDateTime) -> String {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    let mut out = String::new();

    for group in groups {
        out.push_str(&format!("## {} {} fixed-address configs ##\n\n", stamp, group.network));
        for record in &group.records {
            out.push_str(&record.render());
            out.push('\n');
        }
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    groups: &'a [NetworkGroup],
}

/// Render groups as pretty-printed JSON
pub fn render_json(groups: &[NetworkGroup], timestamp: NaiveDateTime) -> serde_json::Result<String> {
    let report = JsonReport {
        generated_at: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        groups,
    };
    let mut rendered = serde_json::to_string_pretty(&report)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Render in the requested format
pub fn render(groups: &[NetworkGroup], timestamp: NaiveDateTime, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(groups, timestamp)),
        OutputFormat::Json => render_json(groups, timestamp).wrap_err("Failed to serialize records"),
    }
}
