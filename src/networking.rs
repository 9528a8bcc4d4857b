//! Parser for the VMware `networking` answer file.
//!
//! Each interesting line looks like `answer VNET_8_HOSTONLY_SUBNET 192.168.194.0`.
//! Lines are grouped per virtual network (`vmnet8`) with lower-cased keys.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::LazyLock;

use color_eyre::eyre::{Result, WrapErr};
use ipnet::Ipv4Net;
use regex::Regex;
use serde::Serialize;

/// Key of the host-only subnet address
pub const SUBNET_KEY: &str = "hostonly_subnet";
/// Key of the host-only netmask
pub const NETMASK_KEY: &str = "hostonly_netmask";

/// Match: "answer VNET_8_DHCP yes"
static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^answer VNET_(?P<num>[0-9]+)_(?P<key>[^ ]+) (?P<value>.*)$")
        .expect("Invalid answer regex")
});

/// Errors in otherwise well-formed answer lines
#[derive(Debug, thiserror::Error)]
pub enum NetworkingError {
    #[error("{network}: invalid {key} value {value:?}")]
    InvalidAddress {
        network: String,
        key: &'static str,
        value: String,
    },

    #[error("{network}: netmask {netmask} is not contiguous")]
    InvalidNetmask { network: String, netmask: Ipv4Addr },
}

/// A typed answer value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Raw(String),
}

impl AnswerValue {
    /// `yes` and `no` become flags, everything else stays raw
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "yes" => AnswerValue::Flag(true),
            "no" => AnswerValue::Flag(false),
            _ => AnswerValue::Raw(raw.to_string()),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AnswerValue::Flag(flag) => Some(*flag),
            AnswerValue::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            AnswerValue::Raw(raw) => Some(raw),
            AnswerValue::Flag(_) => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Flag(true) => f.write_str("yes"),
            AnswerValue::Flag(false) => f.write_str("no"),
            AnswerValue::Raw(raw) => f.write_str(raw),
        }
    }
}

/// One virtual network as declared by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostNetwork {
    pub name: String,
    pub attributes: BTreeMap<String, AnswerValue>,
    /// Derived from the host-only subnet and netmask answers
    pub network: Option<Ipv4Net>,
}

impl HostNetwork {
    fn new(name: String) -> Self {
        Self {
            name,
            attributes: BTreeMap::new(),
            network: None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(AnswerValue::as_flag)
    }

    pub fn dhcp(&self) -> bool {
        self.flag("dhcp") == Some(true)
    }

    pub fn nat(&self) -> bool {
        self.flag("nat") == Some(true)
    }

    pub fn virtual_adapter(&self) -> bool {
        self.flag("virtual_adapter") == Some(true)
    }

    fn address(&self, key: &'static str) -> Result<Option<Ipv4Addr>, NetworkingError> {
        let Some(value) = self.attributes.get(key) else {
            return Ok(None);
        };
        let text = value.to_string();
        text.parse::<Ipv4Addr>()
            .map(Some)
            .map_err(|_| NetworkingError::InvalidAddress {
                network: self.name.clone(),
                key,
                value: text,
            })
    }

    fn derive_network(&mut self) -> Result<(), NetworkingError> {
        let (Some(subnet), Some(netmask)) = (self.address(SUBNET_KEY)?, self.address(NETMASK_KEY)?)
        else {
            return Ok(());
        };
        let network = Ipv4Net::with_netmask(subnet, netmask).map_err(|_| {
            NetworkingError::InvalidNetmask {
                network: self.name.clone(),
                netmask,
            }
        })?;
        self.network = Some(network.trunc());
        Ok(())
    }
}

/// Parse answer-file text into networks keyed by name (`vmnet1`, `vmnet8`, ...)
pub fn parse_networking(content: &str) -> Result<BTreeMap<String, HostNetwork>, NetworkingError> {
    let mut networks: BTreeMap<String, HostNetwork> = BTreeMap::new();

    for line in content.lines() {
        // Bridged setups add other line kinds; only answers matter here
        let Some(caps) = ANSWER.captures(line) else {
            continue;
        };
        let name = format!("vmnet{}", &caps["num"]);
        let key = caps["key"].to_lowercase();
        let value = AnswerValue::from_raw(&caps["value"]);

        networks
            .entry(name.clone())
            .or_insert_with(|| HostNetwork::new(name))
            .attributes
            .insert(key, value);
    }

    for network in networks.values_mut() {
        network.derive_network()?;
    }

    Ok(networks)
}

/// Read and parse the host `networking` file
pub fn parse_networking_file(path: &Path) -> Result<BTreeMap<String, HostNetwork>> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read networking config '{}'", path.display()))?;
    let networks = parse_networking(&content)
        .wrap_err_with(|| format!("Invalid networking config '{}'", path.display()))?;
    Ok(networks)
}
