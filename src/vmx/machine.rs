//! Virtual machines and their network interfaces.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use log::{debug, info, warn};

use super::parser::{parse_vmx_file, VmxRecord};
use super::value::{Coercion, Value};

/// Section name prefix of network interfaces (`ethernet0`, `ethernet1`, ...)
pub const INTERFACE_PREFIX: &str = "ethernet";

/// Descriptor file extension
pub const VMX_EXTENSION: &str = "vmx";

/// One network interface section of a VM
#[derive(Debug, Clone, Copy)]
pub struct Interface<'a> {
    pub section: &'a str,
    pub attributes: &'a BTreeMap<String, Value>,
}

impl<'a> Interface<'a> {
    pub fn connection_type(&self) -> Option<&'a str> {
        self.attributes.get("connectionType").and_then(Value::as_str)
    }

    /// Hardware address, lower-cased. Prefers the generated address and falls
    /// back to a statically configured one.
    pub fn mac_address(&self) -> Option<String> {
        self.attributes
            .get("generatedAddress")
            .or_else(|| self.attributes.get("address"))
            .and_then(Value::as_str)
            .map(str::to_lowercase)
    }
}

/// A parsed `.vmx` descriptor
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    pub vmx_path: PathBuf,
    pub hostname: String,
    pub record: VmxRecord,
}

impl VirtualMachine {
    pub fn load(vmx_path: &Path) -> Result<Self> {
        let record = parse_vmx_file(vmx_path, &Coercion::default())?;
        Ok(Self::from_record(vmx_path.to_path_buf(), record))
    }

    pub fn from_record(vmx_path: PathBuf, record: VmxRecord) -> Self {
        let hostname = match record.get("displayName") {
            Some(name) => name.to_string(),
            None => vmx_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        Self {
            vmx_path,
            hostname,
            record,
        }
    }

    /// Interface sections in ascending section-name order
    pub fn interfaces(&self) -> impl Iterator<Item = Interface<'_>> {
        self.record
            .sections
            .iter()
            .filter(|(name, _)| name.starts_with(INTERFACE_PREFIX))
            .map(|(name, attributes)| Interface {
                section: name.as_str(),
                attributes,
            })
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn has_vmx_extension(path: &Path) -> bool {
    path.extension().map(|ext| ext == VMX_EXTENSION).unwrap_or(false)
}

/// Sorted `*.vmx` files directly inside `dir`
fn vmx_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let entries = fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to list directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !is_hidden(&path) && has_vmx_extension(&path) && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Find `<root>/*/*.vmx`, sorted by path.
///
/// A missing root yields no descriptors, only a warning.
pub fn discover_vmx_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        warn!("VM directory {:?} does not exist, no VMs found", root);
        return Ok(Vec::new());
    }

    let mut bundles = Vec::new();
    let entries = fs::read_dir(root)
        .wrap_err_with(|| format!("Failed to list VM directory '{}'", root.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !is_hidden(&path) && path.is_dir() {
            bundles.push(path);
        }
    }
    bundles.sort();

    let mut found = Vec::new();
    for bundle in bundles {
        found.extend(vmx_files_in(&bundle)?);
    }
    debug!("Discovered {} VMX files under {:?}", found.len(), root);
    Ok(found)
}

/// Resolve explicit paths: files are taken as-is, directories contribute
/// their `*.vmx` files. Duplicates are dropped.
pub fn collect_vmx_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for path in paths {
        if path.is_dir() {
            found.extend(vmx_files_in(path)?);
        } else {
            found.insert(path.clone());
        }
    }
    Ok(found.into_iter().collect())
}

/// Load every descriptor in `paths`, in order
pub fn load_machines(paths: &[PathBuf]) -> Result<Vec<VirtualMachine>> {
    paths
        .iter()
        .map(|path| {
            info!("Reading VMX info {:?}", path);
            VirtualMachine::load(path)
        })
        .collect()
}
