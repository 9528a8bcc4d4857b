//! Run settings.
//!
//! Platform defaults and command-line values are resolved once into a
//! [`Settings`] value that is passed down explicitly; nothing below `main`
//! looks at the host platform.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::LevelFilter;

use crate::utils::paths::{expand_tilde, PathError};

/// Fallback domain when a lease config declares none
pub const DEFAULT_DOMAIN: &str = "localdomain";

/// Name of the host network list inside the preferences directory
pub const NETWORKING_FILE: &str = "networking";

/// Errors while resolving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("No default preferences directory on this platform, use --prefs-dir")]
    NoPrefsDir,

    #[error("No default VM directory on this platform, use --vm-dir or --vmx")]
    NoVmDir,

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Log verbosity accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
}

impl LogLevel {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// Output rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// dhcpd.conf host stanzas
    Text,
    /// Machine-readable records
    Json,
}

/// Where lease configs live below the preferences directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HostLayout {
    /// VMware Fusion: `<prefs>/<vmnet>/dhcpd.conf`
    Fusion,
    /// VMware Workstation: `<prefs>/<vmnet>/dhcpd/dhcpd.conf`
    Workstation,
}

impl HostLayout {
    pub fn networking_path(self, prefs_dir: &Path) -> PathBuf {
        prefs_dir.join(NETWORKING_FILE)
    }

    pub fn dhcpd_conf_path(self, prefs_dir: &Path, vmnet: &str) -> PathBuf {
        match self {
            HostLayout::Fusion => prefs_dir.join(vmnet).join("dhcpd.conf"),
            HostLayout::Workstation => prefs_dir.join(vmnet).join("dhcpd").join("dhcpd.conf"),
        }
    }
}

/// Host operating system, for default directories only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    pub fn default_prefs_dir(self) -> Option<PathBuf> {
        match self {
            Platform::MacOs => Some(PathBuf::from("/Library/Preferences/VMware Fusion")),
            Platform::Linux => Some(PathBuf::from("/etc/vmware")),
            Platform::Other => None,
        }
    }

    /// Unexpanded; may start with `~`
    pub fn default_vm_dir(self) -> Option<PathBuf> {
        match self {
            Platform::MacOs => Some(PathBuf::from("~/Documents/Virtual Machines.localized")),
            Platform::Linux => Some(PathBuf::from("~/vmware")),
            Platform::Other => None,
        }
    }

    pub fn default_layout(self) -> HostLayout {
        match self {
            Platform::Linux => HostLayout::Workstation,
            Platform::MacOs | Platform::Other => HostLayout::Fusion,
        }
    }
}

/// Where VM descriptors come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmSource {
    /// `<root>/*/*.vmx`
    Discover(PathBuf),
    /// Explicit files or directories
    Explicit(Vec<PathBuf>),
}

/// Values given on the command line; None means "use the platform default"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub prefs_dir: Option<PathBuf>,
    pub vm_dir: Option<PathBuf>,
    pub vmx: Vec<PathBuf>,
    pub layout: Option<HostLayout>,
    pub default_domain: Option<String>,
}

/// Fully resolved run settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub prefs_dir: PathBuf,
    pub vms: VmSource,
    pub layout: HostLayout,
    pub default_domain: String,
}

impl Settings {
    /// Resolve settings from command-line values and platform defaults
    pub fn resolve(platform: Platform, overrides: CliOverrides) -> Result<Self, SettingsError> {
        let prefs_dir = overrides
            .prefs_dir
            .or_else(|| platform.default_prefs_dir())
            .ok_or(SettingsError::NoPrefsDir)?;

        let vms = if overrides.vmx.is_empty() {
            let root = overrides
                .vm_dir
                .or_else(|| platform.default_vm_dir())
                .ok_or(SettingsError::NoVmDir)?;
            VmSource::Discover(expand_tilde(&root)?)
        } else {
            let paths = overrides
                .vmx
                .iter()
                .map(|path| expand_tilde(path))
                .collect::<Result<Vec<_>, _>>()?;
            VmSource::Explicit(paths)
        };

        Ok(Self {
            prefs_dir: expand_tilde(&prefs_dir)?,
            vms,
            layout: overrides.layout.unwrap_or_else(|| platform.default_layout()),
            default_domain: overrides
                .default_domain
                .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
        })
    }

    pub fn networking_path(&self) -> PathBuf {
        self.layout.networking_path(&self.prefs_dir)
    }

    pub fn dhcpd_conf_path(&self, vmnet: &str) -> PathBuf {
        self.layout.dhcpd_conf_path(&self.prefs_dir, vmnet)
    }
}
