use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::{error, info};

use vmfixed::config::{CliOverrides, HostLayout, LogLevel, OutputFormat, Platform, Settings};
use vmfixed::ip::AllocationError;
use vmfixed::{orchestrator, output};

/// Generate fixed-address DHCP stanzas for VMware virtual machines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// VMware preferences directory holding `networking` and the vmnet configs
    #[arg(long)]
    prefs_dir: Option<PathBuf>,

    /// Directory containing one sub-directory per VM
    #[arg(long)]
    vm_dir: Option<PathBuf>,

    /// Explicit .vmx files or directories containing them (repeatable)
    #[arg(long)]
    vmx: Vec<PathBuf>,

    /// Lease config layout below the preferences directory
    #[arg(long, value_enum)]
    layout: Option<HostLayout>,

    /// Log verbosity; overrides RUST_LOG when given (default INFO)
    #[arg(long, value_enum, ignore_case = true)]
    log_level: Option<LogLevel>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Domain used when a dhcpd config declares none
    #[arg(long)]
    default_domain: Option<String>,
}

/// An explicit level wins; otherwise RUST_LOG applies with INFO as fallback
fn logger(level: Option<LogLevel>) -> env_logger::Builder {
    let mut builder = match level {
        Some(level) => {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(level.level_filter());
            builder
        }
        None => env_logger::Builder::from_env(Env::default().default_filter_or("info")),
    };
    builder.format_timestamp_secs();
    builder
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    logger(args.log_level).init();

    let settings = Settings::resolve(
        Platform::current(),
        CliOverrides {
            prefs_dir: args.prefs_dir,
            vm_dir: args.vm_dir,
            vmx: args.vmx,
            layout: args.layout,
            default_domain: args.default_domain,
        },
    )?;
    info!("Preferences directory: {:?}", settings.prefs_dir);

    let groups = match orchestrator::generate_fixed_addresses(&settings) {
        Ok(groups) => groups,
        Err(report) => {
            if let Some(alloc) = report.chain().find_map(|e| e.downcast_ref::<AllocationError>()) {
                error!("Address allocation failed: {}", alloc);
            }
            return Err(report);
        }
    };

    let now = chrono::Local::now().naive_local();
    print!("{}", output::render(&groups, now, args.format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "vmfixed",
            "--prefs-dir", "/etc/vmware",
            "--vm-dir", "~/vmware",
        ]);

        assert_eq!(args.prefs_dir, Some(PathBuf::from("/etc/vmware")));
        assert_eq!(args.vm_dir, Some(PathBuf::from("~/vmware")));
        assert_eq!(args.log_level, None);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.vmx.is_empty());
    }

    #[test]
    fn test_log_level_names() {
        let args = Args::parse_from(["vmfixed", "--log-level", "WARNING"]);
        assert_eq!(args.log_level, Some(LogLevel::Warning));

        let args = Args::parse_from(["vmfixed", "--log-level", "debug"]);
        assert_eq!(args.log_level, Some(LogLevel::Debug));

        assert!(Args::try_parse_from(["vmfixed", "--log-level", "TRACE"]).is_err());
    }

    #[test]
    fn test_repeatable_vmx_and_format() {
        let args = Args::parse_from([
            "vmfixed",
            "--vmx", "a.vmx",
            "--vmx", "vms/",
            "--layout", "workstation",
            "--format", "json",
        ]);

        assert_eq!(args.vmx, vec![PathBuf::from("a.vmx"), PathBuf::from("vms/")]);
        assert_eq!(args.layout, Some(HostLayout::Workstation));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_explicit_log_level_wins_over_env() {
        std::env::set_var("RUST_LOG", "debug");
        let built = logger(Some(LogLevel::Warning)).build();
        assert_eq!(built.filter(), log::LevelFilter::Warn);
    }
}
