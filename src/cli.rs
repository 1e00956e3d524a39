use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use crate::config::types::{DeployConfig, DeployError};
use crate::config::validator;
use crate::observability::audit::AuditLog;
use crate::platform::profiles::ProfileRegistry;
use crate::platform::release::{self, Platform};
use crate::provision::{plan, runner};
use crate::supervise::launcher;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CliMode {
    Compat,
    Setup,
    Launch,
}

impl CliMode {
    fn primary_binary(self) -> &'static str {
        match self {
            Self::Compat => "cubotino-deploy",
            Self::Setup => "cubotino-setup",
            Self::Launch => "cubotino-launch",
        }
    }

    fn mode_name(self) -> &'static str {
        match self {
            Self::Compat => "compat",
            Self::Setup => "setup",
            Self::Launch => "launch",
        }
    }

    fn allows(self, command: &Commands) -> bool {
        match self {
            Self::Compat => true,
            Self::Setup => matches!(command, Commands::Provision { .. } | Commands::Check),
            Self::Launch => matches!(command, Commands::Supervise),
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Deploy configuration file (defaults to /etc/cubotino/deploy.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a fresh OS image to host the main control program
    Provision {
        /// Answer the final reboot prompt affirmatively
        #[arg(long)]
        assume_yes: bool,
        /// Skip the reboot prompt and the reboot entirely
        #[arg(long)]
        no_reboot: bool,
    },
    /// Report detected platform, selected profile and collaborator availability
    Check,
    /// Launch the main control program and react to its exit status
    Supervise,
}

impl Commands {
    fn command_name(&self) -> &'static str {
        match self {
            Self::Provision { .. } => "provision",
            Self::Check => "check",
            Self::Supervise => "supervise",
        }
    }
}

fn validate_command_mode(mode: CliMode, command: &Commands) {
    if mode.allows(command) {
        return;
    }

    eprintln!(
        "Error: command '{}' is not available in '{}' mode",
        command.command_name(),
        mode.mode_name()
    );

    match mode {
        CliMode::Compat => {}
        CliMode::Setup => {
            eprintln!(
                "Use '{}' for the boot-time supervisor.",
                CliMode::Launch.primary_binary()
            );
        }
        CliMode::Launch => {
            eprintln!(
                "Use '{}' for provisioning commands like 'provision' and 'check'.",
                CliMode::Setup.primary_binary()
            );
        }
    }

    std::process::exit(2);
}

extern "C" fn signal_handler(sig: i32) {
    // ASYNC-SIGNAL SAFETY: Only use async-signal-safe functions here.
    // - No eprintln! (can deadlock if signal arrives during stdio/malloc)
    // - No std::process::exit() (runs atexit handlers, also unsafe)
    // - libc::write(STDERR) and libc::_exit() are async-signal-safe
    let msg = b"cubotino-deploy: signal received, exiting\n";
    unsafe {
        libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
        libc::_exit(128 + sig);
    }
}

fn setup_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as usize);
        libc::signal(libc::SIGINT, signal_handler as usize);
    }
}

pub fn run(mode: CliMode) -> Result<()> {
    setup_signal_handlers();
    env_logger::init();

    if !cfg!(unix) {
        eprintln!("Error: {} requires a Unix-like system", mode.primary_binary());
        std::process::exit(1);
    }

    let cli = Cli::parse();
    validate_command_mode(mode, &cli.command);

    let config = DeployConfig::load(cli.config.as_deref())?;
    validator::validate(&config)?;

    match cli.command {
        Commands::Provision {
            assume_yes,
            no_reboot,
        } => run_provision(&config, assume_yes, no_reboot),
        Commands::Check => run_check(&config),
        Commands::Supervise => run_supervise(&config),
    }
}

fn require_root(mode_hint: &str) -> Result<()> {
    if nix::unistd::geteuid().is_root() {
        return Ok(());
    }
    eprintln!("Error: provisioning mutates system configuration and requires root");
    eprintln!("Run with sudo: sudo {}", mode_hint);
    Err(DeployError::Privilege("provision requires euid 0".into()).into())
}

fn run_provision(config: &DeployConfig, assume_yes: bool, no_reboot: bool) -> Result<()> {
    require_root("cubotino-setup provision")?;

    let platform = release::detect()?;
    eprintln!("Detected platform: {} on {}", platform.pretty_name, platform.machine);

    let registry = ProfileRegistry::new();
    let profile = registry.select(&platform.release);
    match profile {
        Some(profile) => eprintln!("Selected provisioning profile: {}", profile.id),
        None => {
            eprintln!(
                "Warning: {} is not a supported release; profile-specific steps will be skipped",
                platform.release
            );
            eprintln!("Supported profiles: {}", registry.profile_ids().join(", "));
        }
    }

    let plan = plan::build(config, &platform, profile);
    let audit = AuditLog::open(&config.audit_log);
    let report = runner::run(plan, &audit)?;

    eprintln!();
    eprintln!(
        "Provisioning finished: {} steps applied, {} already satisfied",
        report.completed.len(),
        report.skipped.len()
    );
    for name in &report.tolerated_failures {
        eprintln!("Warning: best-effort step '{}' failed; see the log above", name);
    }

    if no_reboot {
        eprintln!("Reboot skipped (--no-reboot). Reboot manually to apply boot configuration.");
        return Ok(());
    }
    if assume_yes || confirm("Reboot now? [y/N] ")? {
        eprintln!("Rebooting...");
        crate::provision::run_checked(
            std::process::Command::new("systemctl").arg("reboot"),
            "systemctl reboot",
        )?;
    } else {
        eprintln!("Not rebooting. Boot configuration changes apply on the next reboot.");
    }
    Ok(())
}

/// Ask the operator a yes/no question. Anything but an explicit yes is no.
fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn run_check(config: &DeployConfig) -> Result<()> {
    match release::detect() {
        Ok(platform) => report_platform(&platform),
        Err(e) => eprintln!("Platform detection failed: {}", e),
    }

    eprintln!();
    eprintln!("External collaborators:");
    let mut all_ok = true;
    for (name, args) in [
        ("apt-get", ["--version"].as_slice()),
        ("systemctl", ["--version"].as_slice()),
        ("crontab", ["-V"].as_slice()),
        ("raspi-config", ["nonint", "get_can_expand"].as_slice()),
        ("python3", ["--version"].as_slice()),
    ] {
        match std::process::Command::new(name).args(args).output() {
            Ok(output) if output.status.success() => eprintln!("  {:<12} OK", name),
            Ok(_) => {
                eprintln!("  {:<12} present but not functional", name);
                all_ok = false;
            }
            Err(_) => {
                eprintln!("  {:<12} NOT FOUND", name);
                all_ok = false;
            }
        }
    }

    eprintln!();
    eprintln!("Main program: {}", config.main_program.display());
    eprintln!(
        "  {}",
        if config.main_program.exists() {
            "present"
        } else {
            "missing (copy the application before the first supervised boot)"
        }
    );

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn report_platform(platform: &Platform) {
    eprintln!("Platform: {} on {}", platform.pretty_name, platform.machine);
    let registry = ProfileRegistry::new();
    match registry.select(&platform.release) {
        Some(profile) => eprintln!("Provisioning profile: {} ({})", profile.id, profile.name),
        None => eprintln!(
            "No provisioning profile for {}; supported: {}",
            platform.release,
            registry.profile_ids().join(", ")
        ),
    }
}

fn run_supervise(config: &DeployConfig) -> Result<()> {
    let audit = AuditLog::open(&config.audit_log);
    let report = launcher::supervise(config, &audit)?;
    eprintln!("{}", report.outcome.status_message());
    Ok(())
}
