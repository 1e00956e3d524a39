/// Core types and configuration for the cubotino-deploy system
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the deploy configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cubotino/deploy.json";

/// Deployment configuration shared by the provisioner and the supervisor.
///
/// Loaded from a JSON file; every field has a default matching a stock
/// single-user Raspberry Pi OS image, so a missing file is not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Unprivileged user owning the application and its crontab
    pub deploy_user: String,
    /// Directory holding the main control program and its assets
    pub app_dir: PathBuf,
    /// Python virtual environment created by the provisioner
    pub venv_dir: PathBuf,
    /// Main control program launched by the supervisor
    pub main_program: PathBuf,
    /// Extra arguments passed to the main control program
    pub program_args: Vec<String>,
    /// Session log receiving the child's stdout/stderr and status messages
    pub session_log: PathBuf,
    /// Structured audit trail (JSON lines)
    pub audit_log: PathBuf,
    /// Boot configuration file carrying the managed directives
    pub boot_config_path: PathBuf,
    /// Swap sizing configuration file
    pub swap_config_path: PathBuf,
    /// Minimum swap size in MB enforced by the provisioner
    pub swap_min_mb: u64,
    /// Power off the machine after a clean child exit.
    /// Default false: inert until the deployment has been validated.
    pub power_off_on_success: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            deploy_user: "pi".to_string(),
            app_dir: PathBuf::from("/home/pi/cubotino"),
            venv_dir: PathBuf::from("/home/pi/cubotino/venv"),
            main_program: PathBuf::from("/home/pi/cubotino/Cubotino_T.py"),
            program_args: Vec::new(),
            session_log: PathBuf::from("/home/pi/cubotino/Cubotino_T_terminal.log"),
            audit_log: PathBuf::from("/var/log/cubotino/audit.jsonl"),
            boot_config_path: PathBuf::from("/boot/config.txt"),
            swap_config_path: PathBuf::from("/etc/dphys-swapfile"),
            swap_min_mb: 512,
            power_off_on_success: false,
        }
    }
}

impl DeployConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] when
    /// `path` is `None`. A missing file yields the defaults; a present but
    /// malformed file is a configuration error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if explicit {
                return Err(DeployError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(DeployConfig::default());
        }

        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|e| {
            DeployError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Python interpreter inside the provisioned virtual environment.
    pub fn interpreter(&self) -> PathBuf {
        self.venv_dir.join("bin").join("python3")
    }

    /// Pip executable inside the provisioned virtual environment.
    pub fn pip(&self) -> PathBuf {
        self.venv_dir.join("bin").join("pip3")
    }
}

/// Error taxonomy for provisioning and supervision.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Privilege error: {0}")]
    Privilege(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Step '{step}' failed: {reason}")]
    Step { step: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DeployError>;
