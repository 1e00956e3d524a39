/// Structural validation of the deploy configuration.
///
/// Both roles validate before touching the system: a provisioner pointed at a
/// relative path or an empty user would otherwise fail halfway through a
/// mutating run.
use crate::config::types::{DeployConfig, DeployError, Result};

pub fn validate(config: &DeployConfig) -> Result<()> {
    if config.deploy_user.trim().is_empty() {
        return Err(DeployError::Config("deploy_user must not be empty".into()));
    }
    if config.deploy_user.contains(|c: char| c.is_whitespace()) {
        return Err(DeployError::Config(format!(
            "deploy_user '{}' must not contain whitespace",
            config.deploy_user
        )));
    }

    for (name, path) in [
        ("app_dir", &config.app_dir),
        ("venv_dir", &config.venv_dir),
        ("main_program", &config.main_program),
        ("session_log", &config.session_log),
        ("audit_log", &config.audit_log),
        ("boot_config_path", &config.boot_config_path),
        ("swap_config_path", &config.swap_config_path),
    ] {
        if !path.is_absolute() {
            return Err(DeployError::Config(format!(
                "{} must be an absolute path, got '{}'",
                name,
                path.display()
            )));
        }
    }

    if !config.main_program.starts_with(&config.app_dir) {
        return Err(DeployError::Config(format!(
            "main_program '{}' must live under app_dir '{}'",
            config.main_program.display(),
            config.app_dir.display()
        )));
    }

    if config.swap_min_mb == 0 {
        return Err(DeployError::Config(
            "swap_min_mb must be greater than zero".into(),
        ));
    }

    Ok(())
}
