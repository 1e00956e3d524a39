//! Provisioning: an ordered, policy-tagged step list executed by one runner.
//!
//! The provisioner never rolls back. Every mutating step is written to
//! converge when re-run, so the recovery path after a mid-sequence failure
//! is simply running the provisioner again.

pub mod boot_config;
pub mod crontab;
pub mod packages;
pub mod plan;
pub mod policy;
pub mod pyenv;
pub mod runner;
pub mod services;
pub mod step;
pub mod swap;

pub use plan::ProvisionPlan;
pub use policy::FailurePolicy;
pub use runner::ProvisionReport;
pub use step::{ProvisionStep, StepStatus};

use crate::config::types::{DeployError, Result};
use std::process::Command;

/// Run an external command to completion, mapping spawn failures and
/// non-zero exits into process errors tagged with `what`.
pub(crate) fn run_checked(cmd: &mut Command, what: &str) -> Result<()> {
    log::debug!("running {}: {:?}", what, cmd);
    let status = cmd
        .status()
        .map_err(|e| DeployError::Process(format!("{}: failed to start: {}", what, e)))?;

    if status.success() {
        Ok(())
    } else {
        let detail = match status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        Err(DeployError::Process(format!("{}: {}", what, detail)))
    }
}
