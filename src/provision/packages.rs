/// OS package management through apt.
use crate::config::types::Result;
use crate::provision::run_checked;
use crate::provision::step::StepStatus;
use std::process::Command;

/// Base packages every release needs before the profile-specific work.
pub fn base_packages() -> Vec<String> {
    [
        "python3-venv",
        "python3-dev",
        "git",
        "dos2unix",
        "libatlas-base-dev",
        "libgl1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn apt_get() -> Command {
    let mut cmd = Command::new("apt-get");
    cmd.env("DEBIAN_FRONTEND", "noninteractive");
    cmd
}

/// Refresh the package index and upgrade the installed set.
pub fn update_and_upgrade() -> Result<()> {
    run_checked(apt_get().arg("update"), "apt-get update")?;
    run_checked(apt_get().args(["-y", "upgrade"]), "apt-get upgrade")
}

/// Install packages. An empty list is a satisfied step, not an error.
pub fn install(packages: &[String]) -> Result<StepStatus> {
    if packages.is_empty() {
        return Ok(StepStatus::Unchanged);
    }
    run_checked(
        apt_get().args(["-y", "install"]).args(packages),
        "apt-get install",
    )?;
    Ok(StepStatus::Changed)
}

/// Remove superseded packages. An empty list is a satisfied step.
pub fn remove(packages: &[String]) -> Result<StepStatus> {
    if packages.is_empty() {
        return Ok(StepStatus::Unchanged);
    }
    run_checked(
        apt_get().args(["-y", "remove"]).args(packages),
        "apt-get remove",
    )?;
    Ok(StepStatus::Changed)
}
