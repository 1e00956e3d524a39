/// Virtual environment creation and pinned library installation.
use crate::config::types::{DeployError, Result};
use crate::provision::run_checked;
use crate::provision::step::StepStatus;
use std::path::Path;
use std::process::Command;

/// Create the virtual environment. A directory already carrying a
/// `pyvenv.cfg` is treated as created and left alone.
pub fn create_venv(venv_dir: &Path) -> Result<StepStatus> {
    if venv_dir.join("pyvenv.cfg").exists() {
        log::info!("virtual environment at {} already exists", venv_dir.display());
        return Ok(StepStatus::Unchanged);
    }

    if let Some(parent) = venv_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // --system-site-packages: the camera stack is installed as OS packages
    // and must stay importable from inside the environment.
    run_checked(
        Command::new("python3")
            .args(["-m", "venv", "--system-site-packages"])
            .arg(venv_dir),
        "python3 -m venv",
    )?;
    Ok(StepStatus::Changed)
}

/// Install the pinned requirement set into the environment.
pub fn install_libraries(venv_dir: &Path, requirements: &[String]) -> Result<StepStatus> {
    if requirements.is_empty() {
        return Ok(StepStatus::Unchanged);
    }

    let pip = venv_dir.join("bin").join("pip3");
    if !pip.exists() {
        return Err(DeployError::Config(format!(
            "no pip at {}; was the virtual environment created?",
            pip.display()
        )));
    }

    run_checked(
        Command::new(&pip).args(["install", "--upgrade", "pip", "wheel", "setuptools"]),
        "pip upgrade",
    )?;
    run_checked(
        Command::new(&pip).arg("install").args(requirements),
        "pip install",
    )?;
    Ok(StepStatus::Changed)
}
