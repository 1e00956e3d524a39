/// Child launch and the power-off decision.
///
/// The supervisor owns exactly one run of the main control program: spawn
/// it inside the provisioned environment, block until it terminates (no
/// timeout, termination is at the child's discretion), classify the exit
/// status, log the outcome, and on the clean path only, power off when the
/// configuration allows it.
use crate::config::types::{DeployConfig, DeployError, Result};
use crate::observability::audit::{AuditLog, DeployEventType};
use crate::supervise::outcome::{classify, ExitOutcome};
use std::fs::OpenOptions;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

/// What one supervised run did.
#[derive(Debug)]
pub struct LaunchReport {
    pub outcome: ExitOutcome,
    /// True when power-off was actually issued (clean exit + enabled switch)
    pub power_off_requested: bool,
    pub wall_time_secs: u64,
}

/// Run `command` to completion, write the status line into `sink`, and
/// return the classified outcome. The wait is indefinite.
pub fn supervise_command(command: &mut Command, sink: &mut dyn Write) -> Result<ExitOutcome> {
    let mut child = command
        .spawn()
        .map_err(|e| DeployError::Process(format!("failed to start child: {}", e)))?;

    let status = child
        .wait()
        .map_err(|e| DeployError::Process(format!("wait failed: {}", e)))?;

    let outcome = classify(status);
    writeln!(sink, "{}", outcome.status_message())?;
    Ok(outcome)
}

/// Supervise the configured main control program.
pub fn supervise(config: &DeployConfig, audit: &AuditLog) -> Result<LaunchReport> {
    if let Some(parent) = config.session_log.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut session_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.session_log)?;

    let mut command = Command::new(config.interpreter());
    command
        .arg(&config.main_program)
        .args(&config.program_args)
        .current_dir(&config.app_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(session_log.try_clone()?))
        .stderr(Stdio::from(session_log.try_clone()?));

    audit.record(
        DeployEventType::SupervisorLaunch,
        format!("{}", config.main_program.display()),
    );
    log::info!("launching {}", config.main_program.display());

    let started = Instant::now();
    let outcome = supervise_command(&mut command, &mut session_log)?;
    let wall_time_secs = started.elapsed().as_secs();

    log::info!("{}", outcome.status_message());
    audit.record(
        DeployEventType::ChildExited,
        format!("{:?} after {}s", outcome, wall_time_secs),
    );

    let power_off_requested = outcome.power_off_eligible() && config.power_off_on_success;
    if outcome.power_off_eligible() && !config.power_off_on_success {
        log::info!("clean exit, power-off disabled by configuration");
    }
    if power_off_requested {
        audit.record(DeployEventType::PowerOffRequested, "systemctl poweroff");
        power_off();
    }

    Ok(LaunchReport {
        outcome,
        power_off_requested,
        wall_time_secs,
    })
}

/// Issue the power-off. Best effort by design: a failure here leaves the
/// machine running, which is the safe direction.
fn power_off() {
    log::warn!("clean exit with power-off enabled: powering off");
    match Command::new("systemctl").arg("poweroff").status() {
        Ok(status) if status.success() => {}
        Ok(status) => log::error!("systemctl poweroff exited with {:?}", status.code()),
        Err(e) => log::error!("systemctl poweroff failed to start: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervise::outcome::REQUESTED_EXIT_CODE;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn clean_child_yields_clean_outcome_and_message() {
        let mut sink = Vec::new();
        let outcome = supervise_command(&mut sh("exit 0"), &mut sink).unwrap();
        assert_eq!(outcome, ExitOutcome::CleanExit);
        assert_eq!(String::from_utf8(sink).unwrap(), "Successfully executed\n");
    }

    #[test]
    fn requested_exit_code_is_not_an_error() {
        let mut sink = Vec::new();
        let outcome =
            supervise_command(&mut sh(&format!("exit {}", REQUESTED_EXIT_CODE)), &mut sink)
                .unwrap();
        assert_eq!(outcome, ExitOutcome::RequestedExit);
        assert!(!outcome.power_off_eligible());
    }

    #[test]
    fn unstartable_child_is_a_process_error_not_an_outcome() {
        let mut sink = Vec::new();
        let err = supervise_command(
            &mut Command::new("/nonexistent/cubotino-binary"),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::Process(_)));
        assert!(sink.is_empty(), "no status line without a child run");
    }
}
