/// Generic step executor.
///
/// Prints a numbered header before each step so the operator can see which
/// step failed, enforces each step's failure policy, and records every
/// outcome in the audit trail.
use crate::config::types::{DeployError, Result};
use crate::observability::audit::{AuditLog, DeployEventType};
use crate::provision::plan::ProvisionPlan;
use crate::provision::policy::FailurePolicy;
use crate::provision::step::StepStatus;

/// Summary of one provisioning run.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    /// Steps that mutated the system
    pub completed: Vec<&'static str>,
    /// Steps whose desired state already held
    pub skipped: Vec<&'static str>,
    /// Continue-on-failure steps that failed
    pub tolerated_failures: Vec<&'static str>,
}

impl ProvisionReport {
    /// True when nothing failed, not even tolerably.
    pub fn is_clean(&self) -> bool {
        self.tolerated_failures.is_empty()
    }
}

/// Execute the plan in order. Returns `Err` as soon as an abort-on-failure
/// step fails; continue-on-failure steps never abort the run.
pub fn run(plan: ProvisionPlan, audit: &AuditLog) -> Result<ProvisionReport> {
    let total = plan.steps.len();
    audit.record(
        DeployEventType::ProvisionStart,
        format!(
            "profile={} fingerprint={} steps={}",
            plan.profile_id.as_deref().unwrap_or("none"),
            plan.fingerprint,
            total
        ),
    );

    let mut report = ProvisionReport::default();

    for (idx, step) in plan.steps.into_iter().enumerate() {
        let name = step.name;
        let policy = step.policy;

        eprintln!();
        eprintln!("==> [{}/{}] {}", idx + 1, total, step.title);
        audit.record(DeployEventType::StepStarted, name);

        match step.run() {
            Ok(StepStatus::Changed) => {
                log::info!("step {} completed", name);
                audit.record(DeployEventType::StepCompleted, name);
                report.completed.push(name);
            }
            Ok(StepStatus::Unchanged) => {
                eprintln!("    already satisfied, nothing to do");
                log::info!("step {} already satisfied", name);
                audit.record(DeployEventType::StepSkipped, name);
                report.skipped.push(name);
            }
            Err(e) => {
                eprintln!("    FAILED: {}", e);
                audit.record(DeployEventType::StepFailed, format!("{}: {}", name, e));
                match policy {
                    FailurePolicy::AbortOnFailure => {
                        audit.record(
                            DeployEventType::ProvisionEnd,
                            format!("aborted at step {}", name),
                        );
                        return Err(DeployError::Step {
                            step: name.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    FailurePolicy::ContinueOnFailure => {
                        log::warn!("step {} failed (tolerated): {}", name, e);
                        report.tolerated_failures.push(name);
                    }
                }
            }
        }
    }

    audit.record(
        DeployEventType::ProvisionEnd,
        format!(
            "completed={} skipped={} tolerated_failures={}",
            report.completed.len(),
            report.skipped.len(),
            report.tolerated_failures.len()
        ),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::DeployError;
    use crate::provision::plan::ProvisionPlan;
    use crate::provision::step::ProvisionStep;
    use std::cell::Cell;
    use std::rc::Rc;

    fn plan_of(steps: Vec<ProvisionStep>) -> ProvisionPlan {
        ProvisionPlan {
            steps,
            fingerprint: "test".to_string(),
            profile_id: None,
        }
    }

    fn failing(name: &'static str, policy: FailurePolicy) -> ProvisionStep {
        ProvisionStep::new(name, name, policy, || {
            Err(DeployError::Process("boom".into()))
        })
    }

    #[test]
    fn abort_policy_stops_the_sequence() {
        let ran_after = Rc::new(Cell::new(false));
        let flag = ran_after.clone();

        let steps = vec![
            failing("first", FailurePolicy::AbortOnFailure),
            ProvisionStep::new("second", "second", FailurePolicy::AbortOnFailure, move || {
                flag.set(true);
                Ok(StepStatus::Changed)
            }),
        ];

        let err = run(plan_of(steps), &AuditLog::disabled()).unwrap_err();
        assert!(matches!(err, DeployError::Step { ref step, .. } if step == "first"));
        assert!(!ran_after.get(), "steps after an abort must not run");
    }

    #[test]
    fn continue_policy_tolerates_failure_and_keeps_going() {
        let ran_after = Rc::new(Cell::new(false));
        let flag = ran_after.clone();

        let steps = vec![
            failing("best-effort", FailurePolicy::ContinueOnFailure),
            ProvisionStep::new("second", "second", FailurePolicy::AbortOnFailure, move || {
                flag.set(true);
                Ok(StepStatus::Changed)
            }),
        ];

        let report = run(plan_of(steps), &AuditLog::disabled()).unwrap();
        assert!(ran_after.get());
        assert_eq!(report.tolerated_failures, vec!["best-effort"]);
        assert_eq!(report.completed, vec!["second"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn unchanged_steps_are_reported_as_skipped() {
        let steps = vec![ProvisionStep::new(
            "noop",
            "noop",
            FailurePolicy::AbortOnFailure,
            || Ok(StepStatus::Unchanged),
        )];

        let report = run(plan_of(steps), &AuditLog::disabled()).unwrap();
        assert_eq!(report.skipped, vec!["noop"]);
        assert!(report.completed.is_empty());
        assert!(report.is_clean());
    }
}
