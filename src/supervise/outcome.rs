/// Exit-status classification: the supervisor's entire decision logic.
///
/// The classifier is a pure, total function over the child's wait status.
/// Exactly one of three terminal states results, and only the clean exit is
/// eligible for power-off.
use std::process::ExitStatus;

/// Exit code the main control program uses to signal termination on
/// explicit user request. Shared constant: the convention between the two
/// programs lives here and nowhere else.
pub const REQUESTED_EXIT_CODE: i32 = 2;

/// Terminal states of one supervised run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exit code 0: clean termination, eligible for power-off.
    CleanExit,
    /// Exit code [`REQUESTED_EXIT_CODE`]: deliberate user-requested stop.
    RequestedExit,
    /// Any other termination, with what is known about it.
    ErrorExit {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

impl ExitOutcome {
    /// Only a clean exit may power off the machine.
    pub fn power_off_eligible(&self) -> bool {
        matches!(self, ExitOutcome::CleanExit)
    }

    /// The status line written to the session log.
    pub fn status_message(&self) -> String {
        match self {
            ExitOutcome::CleanExit => "Successfully executed".to_string(),
            ExitOutcome::RequestedExit => "Exited on request".to_string(),
            ExitOutcome::ErrorExit {
                code: Some(code), ..
            } => format!("Exited with error (exit code {})", code),
            ExitOutcome::ErrorExit {
                signal: Some(signal),
                ..
            } => format!("Exited with error (signal {})", signal),
            ExitOutcome::ErrorExit { .. } => "Exited with error".to_string(),
        }
    }
}

/// Classify a wait status into its terminal state.
pub fn classify(status: ExitStatus) -> ExitOutcome {
    use std::os::unix::process::ExitStatusExt;
    classify_raw(status.code(), status.signal())
}

/// Classification over the raw (code, signal) pair. Split out so the
/// mapping is testable without spawning processes.
pub fn classify_raw(code: Option<i32>, signal: Option<i32>) -> ExitOutcome {
    match code {
        Some(0) => ExitOutcome::CleanExit,
        Some(REQUESTED_EXIT_CODE) => ExitOutcome::RequestedExit,
        _ => ExitOutcome::ErrorExit { code, signal },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_clean_and_power_off_eligible() {
        let outcome = classify_raw(Some(0), None);
        assert_eq!(outcome, ExitOutcome::CleanExit);
        assert!(outcome.power_off_eligible());
        assert_eq!(outcome.status_message(), "Successfully executed");
    }

    #[test]
    fn reserved_code_is_a_requested_exit_without_power_off() {
        let outcome = classify_raw(Some(REQUESTED_EXIT_CODE), None);
        assert_eq!(outcome, ExitOutcome::RequestedExit);
        assert!(!outcome.power_off_eligible());
        assert_eq!(outcome.status_message(), "Exited on request");
    }

    #[test]
    fn any_other_code_is_an_error_exit() {
        for code in [1, 3, 7, 127, 255, -1] {
            let outcome = classify_raw(Some(code), None);
            assert!(
                matches!(outcome, ExitOutcome::ErrorExit { code: Some(c), .. } if c == code),
                "code {} must classify as error",
                code
            );
            assert!(!outcome.power_off_eligible());
        }
        assert_eq!(
            classify_raw(Some(7), None).status_message(),
            "Exited with error (exit code 7)"
        );
    }

    #[test]
    fn signal_termination_is_an_error_exit_carrying_the_signal() {
        let outcome = classify_raw(None, Some(9));
        assert_eq!(
            outcome,
            ExitOutcome::ErrorExit {
                code: None,
                signal: Some(9)
            }
        );
        assert_eq!(outcome.status_message(), "Exited with error (signal 9)");
    }

    #[test]
    fn mapping_is_total_and_branches_are_mutually_exclusive() {
        for code in -300..300 {
            let outcome = classify_raw(Some(code), None);
            let expected = match code {
                0 => ExitOutcome::CleanExit,
                REQUESTED_EXIT_CODE => ExitOutcome::RequestedExit,
                _ => ExitOutcome::ErrorExit {
                    code: Some(code),
                    signal: None,
                },
            };
            assert_eq!(outcome, expected);
        }
        // No code at all (signal or unknown) still classifies.
        assert!(matches!(
            classify_raw(None, None),
            ExitOutcome::ErrorExit { .. }
        ));
    }
}
