/// Failure policies for provisioning steps.
///
/// Every step carries one of these; the runner enforces them uniformly.

/// Policy controlling what a step failure does to the rest of the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// First failure aborts the remaining sequence. Prior mutations stay
    /// applied; re-running the provisioner is the recovery path.
    AbortOnFailure,
    /// Failure is logged and the sequence continues. Reserved for the
    /// best-effort tail (service and cron registration).
    ContinueOnFailure,
}

impl Default for FailurePolicy {
    /// Returns [`FailurePolicy::AbortOnFailure`].
    fn default() -> Self {
        FailurePolicy::AbortOnFailure
    }
}
