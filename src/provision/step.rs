/// One provisioning step: a name, an operator-facing title, a failure
/// policy and the action itself.
use crate::config::types::Result;
use crate::provision::policy::FailurePolicy;

/// What a step's action did to the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// The step mutated the system.
    Changed,
    /// The desired state already held; nothing was written.
    Unchanged,
}

type StepAction = Box<dyn FnOnce() -> Result<StepStatus>>;

pub struct ProvisionStep {
    /// Stable machine name, used in audit events and reports
    pub name: &'static str,
    /// Operator-facing header printed before the step runs
    pub title: String,
    pub policy: FailurePolicy,
    action: StepAction,
}

impl ProvisionStep {
    pub fn new(
        name: &'static str,
        title: impl Into<String>,
        policy: FailurePolicy,
        action: impl FnOnce() -> Result<StepStatus> + 'static,
    ) -> Self {
        ProvisionStep {
            name,
            title: title.into(),
            policy,
            action: Box::new(action),
        }
    }

    /// Consume the step and run its action.
    pub fn run(self) -> Result<StepStatus> {
        (self.action)()
    }
}

impl std::fmt::Debug for ProvisionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionStep")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}
