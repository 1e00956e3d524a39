/// Deployment audit trail.
///
/// Every provisioning step outcome and every supervised run is appended as
/// one JSON line, correlated by a per-run id. The trail is an operator
/// convenience: failing to open it degrades to log-only operation and
/// never aborts a run.
use log::warn;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use uuid::Uuid;

/// Event types recorded in the audit trail.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum DeployEventType {
    // Provisioner lifecycle
    ProvisionStart,
    StepStarted,
    StepCompleted,
    StepSkipped,
    StepFailed,
    ProvisionEnd,

    // Supervisor lifecycle
    SupervisorLaunch,
    ChildExited,
    PowerOffRequested,
}

#[derive(Debug, Serialize)]
struct DeployEvent<'a> {
    event_type: DeployEventType,
    timestamp: SystemTime,
    run_id: &'a str,
    details: &'a str,
}

/// Append-only JSON-lines audit sink with a per-run correlation id.
pub struct AuditLog {
    run_id: String,
    sink: Option<Mutex<File>>,
}

impl AuditLog {
    /// Open (or create) the audit file. On failure the log degrades to a
    /// disabled sink with a warning.
    pub fn open(path: &Path) -> Self {
        let run_id = Uuid::new_v4().to_string();

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("cannot create audit directory {}: {}", parent.display(), e);
                return Self { run_id, sink: None };
            }
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                run_id,
                sink: Some(Mutex::new(file)),
            },
            Err(e) => {
                warn!("cannot open audit log {}: {}", path.display(), e);
                Self { run_id, sink: None }
            }
        }
    }

    /// An audit log that records nothing. Used by tests and by degraded runs.
    pub fn disabled() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            sink: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record one event. Serialization or write failures are warned about,
    /// never propagated.
    pub fn record(&self, event_type: DeployEventType, details: impl AsRef<str>) {
        let Some(sink) = &self.sink else { return };

        let event = DeployEvent {
            event_type,
            timestamp: SystemTime::now(),
            run_id: &self.run_id,
            details: details.as_ref(),
        };

        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to serialize audit event: {}", e);
                return;
            }
        };

        let mut file = match sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            warn!("failed to append audit event: {}", e);
        }
    }
}
