//! Observability: structured audit trail of provisioning and supervision.

pub mod audit;

pub use audit::{AuditLog, DeployEventType};
