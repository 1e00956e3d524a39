//! cubotino-deploy: deployment and boot-lifecycle toolkit for the CUBOTino solver robot
//!
//! Two roles share this crate:
//!
//! - the **provisioner** (`cubotino-setup`) runs once, as root, on a fresh
//!   Raspberry Pi OS image and brings it to a state capable of hosting the
//!   main control program;
//! - the **supervisor** (`cubotino-launch`) runs at every boot, launches the
//!   main control program, waits for it to terminate and reacts to its exit
//!   status.
//!
//! # Architecture
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: deploy configuration, error taxonomy, shared `Result`
//! - [`config::validator`]: structural sanity checks before either role runs
//!
//! ## Platform ([`platform`])
//! - [`platform::release`]: OS release and CPU architecture detection
//! - [`platform::profiles`]: closed set of named provisioning profiles
//!
//! ## Provisioning ([`provision`])
//! - [`provision::plan`]: ordered, policy-tagged step list with a fingerprint
//! - [`provision::runner`]: generic step executor enforcing failure policies
//! - [`provision::boot_config`]: structured boot-directive rewriting
//! - [`provision::crontab`]: idempotent boot-time cron registration
//! - [`provision::swap`]: swap-size threshold enforcement
//! - [`provision::packages`], [`provision::pyenv`], [`provision::services`]:
//!   OS package set, pinned virtual environment, service enablement
//!
//! ## Supervision ([`supervise`])
//! - [`supervise::outcome`]: exit-status classification (the three terminal states)
//! - [`supervise::launcher`]: child launch, indefinite wait, power-off decision
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: structured JSON-lines audit trail
//!
//! # Design Principles
//!
//! 1. **Idempotence over rollback** - every mutating step converges on rerun;
//!    recovery from a partial run is simply running again
//! 2. **Policies are explicit** - each step carries its own failure policy,
//!    enforced by one runner, never by positional script state
//! 3. **Pure classification** - the supervisor's decision is a total function
//!    over the child's wait status
//! 4. **Profiles, not branches** - OS-version behavior is selected once by
//!    lookup, not re-tested at every step

// Configuration & errors
pub mod config;

// Platform detection and provisioning profiles
pub mod platform;

// Provisioning step engine and steps
pub mod provision;

// Boot-time supervision
pub mod supervise;

// Observability
pub mod observability;

// CLI entrypoint wiring shared by the setup/launch binaries.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
