//! Platform detection and the closed set of provisioning profiles.

pub mod profiles;
pub mod release;

pub use profiles::{ProfileRegistry, ProvisionProfile};
pub use release::{Platform, OsRelease};
