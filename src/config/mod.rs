//! Configuration loading, shared types and validation.

pub mod types;
pub mod validator;

pub use types::{DeployConfig, DeployError, Result};
