/// OS release and CPU architecture detection.
///
/// The provisioner branches exactly once, on the release detected here; the
/// machine string feeds the per-architecture overrides in the profiles.
use crate::config::types::{DeployError, Result};

const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Raspberry Pi OS releases the provisioner knows about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OsRelease {
    /// Debian 10 based image ("Legacy")
    Buster,
    /// Debian 11 based image
    Bullseye,
    /// Anything else: profile-specific steps are skipped with a warning.
    Unsupported(String),
}

impl OsRelease {
    pub fn from_version_id(version_id: &str) -> Self {
        match version_id.trim() {
            "10" => OsRelease::Buster,
            "11" => OsRelease::Bullseye,
            other => OsRelease::Unsupported(other.to_string()),
        }
    }
}

impl std::fmt::Display for OsRelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsRelease::Buster => write!(f, "buster (Debian 10)"),
            OsRelease::Bullseye => write!(f, "bullseye (Debian 11)"),
            OsRelease::Unsupported(v) => write!(f, "unsupported (VERSION_ID={})", v),
        }
    }
}

/// Detected host platform.
#[derive(Clone, Debug)]
pub struct Platform {
    pub release: OsRelease,
    /// `uname -m` machine string, e.g. "armv6l", "armv7l", "aarch64"
    pub machine: String,
    /// PRETTY_NAME from os-release, for operator-facing output
    pub pretty_name: String,
}

impl Platform {
    /// Pi Zero / Pi 1 class hardware, which lacks prebuilt wheels for some
    /// pinned python libraries.
    pub fn is_armv6(&self) -> bool {
        self.machine == "armv6l"
    }
}

/// Detect the host platform from `/etc/os-release` and `uname`.
pub fn detect() -> Result<Platform> {
    let text = std::fs::read_to_string(OS_RELEASE_PATH).map_err(|e| {
        DeployError::Platform(format!("cannot read {}: {}", OS_RELEASE_PATH, e))
    })?;

    let uts = nix::sys::utsname::uname()
        .map_err(|e| DeployError::Platform(format!("uname failed: {}", e)))?;
    let machine = uts.machine().to_string_lossy().to_string();

    Ok(from_os_release(&text, machine))
}

/// Build a [`Platform`] from os-release text and a machine string.
/// Split out from [`detect`] so the parsing stays testable off-target.
pub fn from_os_release(text: &str, machine: String) -> Platform {
    let version_id = os_release_field(text, "VERSION_ID").unwrap_or_default();
    let pretty_name =
        os_release_field(text, "PRETTY_NAME").unwrap_or_else(|| "unknown".to_string());

    Platform {
        release: OsRelease::from_version_id(&version_id),
        machine,
        pretty_name,
    }
}

/// Extract one `KEY=value` field from os-release text, stripping quotes.
fn os_release_field(text: &str, key: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(key) {
            if let Some(value) = rest.strip_prefix('=') {
                return Some(value.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}
