/// Provisioning profiles
///
/// OS-version behavior lives in a closed set of named, versioned profiles
/// selected once at startup by release lookup. Each profile defines the OS
/// package work and the pinned python library set for its release; the only
/// runtime conditional left is the per-architecture wheel override.
use crate::platform::release::{OsRelease, Platform};
use std::collections::HashMap;

/// Library pinned at the version overridden on armv6l, where no prebuilt
/// wheel exists for the default pin.
const ARMV6_OVERRIDE_NAME: &str = "opencv-contrib-python";
const ARMV6_OVERRIDE_PIN: &str = "4.4.0.46";

/// A python library pinned to an exact version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinnedLibrary {
    pub name: String,
    pub version: String,
}

impl PinnedLibrary {
    fn new(name: &str, version: &str) -> Self {
        PinnedLibrary {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// Requirement specifier handed to pip, e.g. `numpy==1.21.4`.
    pub fn requirement(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }
}

/// One release's provisioning recipe.
#[derive(Clone, Debug)]
pub struct ProvisionProfile {
    /// Profile ID, e.g. "bullseye-v1"
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Release this profile applies to
    pub release: OsRelease,
    /// OS packages installed for this release
    pub os_packages: Vec<String>,
    /// Pre-installed packages superseded by the pinned venv copies
    pub superseded_packages: Vec<String>,
    /// Pinned python libraries installed into the virtual environment
    pub python_libraries: Vec<PinnedLibrary>,
}

impl ProvisionProfile {
    /// Requirement specifiers for this platform, with the armv6l wheel
    /// override applied.
    pub fn pinned_requirements(&self, platform: &Platform) -> Vec<String> {
        self.python_libraries
            .iter()
            .map(|lib| {
                if platform.is_armv6() && lib.name == ARMV6_OVERRIDE_NAME {
                    log::info!(
                        "armv6l detected: overriding {} {} -> {}",
                        lib.name,
                        lib.version,
                        ARMV6_OVERRIDE_PIN
                    );
                    format!("{}=={}", ARMV6_OVERRIDE_NAME, ARMV6_OVERRIDE_PIN)
                } else {
                    lib.requirement()
                }
            })
            .collect()
    }
}

/// Profile registry: the closed set of supported releases.
pub struct ProfileRegistry {
    profiles: HashMap<OsRelease, ProvisionProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            profiles: HashMap::new(),
        };
        registry.register_buster_v1();
        registry.register_bullseye_v1();
        registry
    }

    /// Select the profile for a detected release. `None` for unsupported
    /// releases: the caller warns and skips profile-specific steps.
    pub fn select(&self, release: &OsRelease) -> Option<&ProvisionProfile> {
        self.profiles.get(release)
    }

    pub fn profile_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.profiles.values().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids
    }

    fn register_buster_v1(&mut self) {
        self.profiles.insert(
            OsRelease::Buster,
            ProvisionProfile {
                id: "buster-v1".to_string(),
                name: "Raspberry Pi OS Legacy (Debian 10)".to_string(),
                release: OsRelease::Buster,
                os_packages: vec![
                    // Shared-library prerequisites for the opencv wheel on buster
                    "libjasper1".to_string(),
                    "libqtgui4".to_string(),
                    "libqt4-test".to_string(),
                    "libhdf5-dev".to_string(),
                ],
                // The image ships a numpy older than the pinned wheel set tolerates.
                superseded_packages: vec!["python3-numpy".to_string()],
                python_libraries: vec![
                    PinnedLibrary::new("RPi.GPIO", "0.7.0"),
                    PinnedLibrary::new("spidev", "3.5"),
                    PinnedLibrary::new("st7789", "0.0.4"),
                    PinnedLibrary::new("numpy", "1.20.3"),
                    PinnedLibrary::new("picamera", "1.13"),
                    PinnedLibrary::new("opencv-contrib-python", "4.1.0.25"),
                    PinnedLibrary::new("RubikTwoPhase", "1.0.9"),
                    PinnedLibrary::new("getmac", "0.8.2"),
                ],
            },
        );
    }

    fn register_bullseye_v1(&mut self) {
        self.profiles.insert(
            OsRelease::Bullseye,
            ProvisionProfile {
                id: "bullseye-v1".to_string(),
                name: "Raspberry Pi OS (Debian 11)".to_string(),
                release: OsRelease::Bullseye,
                os_packages: vec![
                    "python3-picamera2".to_string(),
                    "libcamera-apps-lite".to_string(),
                ],
                superseded_packages: Vec::new(),
                python_libraries: vec![
                    PinnedLibrary::new("RPi.GPIO", "0.7.1"),
                    PinnedLibrary::new("spidev", "3.6"),
                    PinnedLibrary::new("st7789", "0.0.4"),
                    PinnedLibrary::new("numpy", "1.21.4"),
                    PinnedLibrary::new("opencv-contrib-python", "4.5.5.64"),
                    PinnedLibrary::new("RubikTwoPhase", "1.1.1"),
                    PinnedLibrary::new("getmac", "0.8.3"),
                ],
            },
        );
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
