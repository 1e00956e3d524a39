/// Plan construction: the ordered, policy-tagged step list for one run.
///
/// The plan is fingerprinted (profile id + step names + pinned set) and the
/// fingerprint recorded in the audit trail, so consumers can detect plan
/// drift between provisioning runs.
use crate::config::types::DeployConfig;
use crate::platform::profiles::ProvisionProfile;
use crate::platform::release::Platform;
use crate::provision::policy::FailurePolicy;
use crate::provision::step::{ProvisionStep, StepStatus};
use crate::provision::{boot_config, crontab, packages, pyenv, services, swap};
use sha2::{Digest, Sha256};

pub struct ProvisionPlan {
    pub steps: Vec<ProvisionStep>,
    /// SHA256 over profile id, step names and the pinned requirement set
    pub fingerprint: String,
    pub profile_id: Option<String>,
}

/// Build the provisioning plan for the detected platform.
///
/// Profile-specific steps are only planned when a profile was selected;
/// for unsupported releases the caller has already warned and the generic
/// steps still run.
pub fn build(
    config: &DeployConfig,
    platform: &Platform,
    profile: Option<&ProvisionProfile>,
) -> ProvisionPlan {
    let mut steps = Vec::new();

    steps.push(ProvisionStep::new(
        "disable-autologin",
        "Disable graphical auto-login",
        FailurePolicy::AbortOnFailure,
        || {
            services::disable_graphical_autologin()?;
            Ok(StepStatus::Changed)
        },
    ));

    {
        let path = config.swap_config_path.clone();
        let min_mb = config.swap_min_mb;
        steps.push(ProvisionStep::new(
            "ensure-swap",
            format!("Ensure swap size is at least {} MB", min_mb),
            FailurePolicy::AbortOnFailure,
            move || swap::ensure_swap(&path, min_mb),
        ));
    }

    {
        let path = config.boot_config_path.clone();
        steps.push(ProvisionStep::new(
            "boot-config",
            "Rewrite boot configuration directives (SPI, UART)",
            FailurePolicy::AbortOnFailure,
            move || boot_config::apply(&path, &boot_config::managed_directives()),
        ));
    }

    steps.push(ProvisionStep::new(
        "apt-update",
        "Update package index and upgrade installed packages",
        FailurePolicy::AbortOnFailure,
        || {
            packages::update_and_upgrade()?;
            Ok(StepStatus::Changed)
        },
    ));

    steps.push(ProvisionStep::new(
        "base-packages",
        "Install base OS packages",
        FailurePolicy::AbortOnFailure,
        || packages::install(&packages::base_packages()),
    ));

    if let Some(profile) = profile {
        {
            let superseded = profile.superseded_packages.clone();
            steps.push(ProvisionStep::new(
                "remove-superseded",
                "Remove superseded OS packages",
                FailurePolicy::AbortOnFailure,
                move || packages::remove(&superseded),
            ));
        }

        {
            let os_packages = profile.os_packages.clone();
            steps.push(ProvisionStep::new(
                "profile-packages",
                format!("Install OS packages for profile {}", profile.id),
                FailurePolicy::AbortOnFailure,
                move || packages::install(&os_packages),
            ));
        }
    }

    {
        let venv = config.venv_dir.clone();
        steps.push(ProvisionStep::new(
            "create-venv",
            "Create python virtual environment",
            FailurePolicy::AbortOnFailure,
            move || pyenv::create_venv(&venv),
        ));
    }

    if let Some(profile) = profile {
        let venv = config.venv_dir.clone();
        let requirements = profile.pinned_requirements(platform);
        steps.push(ProvisionStep::new(
            "python-libraries",
            "Install pinned python libraries into the environment",
            FailurePolicy::AbortOnFailure,
            move || pyenv::install_libraries(&venv, &requirements),
        ));
    }

    steps.push(ProvisionStep::new(
        "enable-gpio-daemon",
        "Enable and start the GPIO daemon",
        FailurePolicy::AbortOnFailure,
        || {
            services::enable_now(services::GPIO_DAEMON_UNIT)?;
            Ok(StepStatus::Changed)
        },
    ));

    steps.push(ProvisionStep::new(
        "enable-vnc",
        "Enable the remote-desktop service (best effort)",
        FailurePolicy::ContinueOnFailure,
        || {
            services::enable_on_boot(services::VNC_UNIT)?;
            Ok(StepStatus::Changed)
        },
    ));

    {
        let cfg = config.clone();
        steps.push(ProvisionStep::new(
            "register-cron",
            "Register boot-time cron entries (best effort)",
            FailurePolicy::ContinueOnFailure,
            move || crontab::register_boot_entries(&cfg),
        ));
    }

    let fingerprint = fingerprint(&steps, platform, profile);
    ProvisionPlan {
        steps,
        fingerprint,
        profile_id: profile.map(|p| p.id.clone()),
    }
}

fn fingerprint(
    steps: &[ProvisionStep],
    platform: &Platform,
    profile: Option<&ProvisionProfile>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("cubotino-deploy-{}", env!("CARGO_PKG_VERSION")));
    hasher.update(&platform.machine);

    for step in steps {
        hasher.update(step.name);
        hasher.update([match step.policy {
            FailurePolicy::AbortOnFailure => 0u8,
            FailurePolicy::ContinueOnFailure => 1u8,
        }]);
    }

    if let Some(profile) = profile {
        hasher.update(&profile.id);
        for req in profile.pinned_requirements(platform) {
            hasher.update(&req);
        }
    }

    format!("{:x}", hasher.finalize())
}
