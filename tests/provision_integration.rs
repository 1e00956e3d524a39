//! Integration tests for the provisioner's idempotence laws.
//!
//! Everything here runs unprivileged: system mutation is exercised at the
//! file and planning layer against tempfile-backed fixtures.

use cubotino_deploy::config::types::DeployConfig;
use cubotino_deploy::platform::profiles::ProfileRegistry;
use cubotino_deploy::platform::release::{OsRelease, Platform};
use cubotino_deploy::provision::step::StepStatus;
use cubotino_deploy::provision::{boot_config, crontab, plan, swap};
use std::io::Write;

fn platform(release: OsRelease, machine: &str) -> Platform {
    Platform {
        release,
        machine: machine.to_string(),
        pretty_name: "test platform".to_string(),
    }
}

#[test]
fn boot_config_rewrite_converges_regardless_of_prior_occurrences() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "dtparam=audio=on\n\
         dtparam=spi=off\n\
         #dtparam=spi=on\n\
         dtparam=spi=on\n\
         enable_uart=0\n\
         # enable_uart=1\n\
         gpu_mem=128\n"
    )
    .unwrap();

    let directives = boot_config::managed_directives();

    // First run converges and reports a mutation.
    assert_eq!(
        boot_config::apply(file.path(), &directives).unwrap(),
        StepStatus::Changed
    );
    let text = std::fs::read_to_string(file.path()).unwrap();
    for directive in &directives {
        let count = text.lines().filter(|l| *l == directive.line()).count();
        assert_eq!(count, 1, "{} must occur exactly once", directive.key);
    }
    assert!(text.contains("gpu_mem=128"), "unmanaged directives survive");

    // Second run finds nothing to do and leaves the file byte-identical.
    assert_eq!(
        boot_config::apply(file.path(), &directives).unwrap(),
        StepStatus::Unchanged
    );
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), text);
}

#[test]
fn swap_above_threshold_performs_no_mutation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "# dphys-swapfile config\nCONF_SWAPSIZE=2048\n").unwrap();
    let before = std::fs::read_to_string(file.path()).unwrap();

    let status = swap::apply_swap_file(file.path(), 512).unwrap();

    assert_eq!(status, StepStatus::Unchanged);
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), before);
}

#[test]
fn swap_below_threshold_is_raised_exactly_once() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "CONF_SWAPSIZE=100\nCONF_MAXSWAP=2048\n").unwrap();

    assert_eq!(swap::apply_swap_file(file.path(), 512).unwrap(), StepStatus::Changed);
    assert_eq!(
        swap::apply_swap_file(file.path(), 512).unwrap(),
        StepStatus::Unchanged
    );

    let text = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(swap::parse_swap_mb(&text), Some(512));
    assert!(text.contains("CONF_MAXSWAP=2048"));
}

#[test]
fn cron_registration_never_duplicates_the_startup_entry() {
    let config = DeployConfig::default();
    let entries = crontab::boot_entries(&config);

    // Simulate three provisioning runs over the same crontab.
    let (after_one, added_one) = crontab::merge_entries("", &entries);
    let (after_two, added_two) = crontab::merge_entries(&after_one, &entries);
    let (after_three, added_three) = crontab::merge_entries(&after_two, &entries);

    assert_eq!(added_one, entries.len());
    assert_eq!(added_two, 0);
    assert_eq!(added_three, 0);
    assert_eq!(after_three, after_one);

    let launcher_lines = after_three
        .lines()
        .filter(|l| l.contains("cubotino-launch"))
        .count();
    assert_eq!(launcher_lines, 1);
}

#[test]
fn profile_selection_drives_the_planned_python_set() {
    let registry = ProfileRegistry::new();
    let config = DeployConfig::default();

    let bullseye = platform(OsRelease::Bullseye, "armv7l");
    let plan = plan::build(&config, &bullseye, registry.select(&bullseye.release));
    assert_eq!(plan.profile_id.as_deref(), Some("bullseye-v1"));
    assert!(plan.steps.iter().any(|s| s.name == "python-libraries"));

    let unknown = platform(OsRelease::Unsupported("99".into()), "armv7l");
    let plan = plan::build(&config, &unknown, registry.select(&unknown.release));
    assert_eq!(plan.profile_id, None);
    assert!(!plan.steps.iter().any(|s| s.name == "python-libraries"));
}

#[test]
fn plan_fingerprints_differ_between_profiles() {
    let registry = ProfileRegistry::new();
    let config = DeployConfig::default();

    let buster = platform(OsRelease::Buster, "armv7l");
    let bullseye = platform(OsRelease::Bullseye, "armv7l");

    let plan_buster = plan::build(&config, &buster, registry.select(&buster.release));
    let plan_bullseye = plan::build(&config, &bullseye, registry.select(&bullseye.release));

    assert_ne!(plan_buster.fingerprint, plan_bullseye.fingerprint);
}
