/// Idempotent boot-time cron registration.
///
/// Entries are keyed by a marker substring (the script name): an entry is
/// inserted only when no existing line carries its marker, so re-running
/// the provisioner never duplicates entries. The merge itself is pure text
/// manipulation; reading and writing the user's crontab goes through the
/// `crontab` binary.
use crate::config::types::{DeployConfig, DeployError, Result};
use crate::provision::step::StepStatus;
use std::io::Write;
use std::process::{Command, Stdio};

/// Installed path of the supervisor binary referenced from cron.
const LAUNCHER_PATH: &str = "/usr/local/bin/cubotino-launch";

/// One boot-time crontab line with its identity marker.
#[derive(Clone, Debug)]
pub struct CronEntry {
    pub line: String,
    /// Substring that identifies this entry in an existing crontab
    pub marker: String,
}

/// The boot-time entries the provisioner registers.
///
/// The supervisor entry is inserted commented out: a fresh install must not
/// auto-start (and potentially power off) an unvalidated deployment. The
/// operator uncomments it once the robot has been exercised by hand.
pub fn boot_entries(config: &DeployConfig) -> Vec<CronEntry> {
    vec![
        CronEntry {
            line: format!(
                "@reboot su - {} -c '/usr/bin/vncserver :1 -geometry 1280x720'",
                config.deploy_user
            ),
            marker: "vncserver".to_string(),
        },
        CronEntry {
            line: format!(
                "# @reboot sleep 5; {} supervise >> {} 2>&1",
                LAUNCHER_PATH,
                config.session_log.display()
            ),
            marker: "cubotino-launch".to_string(),
        },
    ]
}

/// Merge entries into existing crontab text. Returns the merged text and
/// how many entries were actually added.
pub fn merge_entries(existing: &str, entries: &[CronEntry]) -> (String, usize) {
    let mut out: Vec<String> = existing.lines().map(str::to_string).collect();
    let mut added = 0;

    for entry in entries {
        let present = out.iter().any(|line| line.contains(&entry.marker));
        if present {
            log::info!("cron entry '{}' already registered", entry.marker);
        } else {
            out.push(entry.line.clone());
            added += 1;
        }
    }

    if out.is_empty() {
        return (String::new(), added);
    }
    let mut text = out.join("\n");
    text.push('\n');
    (text, added)
}

/// Read a user's crontab. An absent crontab is an empty one, not an error.
pub fn read_user_crontab(user: &str) -> Result<String> {
    let output = Command::new("crontab")
        .args(["-l", "-u", user])
        .output()
        .map_err(|e| DeployError::Process(format!("crontab -l: failed to start: {}", e)))?;

    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).to_string());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("no crontab") {
        Ok(String::new())
    } else {
        Err(DeployError::Process(format!(
            "crontab -l -u {} failed: {}",
            user,
            stderr.trim()
        )))
    }
}

/// Replace a user's crontab with `content` via `crontab -u <user> -`.
pub fn write_user_crontab(user: &str, content: &str) -> Result<()> {
    let mut child = Command::new("crontab")
        .args(["-u", user, "-"])
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| DeployError::Process(format!("crontab -: failed to start: {}", e)))?;

    child
        .stdin
        .take()
        .ok_or_else(|| DeployError::Process("crontab -: no stdin".into()))?
        .write_all(content.as_bytes())?;

    let status = child
        .wait()
        .map_err(|e| DeployError::Process(format!("crontab -: wait failed: {}", e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(DeployError::Process(format!(
            "crontab -u {} - exited with {:?}",
            user,
            status.code()
        )))
    }
}

/// Register the boot-time entries in the deploy user's crontab.
pub fn register_boot_entries(config: &DeployConfig) -> Result<StepStatus> {
    let existing = read_user_crontab(&config.deploy_user)?;
    let (merged, added) = merge_entries(&existing, &boot_entries(config));

    if added == 0 {
        return Ok(StepStatus::Unchanged);
    }
    write_user_crontab(&config.deploy_user, &merged)?;
    Ok(StepStatus::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_marker(text: &str, marker: &str) -> usize {
        text.lines().filter(|l| l.contains(marker)).count()
    }

    #[test]
    fn entries_are_added_to_an_empty_crontab() {
        let entries = boot_entries(&DeployConfig::default());
        let (merged, added) = merge_entries("", &entries);

        assert_eq!(added, 2);
        assert_eq!(count_marker(&merged, "vncserver"), 1);
        assert_eq!(count_marker(&merged, "cubotino-launch"), 1);
    }

    #[test]
    fn reregistration_adds_nothing() {
        let entries = boot_entries(&DeployConfig::default());
        let (first, _) = merge_entries("", &entries);
        let (second, added) = merge_entries(&first, &entries);

        assert_eq!(added, 0);
        assert_eq!(second, first);
        assert_eq!(count_marker(&second, "vncserver"), 1);
    }

    #[test]
    fn unrelated_entries_survive_the_merge() {
        let existing = "0 3 * * * /usr/local/bin/backup.sh\n";
        let (merged, added) = merge_entries(existing, &boot_entries(&DeployConfig::default()));

        assert_eq!(added, 2);
        assert!(merged.contains("backup.sh"));
    }

    #[test]
    fn marker_match_is_substring_based() {
        // A hand-edited variant of the entry still counts as registered.
        let existing = "@reboot su - pi -c '/usr/bin/vncserver :0'\n";
        let (merged, added) = merge_entries(existing, &boot_entries(&DeployConfig::default()));

        assert_eq!(added, 1, "only the supervisor entry is missing");
        assert_eq!(count_marker(&merged, "vncserver"), 1);
    }

    #[test]
    fn supervisor_entry_is_commented_out_by_default() {
        let entries = boot_entries(&DeployConfig::default());
        let supervisor = entries
            .iter()
            .find(|e| e.marker == "cubotino-launch")
            .unwrap();
        assert!(supervisor.line.starts_with("# "));
        assert!(supervisor.line.contains("Cubotino_T_terminal.log"));
    }
}
