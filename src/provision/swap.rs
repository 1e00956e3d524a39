/// Swap-size threshold enforcement.
///
/// The pinned opencv build needs more swap than a stock image carries on the
/// smaller boards. The provisioner only ever raises the size: a system whose
/// swap already meets the threshold is left untouched.
use crate::config::types::{DeployError, Result};
use crate::provision::step::StepStatus;
use crate::provision::{run_checked, services};
use std::path::Path;

const SWAP_SIZE_KEY: &str = "CONF_SWAPSIZE";

/// Current configured swap size in MB, from dphys-swapfile configuration
/// text. Commented lines do not count.
pub fn parse_swap_mb(text: &str) -> Option<u64> {
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix(SWAP_SIZE_KEY) {
            if let Some(value) = value.strip_prefix('=') {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Rewrite the swap configuration to carry exactly one uncommented
/// `CONF_SWAPSIZE=<mb>` line, preserving everything else.
pub fn rewrite_swap_size(text: &str, mb: u64) -> String {
    let mut out = Vec::new();
    let mut written = false;

    for line in text.lines() {
        let trimmed = line.trim();
        let is_size_line =
            !trimmed.starts_with('#') && trimmed.starts_with(SWAP_SIZE_KEY) && {
                trimmed[SWAP_SIZE_KEY.len()..].trim_start().starts_with('=')
            };
        if is_size_line {
            if !written {
                out.push(format!("{}={}", SWAP_SIZE_KEY, mb));
                written = true;
            }
            // further occurrences are dropped
        } else {
            out.push(line.to_string());
        }
    }

    if !written {
        out.push(format!("{}={}", SWAP_SIZE_KEY, mb));
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// Apply the threshold to the swap configuration file only. No service
/// restart; [`ensure_swap`] layers that on top.
pub fn apply_swap_file(path: &Path, min_mb: u64) -> Result<StepStatus> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DeployError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;

    if let Some(current) = parse_swap_mb(&text) {
        if current >= min_mb {
            log::info!(
                "swap already {} MB (threshold {} MB), leaving {} untouched",
                current,
                min_mb,
                path.display()
            );
            return Ok(StepStatus::Unchanged);
        }
    }

    std::fs::write(path, rewrite_swap_size(&text, min_mb))?;
    Ok(StepStatus::Changed)
}

/// Ensure swap meets the threshold; when the file was rewritten, restart
/// the swap service so the new size takes effect.
pub fn ensure_swap(path: &Path, min_mb: u64) -> Result<StepStatus> {
    let status = apply_swap_file(path, min_mb)?;
    if status == StepStatus::Changed {
        run_checked(
            &mut services::systemctl(&["restart", "dphys-swapfile"]),
            "restart dphys-swapfile",
        )?;
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STOCK: &str = "# /etc/dphys-swapfile\n#CONF_SWAPSIZE=\nCONF_SWAPSIZE=100\nCONF_MAXSWAP=2048\n";

    #[test]
    fn parses_uncommented_size_only() {
        assert_eq!(parse_swap_mb(STOCK), Some(100));
        assert_eq!(parse_swap_mb("#CONF_SWAPSIZE=100\n"), None);
        assert_eq!(parse_swap_mb("CONF_MAXSWAP=2048\n"), None);
    }

    #[test]
    fn rewrite_replaces_in_place_and_keeps_other_lines() {
        let out = rewrite_swap_size(STOCK, 512);
        assert_eq!(parse_swap_mb(&out), Some(512));
        assert!(out.contains("CONF_MAXSWAP=2048"));
        assert!(out.contains("#CONF_SWAPSIZE="), "comments are preserved");
        assert_eq!(out.matches("\nCONF_SWAPSIZE=").count() + usize::from(out.starts_with("CONF_SWAPSIZE=")), 1);
    }

    #[test]
    fn rewrite_appends_when_no_size_line_exists() {
        let out = rewrite_swap_size("# empty file\n", 512);
        assert_eq!(parse_swap_mb(&out), Some(512));
    }

    #[test]
    fn swap_at_or_above_threshold_is_not_mutated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CONF_SWAPSIZE=1024\n").unwrap();

        let status = apply_swap_file(file.path(), 512).unwrap();
        assert_eq!(status, StepStatus::Unchanged);
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text, "CONF_SWAPSIZE=1024\n");
    }

    #[test]
    fn swap_below_threshold_is_raised() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CONF_SWAPSIZE=100\n").unwrap();

        let status = apply_swap_file(file.path(), 512).unwrap();
        assert_eq!(status, StepStatus::Changed);
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(parse_swap_mb(&text), Some(512));
    }

    #[test]
    fn second_apply_is_a_no_op() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CONF_SWAPSIZE=100\n").unwrap();

        assert_eq!(apply_swap_file(file.path(), 512).unwrap(), StepStatus::Changed);
        assert_eq!(
            apply_swap_file(file.path(), 512).unwrap(),
            StepStatus::Unchanged
        );
    }
}
