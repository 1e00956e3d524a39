/// Structured rewriting of boot configuration directives.
///
/// The managed directives enable the SPI bus (display) and the UART. The
/// rewrite is a read-modify-write over parsed lines, not a pattern
/// deletion: every line carrying a managed key (commented or not) is
/// dropped, then the desired line is appended once, so repeated runs
/// converge to exactly one occurrence of each directive.
use crate::config::types::{DeployError, Result};
use crate::provision::step::StepStatus;
use std::path::Path;

/// One managed `key=value` boot directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Everything left of the final `=`, e.g. `dtparam=spi`
    pub key: String,
    pub value: String,
}

impl Directive {
    pub fn new(key: &str, value: &str) -> Self {
        Directive {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// The literal line written into the boot configuration.
    pub fn line(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// The directives the provisioner owns.
pub fn managed_directives() -> Vec<Directive> {
    vec![
        // SPI bus for the ST7789 display
        Directive::new("dtparam=spi", "on"),
        // UART feeds the optional serial console used during bring-up
        Directive::new("enable_uart", "1"),
    ]
}

/// True when `line` is an occurrence of `key` (assignment to the managed
/// key, possibly commented out).
fn mentions_key(line: &str, key: &str) -> bool {
    let mut content = line.trim();
    while let Some(rest) = content.strip_prefix('#') {
        content = rest.trim_start();
    }
    match content.strip_prefix(key) {
        Some(rest) => rest.trim_start().starts_with('='),
        None => false,
    }
}

/// Rewrite boot configuration text so each directive occurs exactly once.
pub fn rewrite(text: &str, directives: &[Directive]) -> String {
    let mut out: Vec<String> = text
        .lines()
        .filter(|line| !directives.iter().any(|d| mentions_key(line, &d.key)))
        .map(str::to_string)
        .collect();

    for directive in directives {
        out.push(directive.line());
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// Apply the managed directives to the boot configuration file. Writes only
/// when the rewritten text differs from what is on disk.
pub fn apply(path: &Path, directives: &[Directive]) -> Result<StepStatus> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DeployError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;

    let rewritten = rewrite(&text, directives);
    if rewritten == text {
        return Ok(StepStatus::Unchanged);
    }

    std::fs::write(path, rewritten)?;
    Ok(StepStatus::Changed)
}
