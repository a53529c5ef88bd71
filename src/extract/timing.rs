use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One failing path from the timing summary. `allowed` is the period the
/// path would have met, `requirement - slack`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimingViolation {
    pub slack: f64,
    pub source: String,
    pub destination: String,
    pub requirement: f64,
    pub allowed: f64,
}

pub fn parse_str(text: &str) -> Result<Vec<TimingViolation>> {
    let slack_re =
        Regex::new(r"Slack \(VIOLATED\) :\s*(-?[\d.]+)ns").context("compile slack pattern")?;
    let requirement_re =
        Regex::new(r"Requirement:\s*(-?[\d.]+)ns").context("compile requirement pattern")?;
    let lines: Vec<&str> = text.lines().collect();
    let mut violations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = slack_re.captures(line) {
            let violation = read_path_block(&lines, i, &caps[1], &requirement_re)
                .with_context(|| format!("malformed timing report: path at line {}", i + 1))?;
            violations.push(violation);
        }
    }
    Ok(violations)
}

pub fn parse_file(path: &Path) -> Result<Vec<TimingViolation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read timing report {}", path.display()))?;
    parse_str(&text)
}

// A violated path block keeps its fields at fixed offsets below the slack
// marker: +1 source, +3 destination, +7 requirement.
fn read_path_block(
    lines: &[&str],
    marker: usize,
    slack_text: &str,
    requirement_re: &Regex,
) -> Result<TimingViolation> {
    let slack: f64 = slack_text.parse()?;
    let source = labeled_field(lines, marker + 1, "Source:")?;
    let destination = labeled_field(lines, marker + 3, "Destination:")?;
    let requirement_line = lines
        .get(marker + 7)
        .ok_or_else(|| anyhow!("truncated block"))?;
    let caps = requirement_re
        .captures(requirement_line)
        .ok_or_else(|| anyhow!("no requirement on line {}", marker + 8))?;
    let requirement: f64 = caps[1].parse()?;
    Ok(TimingViolation {
        slack,
        source: source.to_string(),
        destination: destination.to_string(),
        requirement,
        allowed: requirement - slack,
    })
}

fn labeled_field<'a>(lines: &[&'a str], index: usize, label: &str) -> Result<&'a str> {
    let line = lines.get(index).ok_or_else(|| anyhow!("truncated block"))?;
    let rest = line
        .trim_start()
        .strip_prefix(label)
        .ok_or_else(|| anyhow!("expected {label} on line {}", index + 1))?;
    Ok(rest.trim())
}
