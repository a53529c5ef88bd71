use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::error;

pub const RESOURCE_KEYS: &[&str] = &["SLICE", "LUT", "FF", "DSP", "BRAM", "SRL", "URAM"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InstanceTiming {
    pub required: Option<f64>,
    pub achieved: Option<f64>,
}

/// Resource counters and post-synthesis timing of one exported module.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InstanceReport {
    pub resources: BTreeMap<String, Option<u64>>,
    pub timing: InstanceTiming,
}

pub fn parse_str(text: &str) -> Result<InstanceReport> {
    let mut resources = BTreeMap::new();
    for key in RESOURCE_KEYS {
        resources.insert(key.to_string(), scan_counter(text, key)?);
    }
    Ok(InstanceReport {
        resources,
        timing: InstanceTiming {
            required: scan_decimal(text, "CP required")?,
            achieved: scan_decimal(text, "CP achieved post-synthesis")?,
        },
    })
}

pub fn parse_file(path: &Path) -> Result<InstanceReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read export report {}", path.display()))?;
    parse_str(&text)
}

/// Walks one subdirectory per instance under `root`, reading each instance's
/// export report. A missing or unreadable report yields a `None` entry so one
/// bad instance never aborts the batch. Keys are sorted by instance name.
pub fn collect(root: &Path) -> Result<BTreeMap<String, Option<InstanceReport>>> {
    let mut out = BTreeMap::new();
    let entries =
        std::fs::read_dir(root).with_context(|| format!("read_dir {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let report_path = entry
            .path()
            .join("solution/impl/report/verilog")
            .join(format!("{name}_export.rpt"));
        if !report_path.is_file() {
            error!(instance = %name, path = %report_path.display(), "missing export report");
            out.insert(name, None);
            continue;
        }
        match parse_file(&report_path) {
            Ok(report) => {
                out.insert(name, Some(report));
            }
            Err(err) => {
                error!(instance = %name, error = %format!("{err:#}"), "unreadable export report");
                out.insert(name, None);
            }
        }
    }
    Ok(out)
}

fn scan_counter(text: &str, key: &str) -> Result<Option<u64>> {
    let pattern = format!(r"(?m)^\s*{}:\s*(\d+)", regex::escape(key));
    let re = Regex::new(&pattern).context("compile counter pattern")?;
    match re.captures(text) {
        Some(caps) => Ok(Some(caps[1].parse()?)),
        None => Ok(None),
    }
}

fn scan_decimal(text: &str, key: &str) -> Result<Option<f64>> {
    let pattern = format!(r"{}:\s*([\d.]+)", regex::escape(key));
    let re = Regex::new(&pattern).context("compile timing pattern")?;
    match re.captures(text) {
        Some(caps) => Ok(Some(caps[1].parse()?)),
        None => Ok(None),
    }
}
