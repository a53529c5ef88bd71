use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the Vivado utilization table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ResourceRow {
    pub used: u64,
    pub available: u64,
    pub util: f64,
}

/// Post-implementation resource usage of the whole network. Every key is
/// emitted even when the report had no matching row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Utilization {
    #[serde(rename = "LUTS")]
    pub luts: Option<ResourceRow>,
    #[serde(rename = "FF")]
    pub ff: Option<ResourceRow>,
    #[serde(rename = "BRAM")]
    pub bram: Option<ResourceRow>,
    #[serde(rename = "DSP")]
    pub dsp: Option<ResourceRow>,
}

pub fn parse_str(text: &str) -> Result<Utilization> {
    Ok(Utilization {
        luts: scan_row(text, "CLB LUTs*")?,
        ff: scan_row(text, "CLB Registers")?,
        bram: scan_row(text, "Block RAM Tile")?,
        dsp: scan_row(text, "DSPs")?,
    })
}

pub fn parse_file(path: &Path) -> Result<Utilization> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read utilization report {}", path.display()))?;
    parse_str(&text)
}

// The table repeats per hierarchy level; the summary row for the full design
// comes last, so the last match wins.
fn scan_row(text: &str, site_type: &str) -> Result<Option<ResourceRow>> {
    let pattern = format!(
        r"^\|?\s*{}\s*\|\s*(\d+)\s*\|\s*[\d.]+\s*\|\s*(\d+)\s*\|\s*([\d.]+)",
        regex::escape(site_type)
    );
    let re = Regex::new(&pattern).context("compile utilization row pattern")?;
    let mut row = None;
    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            row = Some(ResourceRow {
                used: caps[1].parse()?,
                available: caps[2].parse()?,
                util: caps[3].parse()?,
            });
        }
    }
    Ok(row)
}
