use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level job list file: credentials plus one entry per Jenkins job.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobList {
    pub username: String,
    pub token: String,
    pub jobs: Vec<serde_json::Value>,
}

impl JobList {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read job list {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse job list {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("serialize job list")?;
        std::fs::write(path, raw)
            .with_context(|| format!("write job list {}", path.display()))
    }
}

/// One Jenkins job to herd. `params` carries the build parameters verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobSpec {
    pub name: String,
    pub dir: String,
    pub network: String,
    pub operation: String,
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl JobSpec {
    /// Decodes a single entry. Kept separate from `JobList` deserialization so
    /// one malformed entry can be skipped without dropping the whole list.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).context("decode job entry")
    }
}
