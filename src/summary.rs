use crate::config::JobSpec;
use crate::extract::instance::InstanceReport;
use crate::extract::profile::NetworkProfile;
use crate::extract::timing::TimingViolation;
use crate::extract::utilization::Utilization;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Network-level synthesis results. Both fields stay `null` when the
/// corresponding report could not be read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NetworkSynthesis {
    pub utilization: Option<Utilization>,
    pub timing: Option<Vec<TimingViolation>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SynthesisSummary {
    pub network_synth: NetworkSynthesis,
    pub instance_synth: Option<BTreeMap<String, Option<InstanceReport>>>,
}

/// Profile extracted from one named simulation run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunProfile {
    pub run_name: String,
    pub profile: Option<NetworkProfile>,
}

/// Fingerprint of the archive a summary was extracted from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArtifactMeta {
    pub bytes: u64,
    pub sha256: String,
    pub recorded_at: String,
}

/// A job descriptor with its extracted artifacts attached, the unit written
/// to per-job report files and combined summaries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobSummary<T> {
    #[serde(flatten)]
    pub job: JobSpec,
    pub artifacts: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_meta: Option<ArtifactMeta>,
}

impl<T> JobSummary<T> {
    pub fn new(job: JobSpec, artifacts: Option<T>, artifact_meta: Option<ArtifactMeta>) -> Self {
        Self {
            job,
            artifacts,
            artifact_meta,
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize summary")?;
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))
}
