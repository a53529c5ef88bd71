pub mod http;

pub use http::JenkinsClient;

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub const DEFAULT_SERVER: &str = "http://localhost:8080/";

/// Subset of the job `api/json` document the drivers act on.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInfo {
    #[serde(rename = "lastBuild")]
    pub last_build: Option<BuildRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    pub building: bool,
    pub number: u32,
    pub url: String,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactRef {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "relativePath")]
    pub relative_path: String,
}

/// The server operations the drivers need, kept behind a trait so batch
/// logic can run against a scripted server in tests.
pub trait BuildServer {
    fn job_exists(&self, name: &str) -> Result<bool>;
    fn job_info(&self, name: &str) -> Result<JobInfo>;
    fn build_info(&self, name: &str, number: u32) -> Result<BuildInfo>;
    fn console_output(&self, name: &str, number: u32) -> Result<String>;
    fn stop_build(&self, name: &str, number: u32) -> Result<()>;
    fn delete_job(&self, name: &str) -> Result<()>;
    fn download_artifacts(&self, build_url: &str, dest: &Path) -> Result<u64>;
}

/// Jobs live under the owner's folder, so "alice/decoder" is served at
/// "job/alice/job/decoder/".
pub fn job_path(name: &str) -> String {
    let mut path = String::new();
    for part in name.split('/').filter(|p| !p.is_empty()) {
        path.push_str("job/");
        path.push_str(part);
        path.push('/');
    }
    path
}

pub fn qualified_name(user: &str, job: &str) -> String {
    format!("{user}/{job}")
}

/// Resolves the most recent build of a job, `None` when the job is missing
/// or has never been built.
pub fn last_build_info<S: BuildServer + ?Sized>(
    server: &S,
    name: &str,
) -> Result<Option<BuildInfo>> {
    if !server.job_exists(name)? {
        return Ok(None);
    }
    info!(job = %name, "pulling job info");
    let info = server.job_info(name)?;
    match info.last_build {
        Some(build) => Ok(Some(server.build_info(name, build.number)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::job_path;

    #[test]
    fn job_path_nests_folder_segments() {
        assert_eq!(job_path("alice/decoder"), "job/alice/job/decoder/");
        assert_eq!(job_path("decoder"), "job/decoder/");
        assert_eq!(job_path("a/b/c"), "job/a/job/b/job/c/");
    }
}
