use crate::archive::{unpack_tar_gz, unpack_zip, Workspace};
use crate::config::JobSpec;
use crate::extract::{instance, profile, timing, utilization};
use crate::jenkins::{last_build_info, qualified_name, BuildServer};
use crate::summary::{ArtifactMeta, NetworkSynthesis, RunProfile, SynthesisSummary};
use crate::util;
use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const ARCHIVE_NAME: &str = "artifacts.zip";
const SYNTH_REPORT_DIR: &str = "archive/project/bin/reports";
const UTILIZATION_REPORT: &str = "report_utilization.rpt";
const TIMING_REPORT: &str = "timing_summary.rpt";
const INSTANCE_BUNDLE: &str = "archive/project/bin/instance_reports.tar.gz";
const INSTANCE_PROJECTS_ROOT: &str = "build/vivado-hls";
const RUN_BIN_DIR: &str = "archive/project/bin";

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub force_download: bool,
}

/// What one job contributed to a summary. `artifacts` is `None` whenever the
/// archive could not be obtained or unpacked.
pub struct Collected<T> {
    pub artifacts: Option<T>,
    pub meta: Option<ArtifactMeta>,
}

impl<T> Collected<T> {
    fn empty() -> Self {
        Self {
            artifacts: None,
            meta: None,
        }
    }
}

/// Pulls artifacts for jobs and folds their reports into summary records.
/// Every per-job failure is logged and folded to `null` so one broken job
/// never aborts the batch.
pub struct Aggregator<'s, S: BuildServer + ?Sized> {
    server: &'s S,
    user: String,
    opts: BatchOptions,
}

impl<'s, S: BuildServer + ?Sized> Aggregator<'s, S> {
    pub fn new(server: &'s S, user: &str, opts: BatchOptions) -> Self {
        Self {
            server,
            user: user.to_string(),
            opts,
        }
    }

    /// Utilization, timing and per-instance reports of a synthesis job.
    pub fn synthesis(&self, job: &JobSpec) -> Collected<SynthesisSummary> {
        let (archive, meta) = match self.obtain(job) {
            Ok(pair) => pair,
            Err(err) => {
                error!(job = %job.name, error = %format!("{err:#}"), "cannot obtain artifacts");
                return Collected::empty();
            }
        };
        let workspace = match self.unpacked(job, &archive) {
            Ok(ws) => ws,
            Err(err) => {
                error!(job = %job.name, error = %format!("{err:#}"), "cannot unpack artifacts");
                return Collected {
                    artifacts: None,
                    meta,
                };
            }
        };
        let reports = workspace.path().join(SYNTH_REPORT_DIR);
        let summary = SynthesisSummary {
            network_synth: NetworkSynthesis {
                utilization: self.soft(
                    job,
                    "utilization",
                    utilization::parse_file(&reports.join(UTILIZATION_REPORT)),
                ),
                timing: self.soft(
                    job,
                    "timing",
                    timing::parse_file(&reports.join(TIMING_REPORT)),
                ),
            },
            instance_synth: self.soft(job, "instances", self.instances(workspace.path())),
        };
        Collected {
            artifacts: Some(summary),
            meta,
        }
    }

    /// Actor profiles for the named simulation runs of one job.
    pub fn profiles(&self, job: &JobSpec, runs: &[String]) -> Collected<Vec<RunProfile>> {
        let (archive, meta) = match self.obtain(job) {
            Ok(pair) => pair,
            Err(err) => {
                error!(job = %job.name, error = %format!("{err:#}"), "cannot obtain artifacts");
                return Collected::empty();
            }
        };
        let workspace = match self.unpacked(job, &archive) {
            Ok(ws) => ws,
            Err(err) => {
                error!(job = %job.name, error = %format!("{err:#}"), "cannot unpack artifacts");
                return Collected {
                    artifacts: None,
                    meta,
                };
            }
        };
        let bin_dir = workspace.path().join(RUN_BIN_DIR);
        let profiles = runs
            .iter()
            .map(|run| RunProfile {
                run_name: run.clone(),
                profile: self.soft(
                    job,
                    "profile",
                    profile::parse_file(&bin_dir.join(run).join(format!("{run}.exdf"))),
                ),
            })
            .collect();
        Collected {
            artifacts: Some(profiles),
            meta,
        }
    }

    /// Returns the local archive path, downloading the last finished build's
    /// bundle when there is no usable copy on disk.
    fn obtain(&self, job: &JobSpec) -> Result<(PathBuf, Option<ArtifactMeta>)> {
        let dir = PathBuf::from(&job.dir);
        util::ensure_dir(&dir)?;
        let archive = dir.join(ARCHIVE_NAME);
        if archive.is_file() && !self.opts.force_download {
            info!(path = %archive.display(), "reusing downloaded archive");
            let meta = fingerprint(&archive);
            return Ok((archive, meta));
        }
        let name = qualified_name(&self.user, &job.name);
        let build = last_build_info(self.server, &name)?
            .ok_or_else(|| anyhow!("job {name} does not exist or has never been built"))?;
        if build.building {
            bail!("job {name} build {} is still running", build.number);
        }
        if build.artifacts.is_empty() {
            bail!("job {name} build {} has no artifacts", build.number);
        }
        let bytes = self.server.download_artifacts(&build.url, &archive)?;
        info!(job = %name, bytes, path = %archive.display(), "downloaded artifacts");
        let meta = fingerprint(&archive);
        Ok((archive, meta))
    }

    fn unpacked(&self, job: &JobSpec, archive: &Path) -> Result<Workspace> {
        let workspace = Workspace::create(Path::new(&job.dir))?;
        info!(job = %job.name, dest = %workspace.path().display(), "extracting artifacts");
        unpack_zip(archive, workspace.path())?;
        Ok(workspace)
    }

    fn instances(
        &self,
        extracted: &Path,
    ) -> Result<std::collections::BTreeMap<String, Option<instance::InstanceReport>>> {
        let bundle = extracted.join(INSTANCE_BUNDLE);
        if !bundle.is_file() {
            bail!("no instance report bundle at {}", bundle.display());
        }
        let unpack_root = extracted.join("instance_reports");
        unpack_tar_gz(&bundle, &unpack_root)?;
        instance::collect(&unpack_root.join(INSTANCE_PROJECTS_ROOT))
    }

    fn soft<T>(&self, job: &JobSpec, what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!(job = %job.name, what, error = %format!("{err:#}"), "extraction failed");
                None
            }
        }
    }
}

fn fingerprint(archive: &Path) -> Option<ArtifactMeta> {
    let digest = match util::sha256_file(archive) {
        Ok(digest) => digest,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not fingerprint archive");
            return None;
        }
    };
    let bytes = match std::fs::metadata(archive) {
        Ok(meta) => meta.len(),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not stat archive");
            return None;
        }
    };
    Some(ArtifactMeta {
        bytes,
        sha256: digest,
        recorded_at: util::now_rfc3339(),
    })
}
