use crate::config::{JobList, JobSpec};
use anyhow::{Context, Result};
use tracing::warn;

pub const INDEX_PATTERN: &str = "@INDEX@";
pub const CLOCK_PATTERN: &str = "@CLOCK@";

#[derive(Debug, Clone)]
pub struct ExpandOptions {
    pub start: u32,
    pub end: u32,
    pub clocks: Vec<String>,
    pub operation: String,
}

fn substitute(template: &str, index: u32, clock: &str) -> String {
    template
        .replace(INDEX_PATTERN, &index.to_string())
        .replace(CLOCK_PATTERN, clock)
}

/// Expands one template job into the index x clock grid. Each copy gets its
/// placeholders substituted, the clock parameters filled in and the operation
/// overridden.
pub fn expand_job(job: &JobSpec, opts: &ExpandOptions) -> Result<Vec<JobSpec>> {
    let mut out = Vec::new();
    for index in opts.start..=opts.end {
        for clock in &opts.clocks {
            let period: f64 = clock
                .parse()
                .with_context(|| format!("invalid clock period {clock:?}"))?;
            let mut params = job.params.clone();
            params.insert("HLS_CLOCK_PERIOD".to_string(), serde_json::json!(period));
            params.insert(
                "KERNEL_FREQ".to_string(),
                serde_json::json!((1000.0 / period) as i64),
            );
            out.push(JobSpec {
                name: substitute(&job.name, index, clock),
                dir: substitute(&job.dir, index, clock),
                network: substitute(&job.network, index, clock),
                operation: opts.operation.clone(),
                params,
            });
        }
    }
    Ok(out)
}

/// Expands every well-formed entry of a job list, carrying the credentials
/// over. Entries that fail to decode are skipped.
pub fn expand_list(list: &JobList, opts: &ExpandOptions) -> Result<JobList> {
    let mut jobs = Vec::new();
    for entry in &list.jobs {
        let job = match JobSpec::from_value(entry) {
            Ok(job) => job,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "skipping malformed job entry");
                continue;
            }
        };
        for expanded in expand_job(&job, opts)? {
            jobs.push(serde_json::to_value(&expanded).context("encode expanded job")?);
        }
    }
    Ok(JobList {
        username: list.username.clone(),
        token: list.token.clone(),
        jobs,
    })
}
