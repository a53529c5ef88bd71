use crate::{
    aggregate::{Aggregator, BatchOptions, Collected},
    config::{JobList, JobSpec},
    expand::{self, ExpandOptions},
    jenkins::{self, last_build_info, qualified_name, BuildServer, JenkinsClient},
    place::{self, PlacementMap},
    summary::{self, JobSummary},
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "synth-herder")]
#[command(about = "Herd Jenkins synthesis and simulation jobs and their report artifacts")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Emit stdout logs as JSON.
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pull artifacts of synthesis jobs and summarize their reports.
    Report {
        /// JSON job list file.
        jobs: PathBuf,
        #[arg(short, long, default_value = jenkins::DEFAULT_SERVER)]
        server: String,
        /// Save all summaries in a single file instead of one per job.
        #[arg(short = 'S', long)]
        single_file: bool,
        /// Output file when --single-file is given.
        #[arg(short, long, default_value = "summary.json")]
        output: PathBuf,
        /// Download again even when an archive already exists on disk.
        #[arg(long)]
        force_download: bool,
    },
    /// Pull artifacts of simulation jobs and summarize their run profiles.
    Profile {
        /// JSON job list file.
        jobs: PathBuf,
        #[arg(short, long, default_value = jenkins::DEFAULT_SERVER)]
        server: String,
        /// Run names to extract profiles for, e.g. -r bus_cif_15 foreman_qcif_30.
        #[arg(short, long, required = true, num_args = 1..)]
        runs: Vec<String>,
        /// Save all summaries in a single file instead of one per job.
        #[arg(short = 'S', long)]
        single_file: bool,
        /// Output file when --single-file is given.
        #[arg(short, long, default_value = "summary.json")]
        output: PathBuf,
        /// Download again even when an archive already exists on disk.
        #[arg(long)]
        force_download: bool,
    },
    /// Show the build status of every job in the list.
    Status {
        /// JSON job list file.
        jobs: PathBuf,
        #[arg(short, long, default_value = jenkins::DEFAULT_SERVER)]
        server: String,
        /// Print console output of builds in progress.
        #[arg(long)]
        console: bool,
    },
    /// Stop the last build of every job in the list and delete the job.
    Clean {
        /// JSON job list file.
        jobs: PathBuf,
        #[arg(short, long, default_value = jenkins::DEFAULT_SERVER)]
        server: String,
        /// Confirm stopping and deleting the listed jobs.
        #[arg(short, long)]
        yes: bool,
    },
    /// Expand template jobs over an index range and clock sweep.
    Enumerate {
        /// JSON job list file with @INDEX@/@CLOCK@ placeholders.
        jobs: PathBuf,
        /// First index substituted for @INDEX@.
        #[arg(long, required = true)]
        start: u32,
        /// Last index substituted for @INDEX@, inclusive.
        #[arg(long, required = true)]
        end: u32,
        #[arg(long, default_value = "enumerated.json")]
        output: PathBuf,
        /// Operation written into every expanded job.
        #[arg(long, default_value = "build", value_parser = ["build", "clean", "query", "download"])]
        operation: String,
        /// Clock periods in nanoseconds substituted for @CLOCK@.
        #[arg(long, num_args = 1.., default_values_t = vec!["3.3".to_string()])]
        clocks: Vec<String>,
    },
    /// Copy xclbin directories of downloaded archives into solver-chosen
    /// multicore binary directories.
    Place {
        /// Binary directory pattern with @CORES@ and @SOL_NUMBER@ placeholders.
        #[arg(short, long)]
        bin_pattern: String,
        /// Archive path pattern with an @INDEX@ placeholder.
        #[arg(short, long)]
        artifact_pattern: String,
        /// JSON file mapping solutions to unique hardware partition indices.
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let _guard = init_logging(&args)?;
    match &args.cmd {
        Command::Report {
            jobs,
            server,
            single_file,
            output,
            force_download,
        } => report(jobs, server, *single_file, output, *force_download),
        Command::Profile {
            jobs,
            server,
            runs,
            single_file,
            output,
            force_download,
        } => profile(jobs, server, runs, *single_file, output, *force_download),
        Command::Status {
            jobs,
            server,
            console,
        } => status(jobs, server, *console),
        Command::Clean { jobs, server, yes } => clean(jobs, server, *yes),
        Command::Enumerate {
            jobs,
            start,
            end,
            output,
            operation,
            clocks,
        } => {
            let opts = ExpandOptions {
                start: *start,
                end: *end,
                clocks: clocks.clone(),
                operation: operation.clone(),
            };
            enumerate(jobs, &opts, output)
        }
        Command::Place {
            bin_pattern,
            artifact_pattern,
            mapping,
        } => place(bin_pattern, artifact_pattern, mapping),
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    let level = args.log_level.as_deref().unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if args.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let (file_layer, guard) = if let Some(path) = args.log_file.as_deref() {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn report(
    jobs: &Path,
    server: &str,
    single_file: bool,
    output: &Path,
    force_download: bool,
) -> Result<()> {
    let list = JobList::load(jobs)?;
    info!(user = %list.username, jobs = list.jobs.len(), "read job list");
    let client = JenkinsClient::new(server, &list.username, &list.token)?;
    let aggregator = Aggregator::new(&client, &list.username, BatchOptions { force_download });
    summarize_jobs(&list, single_file, output, "instance_report.json", |job| {
        aggregator.synthesis(job)
    })?;
    info!("all done; visit {}job/{}", client.base(), list.username);
    Ok(())
}

fn profile(
    jobs: &Path,
    server: &str,
    runs: &[String],
    single_file: bool,
    output: &Path,
    force_download: bool,
) -> Result<()> {
    let list = JobList::load(jobs)?;
    info!(user = %list.username, jobs = list.jobs.len(), "read job list");
    let client = JenkinsClient::new(server, &list.username, &list.token)?;
    let aggregator = Aggregator::new(&client, &list.username, BatchOptions { force_download });
    summarize_jobs(&list, single_file, output, "profile_summary.json", |job| {
        aggregator.profiles(job, runs)
    })?;
    info!("all done; visit {}job/{}", client.base(), list.username);
    Ok(())
}

/// Shared batch loop of the report and profile commands: decode each entry,
/// collect its artifacts, write the summary where it belongs.
fn summarize_jobs<T, F>(
    list: &JobList,
    single_file: bool,
    output: &Path,
    per_job_name: &str,
    collect: F,
) -> Result<()>
where
    T: Serialize,
    F: Fn(&JobSpec) -> Collected<T>,
{
    let mut combined = Vec::new();
    for entry in &list.jobs {
        let job = match JobSpec::from_value(entry) {
            Ok(job) => job,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "skipping malformed job entry");
                continue;
            }
        };
        let collected = collect(&job);
        let summary = JobSummary::new(job, collected.artifacts, collected.meta);
        if single_file {
            combined.push(summary);
        } else {
            ensure_dir(Path::new(&summary.job.dir))?;
            let path = Path::new(&summary.job.dir).join(per_job_name);
            summary::write_json(&path, &summary)?;
            info!(path = %path.display(), "wrote job summary");
        }
    }
    if single_file {
        summary::write_json(output, &combined)?;
        info!(path = %output.display(), count = combined.len(), "wrote combined summary");
    }
    Ok(())
}

fn status(jobs: &Path, server: &str, console: bool) -> Result<()> {
    let list = JobList::load(jobs)?;
    let client = JenkinsClient::new(server, &list.username, &list.token)?;
    for entry in &list.jobs {
        let job = match JobSpec::from_value(entry) {
            Ok(job) => job,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "skipping malformed job entry");
                continue;
            }
        };
        let name = qualified_name(&list.username, &job.name);
        match last_build_info(&client, &name) {
            Ok(None) => println!("Job {name} does not exist or has never been built"),
            Ok(Some(build)) if build.building => {
                println!("Job {name} is building (build {})", build.number);
                if console {
                    print_console(&client, &name, build.number);
                }
            }
            Ok(Some(build)) => println!("Job {name} is not building (last build {})", build.number),
            Err(err) => {
                error!(job = %name, error = %format!("{err:#}"), "status query failed");
            }
        }
    }
    Ok(())
}

fn print_console<S: BuildServer + ?Sized>(server: &S, name: &str, number: u32) {
    match server.console_output(name, number) {
        Ok(text) => {
            println!("-------------------------------------------------------------");
            println!("JOB: {name}");
            println!("\n{text}\n");
            println!("=============================================================");
        }
        Err(err) => {
            error!(job = %name, error = %format!("{err:#}"), "cannot fetch console output");
        }
    }
}

fn clean(jobs: &Path, server: &str, yes: bool) -> Result<()> {
    let list = JobList::load(jobs)?;
    let client = JenkinsClient::new(server, &list.username, &list.token)?;
    for entry in &list.jobs {
        let job = match JobSpec::from_value(entry) {
            Ok(job) => job,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "skipping malformed job entry");
                continue;
            }
        };
        let name = qualified_name(&list.username, &job.name);
        if !yes {
            println!("Would stop and delete job {name} (pass --yes to confirm)");
            continue;
        }
        if let Err(err) = clean_one(&client, &name) {
            error!(job = %name, error = %format!("{err:#}"), "clean failed");
        }
    }
    Ok(())
}

fn clean_one<S: BuildServer + ?Sized>(server: &S, name: &str) -> Result<()> {
    if !server.job_exists(name)? {
        info!(job = %name, "job does not exist, nothing to clean");
        return Ok(());
    }
    let info = server.job_info(name)?;
    if let Some(build) = info.last_build {
        info!(job = %name, build = build.number, "stopping build");
        server.stop_build(name, build.number)?;
    }
    info!(job = %name, "deleting job");
    server.delete_job(name)
}

fn enumerate(jobs: &Path, opts: &ExpandOptions, output: &Path) -> Result<()> {
    let list = JobList::load(jobs)?;
    info!(user = %list.username, jobs = list.jobs.len(), "read job template list");
    let expanded = expand::expand_list(&list, opts)?;
    expanded.save(output)?;
    info!(path = %output.display(), count = expanded.jobs.len(), "wrote enumerated job list");
    Ok(())
}

fn place(bin_pattern: &str, artifact_pattern: &str, mapping: &Path) -> Result<()> {
    let map = PlacementMap::load(mapping)?;
    let placed = place::place_artifacts(&map, bin_pattern, artifact_pattern)?;
    info!(placed, total = map.solutions.len(), "placement finished");
    Ok(())
}
