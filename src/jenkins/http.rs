use super::{job_path, BuildInfo, BuildServer, JobInfo};
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

const DOWNLOAD_CHUNK: usize = 4096;
const PROGRESS_WIDTH: u64 = 50;

/// Token-authenticated wrapper over the Jenkins JSON API.
pub struct JenkinsClient {
    base: String,
    user: String,
    token: String,
    client: Client,
}

impl JenkinsClient {
    pub fn new(base: &str, user: &str, token: &str) -> Result<Self> {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let client = Client::builder().build().context("build http client")?;
        Ok(Self {
            base,
            user: user.to_string(),
            token: token.to_string(),
            client,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn job_url(&self, name: &str) -> String {
        format!("{}{}", self.base, job_path(name))
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        self.client
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .with_context(|| format!("GET {url}"))
    }

    fn post(&self, url: &str) -> Result<reqwest::blocking::Response> {
        self.client
            .post(url)
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .with_context(|| format!("POST {url}"))
    }
}

impl BuildServer for JenkinsClient {
    fn job_exists(&self, name: &str) -> Result<bool> {
        let url = format!("{}api/json", self.job_url(name));
        let resp = self.get(&url)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => bail!("GET {url} returned {status}"),
        }
    }

    fn job_info(&self, name: &str) -> Result<JobInfo> {
        let url = format!("{}api/json", self.job_url(name));
        let resp = self
            .get(&url)?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        resp.json()
            .with_context(|| format!("decode job info from {url}"))
    }

    fn build_info(&self, name: &str, number: u32) -> Result<BuildInfo> {
        let url = format!("{}{}/api/json", self.job_url(name), number);
        let resp = self
            .get(&url)?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        resp.json()
            .with_context(|| format!("decode build info from {url}"))
    }

    fn console_output(&self, name: &str, number: u32) -> Result<String> {
        let url = format!("{}{}/consoleText", self.job_url(name), number);
        let resp = self
            .get(&url)?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        resp.text()
            .with_context(|| format!("read console output from {url}"))
    }

    fn stop_build(&self, name: &str, number: u32) -> Result<()> {
        let url = format!("{}{}/stop", self.job_url(name), number);
        self.post(&url)?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        Ok(())
    }

    fn delete_job(&self, name: &str) -> Result<()> {
        let url = format!("{}doDelete", self.job_url(name));
        self.post(&url)?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        Ok(())
    }

    /// Streams the archive of a finished build to `dest`, drawing a progress
    /// bar on stdout when the server reports a content length. The body lands
    /// in a scratch file beside `dest` and is renamed into place once the
    /// transfer completes; a failed download leaves any previous archive
    /// untouched.
    fn download_artifacts(&self, build_url: &str, dest: &Path) -> Result<u64> {
        let url = format!("{build_url}artifact/*zip*/archive.zip");
        info!(url = %url, "downloading artifacts");
        let mut resp = self
            .get(&url)?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let total = resp.content_length().filter(|t| *t > 0);
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut out = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create scratch file in {}", dir.display()))?;
        let mut written: u64 = 0;
        let mut buf = [0u8; DOWNLOAD_CHUNK];
        loop {
            let n = resp
                .read(&mut buf)
                .with_context(|| format!("read body of {url}"))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])
                .with_context(|| format!("write {}", out.path().display()))?;
            written += n as u64;
            if let Some(total) = total {
                let done = (PROGRESS_WIDTH * written / total).min(PROGRESS_WIDTH) as usize;
                print!(
                    "\r[{}{}]",
                    "=".repeat(done),
                    " ".repeat(PROGRESS_WIDTH as usize - done)
                );
                let _ = std::io::stdout().flush();
            }
        }
        if total.is_some() {
            println!();
        }
        out.persist(dest)
            .map_err(|e| e.error)
            .with_context(|| format!("move download into {}", dest.display()))?;
        Ok(written)
    }
}
