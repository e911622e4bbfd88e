//! End-to-end `scan` pipeline: credentials → connect → list → crawl → report.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use jobowners_crawler::{CrawlProgress, Crawler};
use jobowners_jenkins::{ClientOptions, JenkinsClient, JobServer};
use jobowners_shared::{AppConfig, JobNode, JobResult, Result, load_owners, resolve_credentials};

/// Configuration for the `scan` pipeline.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Credentials file (URL, username, token); environment fallback if absent.
    pub api_key_file: PathBuf,
    /// Owner list file.
    pub owners_file: PathBuf,
    /// CSV report destination.
    pub report_file: PathBuf,
    /// HTTP client settings.
    pub client: ClientOptions,
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key_file: PathBuf::from(&config.defaults.api_key_file),
            owners_file: PathBuf::from(&config.defaults.owners_file),
            report_file: PathBuf::from(&config.defaults.report_file),
            client: ClientOptions {
                timeout_secs: config.jenkins.timeout_secs,
                folder_depth: config.jenkins.folder_depth,
            },
        }
    }
}

/// Result of the `scan` pipeline.
#[derive(Debug)]
pub struct ScanResult {
    /// Where the report was written.
    pub report_path: PathBuf,
    /// One entry per leaf job, as written to the report.
    pub results: Vec<JobResult>,
    /// Jobs whose configuration could not be fetched (job path, error).
    pub fetch_errors: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl ScanResult {
    pub fn jobs_checked(&self) -> usize {
        self.results.len()
    }

    pub fn jobs_with_owners(&self) -> usize {
        self.results.iter().filter(|r| r.has_owners()).count()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each job's configuration has been checked.
    fn job_checked(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ScanResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn job_checked(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &ScanResult) {}
}

/// Forwards crawler progress to a [`ProgressReporter`].
struct PipelineCrawlProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl CrawlProgress for PipelineCrawlProgress<'_> {
    fn job_checked(&self, result: &JobResult, current: usize, total: usize) {
        self.inner.job_checked(&result.name, current, total);
    }
}

/// Resolve credentials and open a connection to the server.
///
/// With a username the credentials are verified up front. Anonymous
/// servers usually refuse `me/api/json`, so without one a failed check is
/// only logged.
pub async fn connect(config: &ScanConfig) -> Result<JenkinsClient> {
    let creds = resolve_credentials(&config.api_key_file)?;
    let client = JenkinsClient::new(&creds, &config.client)?;
    match client.whoami().await {
        Ok(_) => {}
        Err(e) if creds.username.is_empty() => {
            warn!(error = %e, "identity check failed, continuing anonymously");
        }
        Err(e) => return Err(e),
    }
    Ok(client)
}

/// Fetch the job tree without inspecting any configuration.
#[instrument(skip_all)]
pub async fn list_job_tree(config: &ScanConfig) -> Result<Vec<JobNode>> {
    let client = connect(config).await?;
    client.list_jobs().await
}

/// Run the full `scan` pipeline.
///
/// 1. Load the owner list
/// 2. Resolve credentials and connect
/// 3. List the job tree
/// 4. Walk every leaf job and match owners
/// 5. Write the CSV report
///
/// Only per-job config fetch failures are tolerated; anything else aborts
/// the run before the report is written.
#[instrument(skip_all, fields(report = %config.report_file.display()))]
pub async fn scan(config: &ScanConfig, progress: &dyn ProgressReporter) -> Result<ScanResult> {
    let start = Instant::now();

    progress.phase("Loading owner list");
    let owners = load_owners(&config.owners_file)?;

    progress.phase("Connecting to Jenkins");
    let client = connect(config).await?;

    progress.phase("Listing jobs");
    let roots = client.list_jobs().await?;

    info!(
        owners = owners.len(),
        top_level_jobs = roots.len(),
        "starting scan"
    );

    progress.phase("Checking job configurations");
    let crawl_progress = PipelineCrawlProgress { inner: progress };
    let summary = Crawler::new(&client, &owners)
        .crawl(&roots, &crawl_progress)
        .await;

    progress.phase("Writing report");
    jobowners_report::write_report(&config.report_file, &summary.results)?;

    let result = ScanResult {
        report_path: config.report_file.clone(),
        results: summary.results,
        fetch_errors: summary.fetch_errors,
        elapsed: start.elapsed(),
    };

    info!(
        jobs = result.jobs_checked(),
        with_owners = result.jobs_with_owners(),
        fetch_errors = result.fetch_errors.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "scan completed"
    );

    progress.done(&result);
    Ok(result)
}
