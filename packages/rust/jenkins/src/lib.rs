//! Jenkins remote API client.
//!
//! The crawl only needs two calls from the CI server: list the job tree and
//! fetch one job's `config.xml`. [`JobServer`] captures that contract so the
//! crawler can run against any implementation; [`JenkinsClient`] is the HTTP
//! one, talking to the `api/json` and `config.xml` endpoints.

use std::time::Duration;

use jobowners_shared::{Credentials, JobListing, JobNode, JobOwnersError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of folder levels expanded by the job listing.
const DEFAULT_FOLDER_DEPTH: u32 = 10;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("jobowners/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The narrow slice of the CI server API the crawler depends on.
#[allow(async_fn_in_trait)]
pub trait JobServer {
    /// List top-level jobs, folders expanded with their descendants.
    async fn list_jobs(&self) -> Result<Vec<JobNode>>;

    /// Fetch the raw configuration document of the job at `job_path`
    /// (slash-separated job names, e.g. `team/app build`).
    async fn get_job_config(&self, job_path: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Client options
// ---------------------------------------------------------------------------

/// Configuration for [`JenkinsClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// How many folder levels `list_jobs` expands in one request.
    pub folder_depth: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            folder_depth: DEFAULT_FOLDER_DEPTH,
        }
    }
}

/// The authenticated user, as reported by `me/api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
}

// ---------------------------------------------------------------------------
// JenkinsClient
// ---------------------------------------------------------------------------

/// HTTP client for a Jenkins server, authenticated with an API token.
pub struct JenkinsClient {
    client: Client,
    base: Url,
    username: String,
    api_key: String,
    folder_depth: u32,
}

impl JenkinsClient {
    /// Create a client for the server described by `creds`.
    pub fn new(creds: &Credentials, opts: &ClientOptions) -> Result<Self> {
        if creds.url.trim().is_empty() {
            return Err(JobOwnersError::config(
                "Jenkins URL is empty. Provide it in the credentials file or JENKINS_URL.",
            ));
        }

        let base = Url::parse(creds.url.trim())
            .map_err(|e| JobOwnersError::config(format!("invalid Jenkins URL '{}': {e}", creds.url)))?;
        if base.cannot_be_a_base() {
            return Err(JobOwnersError::config(format!(
                "Jenkins URL '{base}' cannot be used as a base URL"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| JobOwnersError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            username: creds.username.clone(),
            api_key: creds.api_key.clone(),
            folder_depth: opts.folder_depth,
        })
    }

    /// Check connectivity and credentials by asking who we are.
    #[instrument(skip_all, fields(base = %self.base))]
    pub async fn whoami(&self) -> Result<Identity> {
        let url = self.endpoint(["me", "api", "json"])?;
        let body = self.get_text(url).await?;
        let identity: Identity = serde_json::from_str(&body)
            .map_err(|e| JobOwnersError::parse(format!("invalid me/api/json response: {e}")))?;
        info!(user = %identity.id, "connected to Jenkins");
        Ok(identity)
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| JobOwnersError::config(format!("cannot extend base URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue an authenticated GET and return the body of a 2xx response.
    async fn get_text(&self, url: Url) -> Result<String> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.api_key))
            .send()
            .await
            .map_err(|e| JobOwnersError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobOwnersError::Remote {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| JobOwnersError::Network(format!("{url}: failed to read body: {e}")))
    }
}

impl JobServer for JenkinsClient {
    #[instrument(skip_all, fields(folder_depth = self.folder_depth))]
    async fn list_jobs(&self) -> Result<Vec<JobNode>> {
        let mut url = self.endpoint(["api", "json"])?;
        url.query_pairs_mut()
            .append_pair("tree", &tree_query(self.folder_depth));

        let body = self.get_text(url).await?;
        let listing: JobListing = serde_json::from_str(&body)
            .map_err(|e| JobOwnersError::parse(format!("invalid job listing: {e}")))?;

        info!(top_level = listing.jobs.len(), "listed jobs");
        Ok(listing.jobs)
    }

    async fn get_job_config(&self, job_path: &str) -> Result<String> {
        let url = self.endpoint(config_segments(&self.base, job_path))?;
        self.get_text(url).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `tree` query selecting name and url, with `jobs[...]` nested `depth` times.
pub fn tree_query(depth: u32) -> String {
    let mut tree = String::from("jobs[name,url]");
    for _ in 0..depth {
        tree = format!("jobs[name,url,{tree}]");
    }
    tree
}

/// Path segments for a job's config: `a/b` → `job/a/job/b/config.xml`.
///
/// Job paths derived from listed URLs still carry the server's context path
/// (`jenkins/app` under `https://host/jenkins/`). Those leading segments are
/// already part of `base`, so they are dropped here.
fn config_segments<'a>(base: &Url, job_path: &'a str) -> Vec<&'a str> {
    let prefix: Vec<&str> = base
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let names: Vec<&str> = job_path.split('/').filter(|name| !name.is_empty()).collect();
    let has_prefix = !prefix.is_empty()
        && names.len() >= prefix.len()
        && prefix.iter().zip(&names).all(|(p, n)| p == n);
    let names = if has_prefix {
        &names[prefix.len()..]
    } else {
        &names[..]
    };

    let mut segments: Vec<&str> = names.iter().flat_map(|name| ["job", *name]).collect();
    segments.push("config.xml");
    segments
}
