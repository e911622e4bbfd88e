//! Sequential job-tree walker.
//!
//! The walker descends the job tree depth-first, pre-order, visiting children
//! in the order the server listed them. Every leaf job's configuration is
//! fetched and matched against the owner list; folders only contribute their
//! descendants. A failed fetch is logged and degrades to an empty
//! configuration so the walk always covers every leaf.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use jobowners_jenkins::JobServer;
use jobowners_shared::{JobNode, JobResult};

use crate::matcher::match_owners;
use crate::normalize::job_path;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Per-leaf progress hook.
pub trait CrawlProgress {
    /// Called after each leaf job has been checked.
    fn job_checked(&self, result: &JobResult, current: usize, total: usize);
}

/// No-op progress hook.
pub struct SilentCrawl;

impl CrawlProgress for SilentCrawl {
    fn job_checked(&self, _result: &JobResult, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// CrawlSummary
// ---------------------------------------------------------------------------

/// Outcome of crawling a set of top-level jobs.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// One result per leaf job, in walk order.
    pub results: Vec<JobResult>,
    /// Jobs whose configuration could not be fetched (job path, error message).
    pub fetch_errors: Vec<(String, String)>,
    /// Total duration of the crawl.
    pub duration: Duration,
}

impl CrawlSummary {
    /// Number of jobs where at least one owner matched.
    pub fn jobs_with_owners(&self) -> usize {
        self.results.iter().filter(|r| r.has_owners()).count()
    }
}

// ---------------------------------------------------------------------------
// Config fetching
// ---------------------------------------------------------------------------

/// Fetch a job's configuration, returning an empty string on any failure.
pub async fn fetch_config<S: JobServer>(server: &S, job_path: &str) -> String {
    fetch_config_checked(server, job_path).await.0
}

/// Fetch a job's configuration; on failure log it and hand the message back.
async fn fetch_config_checked<S: JobServer>(
    server: &S,
    job_path: &str,
) -> (String, Option<String>) {
    match server.get_job_config(job_path).await {
        Ok(config) => (config, None),
        Err(e) => {
            warn!(job_path, error = %e, "failed to fetch job config");
            (String::new(), Some(e.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Walks job trees served by `S`, matching against a fixed owner list.
pub struct Crawler<'a, S> {
    server: &'a S,
    owners: &'a [String],
}

impl<'a, S: JobServer> Crawler<'a, S> {
    pub fn new(server: &'a S, owners: &'a [String]) -> Self {
        Self { server, owners }
    }

    /// Results for every leaf under `node` (the node itself if it is a leaf).
    pub async fn walk(&self, node: &JobNode) -> Vec<JobResult> {
        self.crawl(std::slice::from_ref(node), &SilentCrawl)
            .await
            .results
    }

    /// Walk all `roots` in order and collect one result per leaf job.
    #[instrument(skip_all, fields(roots = roots.len(), owners = self.owners.len()))]
    pub async fn crawl(&self, roots: &[JobNode], progress: &dyn CrawlProgress) -> CrawlSummary {
        let start = Instant::now();
        let total: usize = roots.iter().map(JobNode::leaf_count).sum();

        info!(total, "starting crawl");

        let mut results = Vec::with_capacity(total);
        let mut fetch_errors = Vec::new();

        // Reversed pushes keep the pop order equal to the listing order.
        let mut stack: Vec<&JobNode> = roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                JobNode::Folder { name, jobs, .. } => {
                    debug!(folder = %name, children = jobs.len(), "descending into folder");
                    stack.extend(jobs.iter().rev());
                }
                JobNode::Job { name, url } => {
                    let path = job_path(url);
                    let (config, error) = fetch_config_checked(self.server, &path).await;
                    if let Some(message) = error {
                        fetch_errors.push((path, message));
                    }

                    let result = JobResult {
                        name: name.clone(),
                        url: url.clone(),
                        owners: match_owners(&config, self.owners),
                    };
                    debug!(job = %result.name, owners = result.owners.len(), "job checked");

                    progress.job_checked(&result, results.len() + 1, total);
                    results.push(result);
                }
            }
        }

        let summary = CrawlSummary {
            results,
            fetch_errors,
            duration: start.elapsed(),
        };

        info!(
            jobs = summary.results.len(),
            with_owners = summary.jobs_with_owners(),
            fetch_errors = summary.fetch_errors.len(),
            duration_ms = summary.duration.as_millis(),
            "crawl completed"
        );

        summary
    }
}

#[cfg(test)]
mod crawler_tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use jobowners_jenkins::{ClientOptions, JenkinsClient};
    use jobowners_shared::{Credentials, JobOwnersError, Result};

    use super::*;

    /// In-memory server: configs keyed by job path, everything else 404s.
    #[derive(Default)]
    struct FakeServer {
        jobs: Vec<JobNode>,
        configs: HashMap<String, String>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeServer {
        fn with_config(mut self, path: &str, config: &str) -> Self {
            self.configs.insert(path.into(), config.into());
            self
        }
    }

    impl JobServer for FakeServer {
        async fn list_jobs(&self) -> Result<Vec<JobNode>> {
            Ok(self.jobs.clone())
        }

        async fn get_job_config(&self, job_path: &str) -> Result<String> {
            self.requested.borrow_mut().push(job_path.to_string());
            self.configs
                .get(job_path)
                .cloned()
                .ok_or_else(|| JobOwnersError::Remote {
                    status: 404,
                    url: format!("fake://{job_path}"),
                })
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        seen: RefCell<Vec<(String, usize, usize)>>,
    }

    impl CrawlProgress for RecordingProgress {
        fn job_checked(&self, result: &JobResult, current: usize, total: usize) {
            self.seen
                .borrow_mut()
                .push((result.name.clone(), current, total));
        }
    }

    fn owners(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_folder_contributes_leaf_results() {
        let tree = JobNode::folder(
            "root",
            "https://ci.example/job/root",
            vec![JobNode::job(
                "leafA",
                "https://ci.example/job/root/job/leafA%20Test",
            )],
        );
        let server = FakeServer::default().with_config("root/leafA Test", "<owner>alice</owner>");
        let owners = owners(&["alice"]);

        let results = Crawler::new(&server, &owners).walk(&tree).await;

        assert_eq!(server.requested.borrow().as_slice(), ["root/leafA Test"]);
        assert_eq!(
            results,
            vec![JobResult {
                name: "leafA".into(),
                url: "https://ci.example/job/root/job/leafA%20Test".into(),
                owners: vec!["alice".into()],
            }]
        );
    }

    #[tokio::test]
    async fn test_leaf_count_independent_of_depth() {
        let deep = (0..200).fold(JobNode::job("bottom", "https://ci.example/job/bottom"), |acc, i| {
            JobNode::folder(format!("f{i}"), "https://ci.example/job/f", vec![acc])
        });
        let tree = JobNode::folder(
            "top",
            "https://ci.example/job/top",
            vec![
                JobNode::job("a", "https://ci.example/job/top/job/a"),
                deep,
                JobNode::folder(
                    "mid",
                    "https://ci.example/job/top/job/mid",
                    vec![
                        JobNode::job("b", "https://ci.example/job/top/job/mid/job/b"),
                        JobNode::job("c", "https://ci.example/job/top/job/mid/job/c"),
                    ],
                ),
            ],
        );
        let server = FakeServer::default()
            .with_config("top/a", "")
            .with_config("bottom", "")
            .with_config("top/mid/b", "")
            .with_config("top/mid/c", "");
        let owners = owners(&[]);

        let summary = Crawler::new(&server, &owners)
            .crawl(std::slice::from_ref(&tree), &SilentCrawl)
            .await;

        assert_eq!(summary.results.len(), tree.leaf_count());
        let names: Vec<&str> = summary.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "bottom", "b", "c"]);
        assert!(summary.fetch_errors.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_does_not_abort_walk() {
        let roots = vec![
            JobNode::job("one", "https://ci.example/job/one/"),
            JobNode::job("two", "https://ci.example/job/two/"),
            JobNode::job("three", "https://ci.example/job/three/"),
        ];
        let server = FakeServer::default()
            .with_config("one", "alice")
            .with_config("three", "alice bob");
        let owners = owners(&["alice", "bob"]);
        let progress = RecordingProgress::default();

        let summary = Crawler::new(&server, &owners).crawl(&roots, &progress).await;

        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.results[0].owners, vec!["alice"]);
        assert!(summary.results[1].owners.is_empty());
        assert_eq!(summary.results[2].owners, vec!["alice", "bob"]);
        assert_eq!(summary.jobs_with_owners(), 2);

        assert_eq!(summary.fetch_errors.len(), 1);
        assert_eq!(summary.fetch_errors[0].0, "two");
        assert!(summary.fetch_errors[0].1.contains("404"));

        let seen = progress.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], ("three".to_string(), 3, 3));
    }

    #[tokio::test]
    async fn test_fetch_config_degrades_to_empty() {
        let server = FakeServer::default().with_config("ok", "<project/>");
        assert_eq!(fetch_config(&server, "ok").await, "<project/>");
        assert_eq!(fetch_config(&server, "missing").await, "");
    }

    #[tokio::test]
    async fn test_crawl_with_mock_server() {
        let server = wiremock::MockServer::start().await;
        let base = server.uri();

        let listing = listing_json(&base);
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/json"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(listing))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/job/team/job/api%20build/config.xml"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<project><owner>alice</owner></project>"),
            )
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/job/team/job/broken/config.xml"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let creds = Credentials {
            url: base.clone(),
            username: "bot".into(),
            api_key: "token".into(),
        };
        let client = JenkinsClient::new(&creds, &ClientOptions::default()).unwrap();
        let roots = client.list_jobs().await.unwrap();
        let owners = owners(&["alice"]);

        let summary = Crawler::new(&client, &owners).crawl(&roots, &SilentCrawl).await;

        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.results[0].name, "api build");
        assert_eq!(summary.results[0].owners, vec!["alice"]);
        assert_eq!(summary.results[1].name, "broken");
        assert!(summary.results[1].owners.is_empty());
        assert_eq!(summary.fetch_errors.len(), 1);
    }

    /// Listing with one folder holding two jobs, URLs pointing at `base`.
    fn listing_json(base: &str) -> String {
        format!(
            r#"{{"jobs": [{{
                "name": "team", "url": "{base}/job/team/",
                "jobs": [
                    {{"name": "api build", "url": "{base}/job/team/job/api%20build/"}},
                    {{"name": "broken", "url": "{base}/job/team/job/broken/"}}
                ]
            }}]}}"#
        )
    }
}
