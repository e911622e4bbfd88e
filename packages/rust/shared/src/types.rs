//! Core domain types: the CI job tree and per-job results.

use serde::Deserialize;

/// Separator used when several owners are rendered into one report cell.
pub const OWNER_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// JobNode
// ---------------------------------------------------------------------------

/// A node of the CI server's job tree.
///
/// Whether a node is a folder is decided once, when the listing is
/// deserialized: an entry carrying a non-empty `jobs` array is a
/// [`JobNode::Folder`], anything else is a buildable [`JobNode::Job`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawJobNode")]
pub enum JobNode {
    /// Container holding nested jobs, in the order the server listed them.
    Folder {
        name: String,
        url: String,
        jobs: Vec<JobNode>,
    },
    /// Leaf job whose configuration is inspected.
    Job { name: String, url: String },
}

/// Wire shape of a job entry in the `api/json` listing.
#[derive(Debug, Deserialize)]
struct RawJobNode {
    name: String,
    url: String,
    #[serde(default)]
    jobs: Option<Vec<RawJobNode>>,
}

impl From<RawJobNode> for JobNode {
    fn from(raw: RawJobNode) -> Self {
        match raw.jobs {
            Some(jobs) if !jobs.is_empty() => Self::Folder {
                name: raw.name,
                url: raw.url,
                jobs: jobs.into_iter().map(Self::from).collect(),
            },
            _ => Self::Job {
                name: raw.name,
                url: raw.url,
            },
        }
    }
}

impl JobNode {
    /// Build a leaf job node.
    pub fn job(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Job {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Build a folder node with the given children.
    pub fn folder(name: impl Into<String>, url: impl Into<String>, jobs: Vec<JobNode>) -> Self {
        Self::Folder {
            name: name.into(),
            url: url.into(),
            jobs,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::Job { name, .. } => name,
        }
    }

    /// Absolute URL as reported by the server.
    pub fn url(&self) -> &str {
        match self {
            Self::Folder { url, .. } | Self::Job { url, .. } => url,
        }
    }

    /// Whether this node contains nested jobs.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    /// Nested jobs (empty for leaves).
    pub fn children(&self) -> &[JobNode] {
        match self {
            Self::Folder { jobs, .. } => jobs,
            Self::Job { .. } => &[],
        }
    }

    /// Number of leaf jobs in the subtree rooted at this node.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Folder { jobs, .. } => stack.extend(jobs.iter()),
                Self::Job { .. } => count += 1,
            }
        }
        count
    }
}

/// Top-level `api/json` response body.
#[derive(Debug, Deserialize)]
pub struct JobListing {
    #[serde(default)]
    pub jobs: Vec<JobNode>,
}

// ---------------------------------------------------------------------------
// JobResult
// ---------------------------------------------------------------------------

/// Owners found in one leaf job's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Job display name.
    pub name: String,
    /// Job URL exactly as listed by the server.
    pub url: String,
    /// Matched owners, in owner-list order.
    pub owners: Vec<String>,
}

impl JobResult {
    /// Owners joined into a single report cell; empty when nothing matched.
    pub fn owners_field(&self) -> String {
        self.owners.join(OWNER_SEPARATOR)
    }

    pub fn has_owners(&self) -> bool {
        !self.owners.is_empty()
    }
}
