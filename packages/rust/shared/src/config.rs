//! Application configuration for jobowners.
//!
//! Optional settings live in `jobowners.toml` (working directory first, then
//! `~/.jobowners/`). CLI flags override config file values, which override
//! defaults. Credentials and the owner list are plain files next to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JobOwnersError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "jobowners.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".jobowners";

/// Environment variables consulted when the credentials file is absent.
pub const ENV_URL: &str = "JENKINS_URL";
pub const ENV_USERNAME: &str = "JENKINS_USERNAME";
pub const ENV_API_KEY: &str = "JENKINS_API_KEY";

// ---------------------------------------------------------------------------
// Config structs (matching jobowners.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// File locations.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// CI server connection settings.
    #[serde(default)]
    pub jenkins: JenkinsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Credentials file: URL, username and API token, one per line.
    #[serde(default = "default_api_key_file")]
    pub api_key_file: String,

    /// Owner list, one identifier per line.
    #[serde(default = "default_owners_file")]
    pub owners_file: String,

    /// Destination of the CSV report.
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            api_key_file: default_api_key_file(),
            owners_file: default_owners_file(),
            report_file: default_report_file(),
        }
    }
}

fn default_api_key_file() -> String {
    ".api_key".into()
}
fn default_owners_file() -> String {
    ".owners".into()
}
fn default_report_file() -> String {
    "report.csv".into()
}

/// `[jenkins]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// How many folder levels the job listing expands.
    #[serde(default = "default_folder_depth")]
    pub folder_depth: u32,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            folder_depth: default_folder_depth(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_folder_depth() -> u32 {
    10
}
fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Connection credentials for the CI server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Server base URL.
    pub url: String,
    pub username: String,
    /// API token (or password).
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Resolve credentials: the file at `path` if it exists, else the
/// `JENKINS_URL` / `JENKINS_USERNAME` / `JENKINS_API_KEY` environment.
pub fn resolve_credentials(path: &Path) -> Result<Credentials> {
    resolve_credentials_with(path, |key| std::env::var(key).ok())
}

/// Same as [`resolve_credentials`] with an injectable environment lookup.
///
/// Unset variables resolve to empty strings; the client rejects an empty URL.
pub fn resolve_credentials_with<F>(path: &Path, env: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    if path.exists() {
        tracing::debug!(?path, "reading credentials file");
        let content = std::fs::read_to_string(path).map_err(|e| JobOwnersError::io(path, e))?;
        return parse_credentials(&content).map_err(|e| match e {
            JobOwnersError::Config { message } => {
                JobOwnersError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        });
    }

    tracing::debug!(?path, "credentials file not found, using environment");
    Ok(Credentials {
        url: env(ENV_URL).unwrap_or_default(),
        username: env(ENV_USERNAME).unwrap_or_default(),
        api_key: env(ENV_API_KEY).unwrap_or_default(),
    })
}

/// Parse the three positional lines of a credentials file.
pub fn parse_credentials(content: &str) -> Result<Credentials> {
    let mut lines = content.lines().map(str::trim);
    let mut next = |what: &str| {
        lines
            .next()
            .map(String::from)
            .ok_or_else(|| JobOwnersError::config(format!("credentials file is missing the {what} line")))
    };

    Ok(Credentials {
        url: next("URL")?,
        username: next("username")?,
        api_key: next("API key")?,
    })
}

// ---------------------------------------------------------------------------
// Owner list
// ---------------------------------------------------------------------------

/// Load the owner list from disk.
pub fn load_owners(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| JobOwnersError::io(path, e))?;
    let owners = parse_owners(&content);
    tracing::debug!(?path, count = owners.len(), "loaded owner list");
    Ok(owners)
}

/// One owner per line, trimmed, order preserved. Blank lines are dropped
/// since an empty owner would match every configuration.
pub fn parse_owners(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.jobowners/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| JobOwnersError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.jobowners/jobowners.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// An explicit path must exist. Otherwise `./jobowners.toml` is tried, then
/// the user config file, and defaults are returned if neither exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| JobOwnersError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| JobOwnersError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| JobOwnersError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| JobOwnersError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| JobOwnersError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
