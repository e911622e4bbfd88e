//! Shared types, error model, and configuration for jobowners.
//!
//! This crate is the foundation depended on by all other jobowners crates.
//! It provides:
//! - [`JobOwnersError`]: the unified error type
//! - Domain types ([`JobNode`], [`JobResult`])
//! - Configuration ([`AppConfig`], [`Credentials`], owner list loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Credentials, DefaultsConfig, JenkinsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, load_owners, parse_owners, resolve_credentials,
    resolve_credentials_with,
};
pub use error::{JobOwnersError, Result};
pub use types::{JobListing, JobNode, JobResult, OWNER_SEPARATOR};
