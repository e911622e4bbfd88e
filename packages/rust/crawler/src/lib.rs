//! Job-tree crawl: URL normalisation, config fetching and owner matching.
//!
//! This crate provides:
//! - [`normalize`]: job URL → job path
//! - [`matcher`]: owner detection in configuration text
//! - [`engine`]: sequential, stack-based tree walker

pub mod engine;
pub mod matcher;
pub mod normalize;

pub use engine::{CrawlProgress, CrawlSummary, Crawler, SilentCrawl, fetch_config};
pub use matcher::match_owners;
pub use normalize::job_path;
