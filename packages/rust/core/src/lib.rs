//! Pipeline orchestration for jobowners.
//!
//! This crate ties together configuration, the Jenkins client, the crawler
//! and the report writer into the end-to-end `scan` workflow.

pub mod pipeline;
