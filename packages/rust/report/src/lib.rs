//! CSV report output.
//!
//! One header row (`name,url,owner`) followed by one row per checked job.
//! Matched owners share a single cell, joined with `", "`, so multi-owner
//! cells are quoted by the CSV writer. Records end with `\r\n`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use jobowners_shared::{JobOwnersError, JobResult, Result};

/// Fixed header row.
pub const HEADER: [&str; 3] = ["name", "url", "owner"];

/// Write `results` to `path`, replacing any existing file.
///
/// Returns the number of data rows written.
#[instrument(skip_all, fields(path = %path.display(), rows = results.len()))]
pub fn write_report(path: &Path, results: &[JobResult]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| JobOwnersError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| JobOwnersError::io(path, e))?;
    let rows = write_report_to(file, results).map_err(|e| match e {
        JobOwnersError::Report(message) => {
            JobOwnersError::Report(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;

    info!(rows, "report written");
    Ok(rows)
}

/// Write the report to any sink.
pub fn write_report_to<W: Write>(sink: W, results: &[JobResult]) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(sink);

    writer.write_record(HEADER).map_err(report_error)?;
    for result in results {
        writer
            .write_record([
                result.name.as_str(),
                result.url.as_str(),
                result.owners_field().as_str(),
            ])
            .map_err(report_error)?;
    }
    writer
        .flush()
        .map_err(|e| JobOwnersError::Report(e.to_string()))?;

    Ok(results.len())
}

fn report_error(e: csv::Error) -> JobOwnersError {
    JobOwnersError::Report(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, url: &str, owners: &[&str]) -> JobResult {
        JobResult {
            name: name.into(),
            url: url.into(),
            owners: owners.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn render(results: &[JobResult]) -> String {
        let mut buf = Vec::new();
        write_report_to(&mut buf, results).expect("write report");
        String::from_utf8(buf).expect("utf-8 report")
    }

    #[test]
    fn single_owner_row() {
        let out = render(&[result(
            "leafA",
            "https://ci.example/job/root/job/leafA%20Test",
            &["alice"],
        )]);
        assert_eq!(
            out,
            "name,url,owner\r\nleafA,https://ci.example/job/root/job/leafA%20Test,alice\r\n"
        );
    }

    #[test]
    fn multiple_owners_share_a_quoted_cell() {
        let out = render(&[result("app", "https://ci.example/job/app/", &["alice", "bob"])]);
        assert_eq!(
            out.lines().nth(1),
            Some(r#"app,https://ci.example/job/app/,"alice, bob""#)
        );
    }

    #[test]
    fn no_owners_leaves_field_empty() {
        let out = render(&[result("lonely", "https://ci.example/job/lonely/", &[])]);
        assert_eq!(out.lines().nth(1), Some("lonely,https://ci.example/job/lonely/,"));
    }

    #[test]
    fn empty_report_has_header_only() {
        assert_eq!(render(&[]), "name,url,owner\r\n");
    }

    #[test]
    fn write_report_overwrites_existing_file() {
        let dir = std::env::temp_dir().join(format!("jobowners-report-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("report.csv");

        write_report(&path, &[result("a", "u", &[]), result("b", "u", &[])]).unwrap();
        let rows = write_report(&path, &[result("c", "u", &["x"])]).unwrap();
        assert_eq!(rows, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "name,url,owner\r\nc,u,x\r\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = std::env::temp_dir().join(format!("jobowners-report-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();

        // A directory cannot be opened as the report file.
        let err = write_report(&dir, &[]).unwrap_err();
        assert!(matches!(err, JobOwnersError::Io { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
