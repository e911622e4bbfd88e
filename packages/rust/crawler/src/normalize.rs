//! Job URL → job path conversion.

use std::sync::LazyLock;

use regex::Regex;

/// Scheme and authority at the start of an absolute URL.
static ORIGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/]*").expect("valid origin regex")
});

/// Convert an absolute job URL into the slash-separated job path the config
/// endpoint expects.
///
/// `https://ci.example/job/root/job/leafA%20Test/` becomes `root/leafA Test`:
/// `%20` is decoded, the scheme and host are dropped, every `job` marker
/// segment is removed and surrounding slashes are trimmed. The segment after
/// a marker is always kept, so a job literally named `job` survives.
pub fn job_path(url: &str) -> String {
    let decoded = url.replace("%20", " ");
    let path = ORIGIN_RE.replace(&decoded, "");

    let mut names: Vec<&str> = Vec::new();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "job" {
            if let Some(name) = segments.next() {
                names.push(name);
            }
        } else {
            names.push(segment);
        }
    }

    names.join("/")
}
