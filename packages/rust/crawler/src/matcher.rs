//! Owner detection in job configuration text.

/// Owners from `owners` that occur anywhere in `config`, in owner-list order.
///
/// Plain case-sensitive substring search; the configuration is never parsed,
/// so an owner that happens to be a substring of unrelated text matches too.
pub fn match_owners(config: &str, owners: &[String]) -> Vec<String> {
    if config.is_empty() {
        return Vec::new();
    }

    owners
        .iter()
        .filter(|owner| config.contains(owner.as_str()))
        .cloned()
        .collect()
}
