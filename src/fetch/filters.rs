use crate::config::FeedConfig;
use crate::feed::Entry;

/// Applies content filters and matchers to `entries`, in this order:
///
/// 1. `filters`: drop entries whose contents contain any of them
/// 2. `matchOneOf`: keep entries containing at least one of them
/// 3. `matchAllOf`: keep entries containing every one of them
///
/// Empty lists are skipped.
pub fn apply_filters(entries: Vec<Entry>, config: &FeedConfig) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|entry| {
            !config
                .filters
                .iter()
                .any(|filter| entry.contents.contains(filter.as_str()))
        })
        .filter(|entry| {
            config.match_one_of.is_empty()
                || config
                    .match_one_of
                    .iter()
                    .any(|matcher| entry.contents.contains(matcher.as_str()))
        })
        .filter(|entry| {
            config
                .match_all_of
                .iter()
                .all(|matcher| entry.contents.contains(matcher.as_str()))
        })
        .collect()
}
