//! Item type filter matching
//!
//! Plugins declare the item types they handle as glob patterns such as
//! `maya.*` or `file.?ov`.

use regex::Regex;
use tracing::warn;

/// Translate a glob pattern into an anchored regex
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

/// Whether `item_type` matches any of the glob `filters`
pub fn matches_filters(filters: &[String], item_type: &str) -> bool {
    filters.iter().any(|filter| {
        match Regex::new(&glob_to_regex(filter)) {
            Ok(re) => re.is_match(item_type),
            Err(e) => {
                warn!("Ignoring unusable item filter {filter:?}: {e}");
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_wildcard_filter() {
        let f = filters(&["maya.*"]);
        assert!(matches_filters(&f, "maya.session.render"));
        assert!(matches_filters(&f, "maya.session"));
        assert!(!matches_filters(&f, "nuke.session"));
    }

    #[test]
    fn test_exact_and_single_char() {
        let f = filters(&["file.mov", "file.?xr"]);
        assert!(matches_filters(&f, "file.mov"));
        assert!(matches_filters(&f, "file.exr"));
        assert!(!matches_filters(&f, "file.movie"));
    }

    #[test]
    fn test_dots_are_literal() {
        let f = filters(&["file.mov"]);
        assert!(!matches_filters(&f, "fileXmov"));
    }

    #[test]
    fn test_no_filters_match_nothing() {
        assert!(!matches_filters(&[], "file.mov"));
    }
}
