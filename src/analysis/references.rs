//! Page reference parsing.

use regex::Regex;
use std::sync::LazyLock;

static PAGE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/pages/(\d+)").unwrap());

/// Extract the numeric page id from each reference (typically a page URL).
///
/// The id is the digit run following `/pages/`. References without one
/// are dropped.
pub fn extract_ids_from_references<S: AsRef<str>>(references: &[S]) -> Vec<String> {
    references
        .iter()
        .filter_map(|r| PAGE_ID_RE.captures(r.as_ref()))
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ids_from_urls() {
        let refs = [
            "https://example.atlassian.net/wiki/spaces/QA/pages/229378/Test+Table+01",
            "no-match-here",
        ];
        assert_eq!(extract_ids_from_references(&refs), vec!["229378"]);
    }

    #[test]
    fn test_extract_keeps_order_and_duplicates() {
        let refs = vec![
            "/pages/2/B".to_string(),
            "https://x/wiki/pages/1".to_string(),
            "/pages/2/B-again".to_string(),
        ];
        assert_eq!(extract_ids_from_references(&refs), vec!["2", "1", "2"]);
    }

    #[test]
    fn test_non_numeric_segment_is_dropped() {
        let refs = ["/pages/viewpage.action?pageId=5", "/pages/", "pages/12"];
        assert!(extract_ids_from_references(&refs).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let refs: [&str; 0] = [];
        assert!(extract_ids_from_references(&refs).is_empty());
    }
}
