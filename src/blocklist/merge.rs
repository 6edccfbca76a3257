//! Multi-source merge with user allow/deny overrides.

use super::convert;
use super::fetch::FetchResult;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// User-controlled overrides, normalized on construction.
#[derive(Debug, Default, Clone)]
pub struct OverrideSet {
    allow: FxHashSet<String>,
    deny: FxHashSet<String>,
}

impl OverrideSet {
    pub fn new(allow: &[String], deny: &[String]) -> Self {
        Self {
            allow: allow.iter().map(|d| convert::normalize_domain(d)).collect(),
            deny: deny.iter().map(|d| convert::normalize_domain(d)).collect(),
        }
    }
}

/// Union all successfully fetched sources, remove the allow-set, then add
/// the deny-set. Removal before addition is the tie-break: a domain in both
/// allow and deny ends up included (deny wins).
///
/// Output is sorted so the rendered rule file is byte-stable for identical
/// inputs.
pub fn merge(results: &[FetchResult], overrides: &OverrideSet) -> Vec<String> {
    let mut domains: BTreeSet<String> = BTreeSet::new();

    for result in results {
        if let Some(content) = &result.content {
            domains.extend(convert::convert(content));
        }
    }

    for allowed in &overrides.allow {
        domains.remove(allowed);
    }
    for denied in &overrides.deny {
        if !denied.is_empty() {
            domains.insert(denied.clone());
        }
    }

    domains.into_iter().collect()
}

/// One block rule per domain, newline-terminated.
pub fn render_rules(domains: &[String]) -> String {
    let mut out = String::new();
    for domain in domains {
        out.push_str(&convert::block_rule(domain));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(url: &str, content: &str) -> FetchResult {
        FetchResult::ok(url.to_string(), content.to_string())
    }

    #[test]
    fn test_union_across_sources_dedupes() {
        let results = vec![
            fetched("a", "0.0.0.0 ads.example.com\n0.0.0.0 shared.example.com\n"),
            fetched("b", "0.0.0.0 shared.example.com\n0.0.0.0 tracker.example.com\n"),
        ];
        let merged = merge(&results, &OverrideSet::default());
        assert_eq!(
            merged,
            vec!["ads.example.com", "shared.example.com", "tracker.example.com"]
        );
    }

    #[test]
    fn test_allow_removes_source_domain() {
        let results = vec![fetched("a", "0.0.0.0 b.com\n0.0.0.0 keep.com\n")];
        let overrides = OverrideSet::new(&["b.com".to_string()], &[]);
        assert_eq!(merge(&results, &overrides), vec!["keep.com"]);
    }

    #[test]
    fn test_deny_is_unconditional_inclusion() {
        let results = vec![fetched("a", "0.0.0.0 listed.com\n")];
        let overrides = OverrideSet::new(&[], &["extra.com".to_string()]);
        assert_eq!(merge(&results, &overrides), vec!["extra.com", "listed.com"]);
    }

    #[test]
    fn test_deny_wins_over_allow() {
        let results = vec![fetched("a", "0.0.0.0 a.com\n")];
        let overrides = OverrideSet::new(&["a.com".to_string()], &["a.com".to_string()]);
        assert_eq!(merge(&results, &overrides), vec!["a.com"]);
    }

    #[test]
    fn test_failed_sources_contribute_nothing() {
        let results = vec![
            fetched("a", "0.0.0.0 ads.example.com\n"),
            FetchResult::failed("b".to_string(), "timeout".to_string()),
        ];
        let merged = merge(&results, &OverrideSet::default());
        assert_eq!(merged, vec!["ads.example.com"]);
    }

    #[test]
    fn test_overrides_are_normalized() {
        let results = vec![fetched("a", "0.0.0.0 mixed.example.com\n")];
        let overrides = OverrideSet::new(&["Mixed.Example.COM.".to_string()], &[]);
        assert!(merge(&results, &overrides).is_empty());
    }

    #[test]
    fn test_render_rules() {
        let domains = vec!["a.com".to_string(), "b.com".to_string()];
        assert_eq!(render_rules(&domains), "address=/a.com/#\naddress=/b.com/#\n");
    }
}
