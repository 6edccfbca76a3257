//! Hosts-file line parsing and dnsmasq rule rendering.
//!
//! Deliberately lenient: upstream lists are full of comments and stray
//! formats, so malformed lines are skipped, never an error.

/// Extract the blocked domain from one hosts-form line (`IP domain ...`).
/// Blank lines, comments, and lines with fewer than two tokens yield None.
pub fn domain_from_host_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut tokens = line.split_whitespace();
    let _ip = tokens.next()?;
    let domain = normalize_domain(tokens.next()?);
    if domain.is_empty() {
        return None;
    }
    Some(domain)
}

/// Domain identity is exact string match post-normalization: lowercase,
/// trailing dot stripped.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim_end_matches('.').to_ascii_lowercase()
}

/// All domains from one raw blocklist body, in input order, not deduplicated.
pub fn convert(content: &str) -> Vec<String> {
    content.lines().filter_map(domain_from_host_line).collect()
}

/// Single fixed dnsmasq directive blocking a domain with a non-routable
/// answer. One template for the whole rule set, never mixed.
pub fn block_rule(domain: &str) -> String {
    format!("address=/{}/#", domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_hosts_format() {
        let content = "\
# Title: some blocklist
0.0.0.0 ads.example.com
0.0.0.0 tracker.example.com # inline trailer

127.0.0.1 localhost
";
        let domains = convert(content);
        assert_eq!(
            domains,
            vec!["ads.example.com", "tracker.example.com", "localhost"]
        );
    }

    #[test]
    fn test_lines_with_one_token_are_skipped() {
        assert_eq!(domain_from_host_line("just-a-domain.com"), None);
        assert_eq!(domain_from_host_line("   "), None);
        assert_eq!(domain_from_host_line("# 0.0.0.0 commented.com"), None);
    }

    #[test]
    fn test_second_token_is_the_domain() {
        assert_eq!(
            domain_from_host_line("0.0.0.0 Ads.Example.COM extra tokens"),
            Some("ads.example.com".to_string())
        );
    }

    #[test]
    fn test_normalization_strips_trailing_dot() {
        assert_eq!(normalize_domain("Ads.Example.com."), "ads.example.com");
    }

    #[test]
    fn test_convert_never_panics_on_garbage() {
        let garbage = "\u{0}\u{1}\n|||| ...\n0.0.0.0 .\n\t\t\n";
        // all-dot "domains" normalize to empty and are dropped
        assert!(convert(garbage).is_empty());
    }

    #[test]
    fn test_block_rule_template() {
        assert_eq!(block_rule("ads.example.com"), "address=/ads.example.com/#");
    }
}
