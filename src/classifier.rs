//! URL trust classification.
//!
//! Maps a raw reference URL (plus its CVE context) to either rejection or a
//! canonical URL with a trust score in `[0, 1]`, by walking the curated
//! policy lists in [`crate::policy`] in a fixed order, first match wins.
//!
//! Unknown domains default to rejection unless a CVE token is textually
//! present, a deliberately weak signal tolerated because the merge step
//! never lets a low-score duplicate override a higher-trust one.

use crate::policy;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

/// Canonical reference database (exploit-db).
pub const SCORE_REFERENCE_DB: f64 = 0.5;
/// Actively maintained PoC-index repositories.
pub const SCORE_HIGH_EXACT: f64 = 0.9;
/// Vendor trackers and dedicated research platforms.
pub const SCORE_HIGH_PREFIX: f64 = 0.7;
/// Blogs, generic hosts, known-noisy sources.
pub const SCORE_MEDIUM: f64 = 0.4;
/// Found a CVE token in the URL but nothing else is known.
pub const SCORE_UNVERIFIED: f64 = 0.0;

static CVE_TOKEN: Lazy<Result<Regex, regex_lite::Error>> =
    Lazy::new(|| Regex::new(r"CVE-\d{4}-\d{4,7}"));

/// Classify a reference URL.
///
/// Returns the canonical URL and its trust score, or `None` when the URL is
/// not admissible. With `strict` set to `false`, rejected unknown URLs are
/// logged for observability but are still not admissible.
pub fn classify(url: &str, cve_id: &str, strict: bool) -> Option<(String, f64)> {
    let mut url = url.replacen("http://", "https://", 1);

    // Pages that only confirm a vulnerability exists are useless here: we
    // want proof that at least one public exploit exists.
    for banned in policy::FORBIDDEN_PREFIXES {
        if url.starts_with(banned) {
            let (except_cve, except_url, except_score) = policy::FORBIDDEN_EXCEPTION;
            if cve_id == except_cve && url == except_url {
                return Some((url, except_score));
            }
            return None;
        }
    }
    if policy::DEAD_END_URLS.contains(&url.as_str()) {
        return None;
    }

    for (from, to) in policy::PREFIX_RENAMES {
        if let Some(rest) = url.strip_prefix(from) {
            url = format!("{to}{rest}");
            break;
        }
    }

    if url.starts_with(policy::REFERENCE_DB_PREFIX) {
        let canonical = url.trim_end_matches('/').to_string();
        return Some((canonical, SCORE_REFERENCE_DB));
    }

    if policy::HIGH_TRUST_EXACT.contains(&url.as_str()) {
        return Some((url, SCORE_HIGH_EXACT));
    }

    for prefix in policy::HIGH_TRUST_PREFIXES {
        if url.starts_with(prefix) {
            return Some((url, SCORE_HIGH_PREFIX));
        }
    }

    if let Ok(regex) = &*CVE_TOKEN
        && regex.is_match(&url)
    {
        return Some((url, SCORE_UNVERIFIED));
    }

    for prefix in policy::MEDIUM_TRUST_PREFIXES {
        if url.starts_with(prefix) {
            return Some((url, SCORE_MEDIUM));
        }
    }

    if on_code_hosting(&url) && looks_like_poc_page(&url) {
        return Some((url, SCORE_MEDIUM));
    }

    if !strict {
        debug!(url = %url, cve = %cve_id, "unclassified reference url");
    }
    None
}

fn on_code_hosting(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("https://") else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or("");
    policy::CODE_HOSTING_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

fn looks_like_poc_page(url: &str) -> bool {
    url.contains("/issues/")
        || url.contains("/-/issues/")
        || url.contains("/security/advisories/")
        || url.ends_with(".md")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CVE: &str = "CVE-2021-44228";

    #[test]
    fn exploit_db_is_canonicalized() {
        let (url, score) = classify("http://www.exploit-db.com/exploits/12345/", CVE, true)
            .expect("exploit-db must be accepted");
        assert_eq!(url, "https://www.exploit-db.com/exploits/12345");
        assert_eq!(score, SCORE_REFERENCE_DB);
    }

    #[test]
    fn forbidden_prefix_is_rejected() {
        assert_eq!(classify("https://vuldb.com/?id.123456", CVE, true), None);
        assert_eq!(
            classify("https://www.securityfocus.com/bid/98765", CVE, false),
            None
        );
    }

    #[test]
    fn dead_end_urls_are_rejected() {
        assert_eq!(
            classify("https://cert.vde.com/en-us/advisories/", CVE, true),
            None
        );
        assert_eq!(
            classify("https://www.coresecurity.com/advisories", CVE, true),
            None
        );
    }

    #[test]
    fn forbidden_exception_pair_passes_at_reduced_score() {
        let (cve, url, expected) = crate::policy::FORBIDDEN_EXCEPTION;
        let (got_url, got_score) = classify(url, cve, true).expect("exception must pass");
        assert_eq!(got_url, url);
        assert_eq!(got_score, expected);
        // Same URL for any other CVE stays rejected.
        assert_eq!(classify(url, "CVE-2020-0001", true), None);
    }

    #[test]
    fn high_trust_exact_match() {
        let (_, score) =
            classify("https://github.com/qazbnm456/awesome-cve-poc", CVE, true).unwrap();
        assert_eq!(score, SCORE_HIGH_EXACT);
    }

    #[test]
    fn high_trust_prefix_match() {
        let (_, score) = classify("https://seclists.org/fulldisclosure/2021/Dec/0", CVE, true).unwrap();
        assert_eq!(score, SCORE_HIGH_PREFIX);
        let (_, score) = classify("https://hackerone.com/reports/1427589", CVE, true).unwrap();
        assert_eq!(score, SCORE_HIGH_PREFIX);
    }

    #[test]
    fn renamed_prefix_lands_in_trust_list() {
        let (url, score) =
            classify("https://packetstormsecurity.com/files/165260/", CVE, true).unwrap();
        assert!(url.starts_with("https://packetstorm.news/"));
        assert_eq!(score, SCORE_HIGH_PREFIX);
    }

    #[test]
    fn cve_token_is_a_weak_accept() {
        let (url, score) =
            classify("https://example.org/advisories/CVE-2021-44228.html", CVE, true).unwrap();
        assert_eq!(url, "https://example.org/advisories/CVE-2021-44228.html");
        assert_eq!(score, SCORE_UNVERIFIED);
    }

    #[test]
    fn medium_trust_prefix_match() {
        let (_, score) = classify("https://medium.com/@someone/poc-writeup", CVE, true).unwrap();
        assert_eq!(score, SCORE_MEDIUM);
    }

    #[test]
    fn code_hosting_structural_fallback() {
        let (_, score) =
            classify("https://github.com/someorg/somerepo/issues/42", CVE, true).unwrap();
        assert_eq!(score, SCORE_MEDIUM);
        let (_, score) = classify(
            "https://github.com/someorg/somerepo/security/advisories/GHSA-xxxx",
            CVE,
            true,
        )
        .unwrap();
        assert_eq!(score, SCORE_MEDIUM);
        // A bare repository link on an unknown account is not enough.
        assert_eq!(
            classify("https://github.com/someorg/somerepo", CVE, true),
            None
        );
    }

    #[test]
    fn unknown_urls_are_rejected_in_both_modes() {
        assert_eq!(classify("https://example.org/blog/post", CVE, true), None);
        assert_eq!(classify("https://example.org/blog/post", CVE, false), None);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let samples = [
            "http://www.exploit-db.com/exploits/1/",
            "https://github.com/tunz/js-vuln-db",
            "https://seclists.org/x",
            "https://medium.com/x",
            "https://example.org/CVE-2020-14882",
            "https://github.com/a/b/issues/1",
        ];
        for sample in samples {
            if let Some((_, score)) = classify(sample, CVE, true) {
                assert!((0.0..=1.0).contains(&score), "{sample} -> {score}");
            }
        }
    }
}
