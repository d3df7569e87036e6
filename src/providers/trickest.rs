//! trickest/cve provider.
//!
//! Two inputs from <https://github.com/trickest/cve>: per-CVE Markdown files
//! whose `### POC` section lists reference links, and a flat
//! `references.txt` index of `CVE - URL` lines. The index is the more
//! trustworthy set but carries no dates, so Markdown metadata wins on URL
//! match and unmatched Markdown records are appended.

use crate::classifier::classify;
use crate::cve::clean_cve;
use crate::error::Result;
use crate::gitdate::{DateCache, date_from_git};
use crate::models::{PocMetadata, default_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use tracing::warn;

/// One trickest reference for one CVE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrickestRecord {
    #[serde(rename = "id")]
    pub cve: String,
    pub url: String,
    pub added_at: DateTime<Utc>,
    /// Assigned by the classifier at parse time. Persisted so the summary
    /// recomputed from carried-over lists keeps its scores.
    #[serde(default)]
    pub trust_score: f64,
}

impl PocMetadata for TrickestRecord {
    fn cve(&self) -> &str {
        &self.cve
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn publish_date(&self) -> DateTime<Utc> {
        self.added_at
    }

    fn trust_score(&self) -> f64 {
        self.trust_score
    }

    fn template_for(&self) -> &str {
        if self.url.starts_with("https://seclists.org/fulldisclosure/") {
            "nmap"
        } else {
            ""
        }
    }
}

/// Is this file a per-CVE Markdown document worth parsing?
pub fn is_markdown_candidate(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("CVE-"))
}

/// Parse one per-CVE Markdown file.
///
/// The CVE identifier comes from the file name; the publish date from the
/// git history of the checkout (memoized in `cache`).
pub fn parse_markdown(
    root: &Path,
    markdown_path: &Path,
    cache: &DateCache,
) -> Result<Vec<TrickestRecord>> {
    let stem = markdown_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let cve = clean_cve(stem);

    let body = std::fs::read_to_string(markdown_path)?;
    let rel_path = markdown_path
        .strip_prefix(root)
        .unwrap_or(markdown_path)
        .to_string_lossy()
        .replace('\\', "/");

    let urls = extract_poc_links(&body);
    if urls.is_empty() {
        return Ok(vec![]);
    }
    let added_at = date_from_git(root, &rel_path, cache, default_date());

    let mut records = Vec::new();
    for url in urls {
        let Some((canonical, score)) = classify(&url, &cve, true) else {
            continue;
        };
        records.push(TrickestRecord {
            cve: cve.clone(),
            url: canonical,
            added_at,
            trust_score: score,
        });
    }
    Ok(records)
}

/// Parse the `references.txt` index (`CVE-YYYY-NNNN - URL` per line).
///
/// Malformed lines are skipped with a warning. Reference entries carry the
/// sentinel date; the Markdown merge fills in real dates where it can.
pub fn parse_references(text_path: &Path) -> Result<Vec<TrickestRecord>> {
    let file = std::fs::File::open(text_path)?;
    let reader = std::io::BufReader::new(file);

    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((raw_cve, raw_url)) = line.split_once(" - ") else {
            warn!(path = %text_path.display(), line = %line, "skipping malformed trickest reference");
            continue;
        };
        let cve = clean_cve(raw_cve);
        // Unknown URLs are surfaced (strict=false) but stay inadmissible.
        let Some((url, score)) = classify(raw_url, &cve, false) else {
            continue;
        };
        records.push(TrickestRecord {
            cve,
            url,
            added_at: default_date(),
            trust_score: score,
        });
    }
    Ok(records)
}

/// Union the Markdown records into the reference records.
///
/// On URL match the reference entry adopts the Markdown date and score;
/// Markdown records without a reference counterpart are appended.
pub fn merge_references(
    markdown: Vec<TrickestRecord>,
    mut references: Vec<TrickestRecord>,
) -> Vec<TrickestRecord> {
    for candidate in markdown {
        match references.iter_mut().find(|r| r.url == candidate.url) {
            Some(reference) => {
                reference.added_at = candidate.added_at;
                reference.trust_score = candidate.trust_score;
            }
            None => references.push(candidate),
        }
    }
    references
}

/// Collect link list items under the `### POC` heading.
fn extract_poc_links(body: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut in_poc_section = false;
    for line in body.lines() {
        if line.starts_with("### ") {
            in_poc_section = line.starts_with("### POC");
            continue;
        }
        if !in_poc_section {
            continue;
        }
        let Some(item) = line.strip_prefix('-') else {
            continue;
        };
        let candidate = item.trim().split_whitespace().next().unwrap_or_default();
        if candidate.is_empty() || !candidate.starts_with("http") {
            continue;
        }
        // Normalize the scheme here so the list stays free of duplicates
        // that differ only by http/https.
        let trimmed = candidate
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        urls.push(format!("https://{trimmed}"));
    }
    urls
}
