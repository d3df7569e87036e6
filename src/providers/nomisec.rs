//! nomi-sec/PoC-in-GitHub provider.
//!
//! The upstream repository keeps one JSON file per CVE, each holding a list
//! of GitHub repositories with their full API metadata. The CVE identifier
//! is taken from the file name, the trust score from the star count.

use crate::cve::clean_cve;
use crate::error::Result;
use crate::models::{PocMetadata, default_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// One GitHub repository referencing a CVE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NomisecRecord {
    #[serde(rename = "cveId", default)]
    pub cve: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub owner: Option<RepositoryOwner>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub watchers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub visibility: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryOwner {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub html_url: String,
}

impl PocMetadata for NomisecRecord {
    fn cve(&self) -> &str {
        &self.cve
    }

    fn url(&self) -> &str {
        &self.html_url
    }

    fn publish_date(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(default_date)
    }

    fn trust_score(&self) -> f64 {
        // Stars as a crude reputation proxy, saturating at 1k.
        if self.stargazers_count > 1000 {
            1.0
        } else {
            f64::from(self.stargazers_count) / 1000.0
        }
    }
}

/// Is this file a per-CVE JSON document worth parsing?
pub fn is_candidate(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("CVE-"))
}

/// Parse one per-CVE JSON file.
///
/// An undecodable file is skipped with a warning so one bad upstream commit
/// cannot take down the whole harvest; only read failures propagate.
pub fn parse_nomisec(json_path: &Path) -> Result<Vec<NomisecRecord>> {
    let stem = json_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let cve = clean_cve(stem);

    let body = std::fs::read(json_path)?;
    let mut records: Vec<NomisecRecord> = match serde_json::from_slice(&body) {
        Ok(records) => records,
        Err(err) => {
            warn!(path = %json_path.display(), error = %err, "skipping undecodable nomisec file");
            return Ok(vec![]);
        }
    };
    for record in &mut records {
        record.cve = cve.clone();
    }
    Ok(records)
}
