//! Exploit-DB provider.
//!
//! Parses `files_exploits.csv` from the sparse checkout of
//! <https://gitlab.com/exploit-database/exploitdb>. One CSV row can name
//! several CVEs in its `codes` column; each becomes its own record.

use crate::cve::clean_cve;
use crate::error::Result;
use crate::models::{PocMetadata, default_date};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// One Exploit-DB reference for one CVE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploitDbRecord {
    pub cve: String,
    pub url: String,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub verified: bool,
}

impl PocMetadata for ExploitDbRecord {
    fn cve(&self) -> &str {
        &self.cve
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn publish_date(&self) -> DateTime<Utc> {
        self.published
    }

    fn trust_score(&self) -> f64 {
        // The database itself is the canonical reference (0.5); entries the
        // Exploit-DB team has verified rank above it.
        if self.verified { 0.8 } else { 0.5 }
    }
}

/// Subset of the `files_exploits.csv` columns we consume. Remaining columns
/// are ignored by name.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    #[serde(default)]
    date_published: String,
    #[serde(default)]
    verified: String,
    #[serde(default)]
    codes: String,
}

/// Parse the Exploit-DB index CSV.
///
/// Malformed rows are skipped with a warning; only I/O-level failures abort.
pub fn parse_exploitdb(csv_path: &Path) -> Result<Vec<ExploitDbRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(path = %csv_path.display(), error = %err, "skipping malformed exploitdb row");
                continue;
            }
        };

        let published = parse_published(&row.date_published);
        let verified = row.verified == "1";
        let url = format!("https://www.exploit-db.com/exploits/{}", row.id);

        // codes holds a ;-separated mix of CVE, OSVDB and vendor identifiers
        for code in row.codes.split(';') {
            let cve = clean_cve(code);
            if !cve.starts_with("CVE-") {
                continue;
            }
            records.push(ExploitDbRecord {
                cve,
                url: url.clone(),
                published,
                verified,
            });
        }
    }
    Ok(records)
}

fn parse_published(raw: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(default_date)
}
