//! inTheWild provider.
//!
//! Parses the `pocs.json` payload downloaded from
//! <https://inthewild.io/api/exploits>. Timestamps come in two shapes
//! (RFC 3339 and bare dates); report URLs run through the trust classifier
//! and records with inadmissible URLs are dropped.

use crate::classifier::classify;
use crate::cve::clean_cve;
use crate::error::Result;
use crate::models::{PocMetadata, default_date};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One inTheWild exploit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InTheWildRecord {
    #[serde(rename = "id")]
    pub cve: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "referenceURL", default)]
    pub reference_url: String,
    #[serde(rename = "reportURL", default)]
    pub report_url: String,
    #[serde(
        rename = "timeStamp",
        deserialize_with = "deserialize_lenient_timestamp",
        default = "default_date"
    )]
    pub timestamp: DateTime<Utc>,
    /// Assigned by the classifier at parse time. Persisted so the summary
    /// recomputed from carried-over lists keeps its scores.
    #[serde(default)]
    pub trust_score: f64,
}

impl PocMetadata for InTheWildRecord {
    fn cve(&self) -> &str {
        &self.cve
    }

    fn url(&self) -> &str {
        &self.report_url
    }

    fn publish_date(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn trust_score(&self) -> f64 {
        self.trust_score
    }
}

/// Parse the downloaded `pocs.json` file.
///
/// Records whose report URL the classifier rejects are dropped here, so the
/// aggregator only ever sees admissible references.
pub fn parse_inthewild(json_path: &Path) -> Result<Vec<InTheWildRecord>> {
    let body = std::fs::read(json_path)?;
    let raw: Vec<InTheWildRecord> = serde_json::from_slice(&body)?;

    let mut records = Vec::with_capacity(raw.len());
    for mut record in raw {
        record.cve = clean_cve(&record.cve);
        let Some((canonical, score)) = classify(&record.report_url, &record.cve, true) else {
            continue;
        };
        record.report_url = canonical;
        record.trust_score = score;
        records.push(record);
    }
    Ok(records)
}

/// Accept both RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
fn deserialize_lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&s) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        && let Some(parsed) = parsed.and_hms_opt(0, 0, 0)
    {
        return Ok(parsed.and_utc());
    }
    Err(serde::de::Error::custom(format!("unrecognized timestamp: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    #[test]
    fn parses_both_timestamp_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pocs.json");
        fs::write(
            &path,
            r#"[
              {"id": "CVE-2021-44228", "referenceURL": "", "reportURL": "https://www.exploit-db.com/exploits/50592/", "timeStamp": "2021-12-11T09:30:00Z"},
              {"id": "cve-2019-19781", "referenceURL": "", "reportURL": "https://github.com/projectzeroindia/CVE-2019-19781", "timeStamp": "2020-01-11"}
            ]"#,
        )
        .unwrap();

        let records = parse_inthewild(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2021, 12, 11, 9, 30, 0).unwrap()
        );
        assert_eq!(records[0].report_url, "https://www.exploit-db.com/exploits/50592");
        assert_eq!(records[0].trust_score, 0.5);
        assert_eq!(records[1].cve, "CVE-2019-19781");
        assert_eq!(
            records[1].timestamp,
            Utc.with_ymd_and_hms(2020, 1, 11, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejected_report_urls_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pocs.json");
        fs::write(
            &path,
            r#"[{"id": "CVE-2020-0001", "referenceURL": "", "reportURL": "https://vuldb.com/?id.151234", "timeStamp": "2020-02-02"}]"#,
        )
        .unwrap();
        assert!(parse_inthewild(&path).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pocs.json");
        fs::write(&path, "{not json").unwrap();
        assert!(parse_inthewild(&path).is_err());
    }
}
