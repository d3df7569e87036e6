//! nuclei-templates provider.
//!
//! Every CVE template in <https://github.com/projectdiscovery/nuclei-templates>
//! is itself a working detection/exploitation recipe, so the reference URL is
//! the template's location in the repository and the trust score is fixed at
//! the maximum. The template content is never parsed; the filename carries
//! everything needed.

use crate::cve::clean_cve;
use crate::error::Result;
use crate::models::{PocMetadata, default_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One nuclei CVE template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NucleiRecord {
    #[serde(rename = "cveId")]
    pub cve: String,
    pub url: String,
    pub template_path: String,
    pub added_at: DateTime<Utc>,
}

impl PocMetadata for NucleiRecord {
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
        1.0
    }

    fn template_for(&self) -> &str {
        "nuclei"
    }
}

/// Is this file a CVE template?
pub fn is_candidate(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("yaml")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("CVE-"))
}

/// Build the record for one template file.
pub fn parse_template(root: &Path, yaml_path: &Path) -> Result<Vec<NucleiRecord>> {
    let stem = yaml_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    // Some templates carry a suffix after the CVE id; keep only the id part.
    let parts: Vec<&str> = stem.split('-').collect();
    let cve = if parts.len() > 3 {
        clean_cve(&format!("CVE-{}-{}", parts[1], parts[2]))
    } else {
        clean_cve(stem)
    };

    let rel_path = yaml_path
        .strip_prefix(root)
        .unwrap_or(yaml_path)
        .to_string_lossy()
        .replace('\\', "/");

    Ok(vec![NucleiRecord {
        cve,
        url: format!("https://github.com/projectdiscovery/nuclei-templates/blob/main/{rel_path}"),
        template_path: rel_path,
        added_at: default_date(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_detection() {
        assert!(is_candidate(Path::new("http/cves/2021/CVE-2021-44228.yaml")));
        assert!(!is_candidate(Path::new("http/cves/2021/CVE-2021-44228.yml")));
        assert!(!is_candidate(Path::new("http/technologies/apache.yaml")));
    }

    #[test]
    fn builds_record_from_filename() {
        let root = Path::new("/data/nuclei-templates");
        let records = parse_template(
            root,
            Path::new("/data/nuclei-templates/http/cves/2021/CVE-2021-44228.yaml"),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cve, "CVE-2021-44228");
        assert_eq!(
            records[0].url,
            "https://github.com/projectdiscovery/nuclei-templates/blob/main/http/cves/2021/CVE-2021-44228.yaml"
        );
        assert_eq!(records[0].template_for(), "nuclei");
        assert_eq!(records[0].trust_score(), 1.0);
    }

    #[test]
    fn suffixed_template_name_is_trimmed_to_the_cve() {
        let root = Path::new("/data/nuclei-templates");
        let records = parse_template(
            root,
            Path::new("/data/nuclei-templates/http/cves/2018/CVE-2018-7600-drupalgeddon2.yaml"),
        )
        .unwrap();
        assert_eq!(records[0].cve, "CVE-2018-7600");
    }
}
