//! Cross-provider aggregation.
//!
//! Groups every incoming record under its (year, CVE) key. Records with
//! unparseable CVE identifiers are dropped with a warning, never grouped and
//! never fatal. The reconciliation against previously persisted state and
//! the summary computation live on [`AggregatorResult`] itself.

use crate::cve::cve_year;
use crate::models::{AggregatorResult, PocMetadata};
use crate::providers::exploitdb::ExploitDbRecord;
use crate::providers::inthewild::InTheWildRecord;
use crate::providers::nomisec::NomisecRecord;
use crate::providers::nuclei::NucleiRecord;
use crate::providers::trickest::TrickestRecord;
use std::collections::HashMap;
use tracing::warn;

/// Everything one run harvested, per provider.
#[derive(Debug, Default)]
pub struct HarvestOutput {
    pub exploitdb: Vec<ExploitDbRecord>,
    pub inthewild: Vec<InTheWildRecord>,
    pub trickest: Vec<TrickestRecord>,
    pub nomisec: Vec<NomisecRecord>,
    pub nuclei: Vec<NucleiRecord>,
}

/// year -> CVE id -> fresh (not yet reconciled) per-CVE result.
pub type YearMap = HashMap<String, HashMap<String, AggregatorResult>>;

/// Group all harvested records by (year, CVE).
pub fn build_year_map(output: HarvestOutput) -> YearMap {
    let mut year_map: YearMap = HashMap::new();

    for record in output.exploitdb {
        if let Some(result) = slot_for(&mut year_map, &record) {
            result.exploitdb.push(record);
        }
    }
    for record in output.inthewild {
        if let Some(result) = slot_for(&mut year_map, &record) {
            result.inthewild.push(record);
        }
    }
    for record in output.trickest {
        if let Some(result) = slot_for(&mut year_map, &record) {
            result.trickest.push(record);
        }
    }
    for record in output.nomisec {
        if let Some(result) = slot_for(&mut year_map, &record) {
            result.nomisec.push(record);
        }
    }
    for record in output.nuclei {
        if let Some(result) = slot_for(&mut year_map, &record) {
            result.nuclei.push(record);
        }
    }

    year_map
}

/// Locate (or create) the per-CVE result a record belongs to.
fn slot_for<'a, T: PocMetadata>(
    year_map: &'a mut YearMap,
    record: &T,
) -> Option<&'a mut AggregatorResult> {
    let Some(year) = cve_year(record.cve()) else {
        warn!(cve = %record.cve(), url = %record.url(), "dropping record with unparseable CVE id");
        return None;
    };
    Some(
        year_map
            .entry(year)
            .or_default()
            .entry(record.cve().to_string())
            .or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_date;

    fn trickest(cve: &str, url: &str) -> TrickestRecord {
        TrickestRecord {
            cve: cve.to_string(),
            url: url.to_string(),
            added_at: default_date(),
            trust_score: 0.4,
        }
    }

    #[test]
    fn groups_by_year_and_cve() {
        let output = HarvestOutput {
            trickest: vec![
                trickest("CVE-2021-44228", "https://a"),
                trickest("CVE-2021-44228", "https://b"),
                trickest("CVE-2019-19781", "https://c"),
            ],
            nuclei: vec![NucleiRecord {
                cve: "CVE-2021-44228".to_string(),
                url: "https://github.com/projectdiscovery/nuclei-templates/blob/main/x.yaml"
                    .to_string(),
                template_path: "x.yaml".to_string(),
                added_at: default_date(),
            }],
            ..Default::default()
        };

        let year_map = build_year_map(output);
        assert_eq!(year_map.len(), 2);
        let log4shell = &year_map["2021"]["CVE-2021-44228"];
        assert_eq!(log4shell.trickest.len(), 2);
        assert_eq!(log4shell.nuclei.len(), 1);
        assert_eq!(year_map["2019"]["CVE-2019-19781"].trickest.len(), 1);
    }

    #[test]
    fn unparseable_cve_is_dropped_not_fatal() {
        let output = HarvestOutput {
            trickest: vec![
                trickest("not-a-cve", "https://a"),
                trickest("CVE-2018-7", "https://b"), // short serial never reaches grouping
                trickest("CVE-2021-44228", "https://c"),
            ],
            ..Default::default()
        };
        let year_map = build_year_map(output);
        assert_eq!(year_map.len(), 1);
        assert_eq!(year_map["2021"].len(), 1);
    }

    #[test]
    fn summary_merges_across_providers() {
        let output = HarvestOutput {
            trickest: vec![trickest("CVE-2021-44228", "https://dup")],
            nomisec: vec![NomisecRecord {
                cve: "CVE-2021-44228".to_string(),
                html_url: "https://dup".to_string(),
                stargazers_count: 900, // 0.9
                id: 1,
                name: String::new(),
                full_name: String::new(),
                owner: None,
                description: None,
                fork: false,
                created_at: None,
                updated_at: None,
                pushed_at: None,
                watchers_count: 0,
                forks_count: 0,
                topics: vec![],
                visibility: String::new(),
            }],
            ..Default::default()
        };

        let mut year_map = build_year_map(output);
        let result = year_map
            .get_mut("2021")
            .and_then(|m| m.get_mut("CVE-2021-44228"))
            .unwrap();
        result.compute_openpoc();
        result.sort();
        assert_eq!(result.openpoc.len(), 1);
        assert_eq!(result.openpoc[0].trust_score, 0.9);
    }
}
