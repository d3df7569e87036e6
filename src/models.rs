//! Core data models for PoC aggregation.
//!
//! This module defines the [`PocMetadata`] capability implemented by every
//! provider's record type, the canonical [`OpenPocEntry`] summary unit, and
//! the per-CVE [`AggregatorResult`] container that is persisted to disk.

use crate::providers::exploitdb::ExploitDbRecord;
use crate::providers::inthewild::InTheWildRecord;
use crate::providers::nomisec::NomisecRecord;
use crate::providers::nuclei::NucleiRecord;
use crate::providers::trickest::TrickestRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Sentinel publish date meaning "unknown": the Unix epoch at midnight UTC.
///
/// Records carrying this date lose every date tie-break against a real date.
pub fn default_date() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// Capability shared by every provider's record variant.
///
/// Aggregation code is generic over this trait only, never over concrete
/// provider types.
pub trait PocMetadata {
    /// Canonical CVE identifier (already passed through [`crate::cve::clean_cve`]).
    fn cve(&self) -> &str;
    /// Canonical reference URL.
    fn url(&self) -> &str;
    /// Best known publish date, or [`default_date`] when unknown.
    fn publish_date(&self) -> DateTime<Utc>;
    /// Trust score in `[0, 1]`.
    fn trust_score(&self) -> f64;
    /// Scanner this reference is a template for ("nuclei", "nmap", ...).
    fn template_for(&self) -> &str {
        ""
    }
}

/// One deduplicated summary entry, unique by URL within a CVE.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenPocEntry {
    pub cve: String,
    pub url: String,
    pub added_at: DateTime<Utc>,
    pub trust_score: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_for: String,
}

/// Identifies one upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    ExploitDb,
    InTheWild,
    Trickest,
    Nomisec,
    Nuclei,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExploitDb => "exploitdb",
            Self::InTheWild => "inthewild",
            Self::Trickest => "trickest",
            Self::Nomisec => "nomisec",
            Self::Nuclei => "nuclei",
        }
    }
}

/// Upstream source descriptor, created at startup from static configuration.
#[derive(Debug, Clone)]
pub struct Target {
    /// Remote locator (git URL or HTTP endpoint).
    pub url: String,
    /// Local checkout folder, relative to the datasources directory.
    pub folder: String,
    /// Branch to check out (git sources only).
    pub branch: String,
    /// Freshness window: inside it, local data is re-parsed without fetching.
    pub freshness: Duration,
}

/// Which providers produced a complete data set this run.
///
/// A provider whose flag is `false` (fetch failed, skipped, or disabled)
/// keeps its previously persisted lists during the merge; a transient
/// failure never erases known data.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStatus {
    pub exploitdb: bool,
    pub inthewild: bool,
    pub trickest: bool,
    pub nomisec: bool,
    pub nuclei: bool,
}

impl RunStatus {
    pub fn refreshed(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::ExploitDb => self.exploitdb,
            ProviderKind::InTheWild => self.inthewild,
            ProviderKind::Trickest => self.trickest,
            ProviderKind::Nomisec => self.nomisec,
            ProviderKind::Nuclei => self.nuclei,
        }
    }

    pub fn set_refreshed(&mut self, kind: ProviderKind, value: bool) {
        match kind {
            ProviderKind::ExploitDb => self.exploitdb = value,
            ProviderKind::InTheWild => self.inthewild = value,
            ProviderKind::Trickest => self.trickest = value,
            ProviderKind::Nomisec => self.nomisec = value,
            ProviderKind::Nuclei => self.nuclei = value,
        }
    }
}

/// Per-CVE container of raw per-provider record lists plus the computed
/// summary. Unit of persistence: one JSON file at `<year>/<CVE-ID>.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatorResult {
    #[serde(default)]
    pub exploitdb: Vec<ExploitDbRecord>,
    #[serde(default, rename = "itw")]
    pub inthewild: Vec<InTheWildRecord>,
    #[serde(default)]
    pub trickest: Vec<TrickestRecord>,
    #[serde(default)]
    pub nomisec: Vec<NomisecRecord>,
    #[serde(default)]
    pub nuclei: Vec<NucleiRecord>,
    #[serde(default)]
    pub openpoc: Vec<OpenPocEntry>,
}

impl AggregatorResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the lists of providers that did not refresh this run with the
    /// previously persisted lists, so a transient failure never erases data.
    pub fn preserve_unrefreshed(&mut self, previous: AggregatorResult, status: &RunStatus) {
        if !status.exploitdb {
            self.exploitdb = previous.exploitdb;
        }
        if !status.inthewild {
            self.inthewild = previous.inthewild;
        }
        if !status.trickest {
            self.trickest = previous.trickest;
        }
        if !status.nomisec {
            self.nomisec = previous.nomisec;
        }
        if !status.nuclei {
            self.nuclei = previous.nuclei;
        }
    }

    /// Compute the deduplicated summary list from the provider lists.
    ///
    /// Provider lists are visited in a fixed priority order, least-curated
    /// first, so that later (more curated) providers win URL collisions.
    pub fn compute_openpoc(&mut self) {
        let mut merger: HashMap<String, OpenPocEntry> = HashMap::new();
        for record in &self.trickest {
            upsert_entry(record, &mut merger);
        }
        for record in &self.inthewild {
            upsert_entry(record, &mut merger);
        }
        for record in &self.exploitdb {
            upsert_entry(record, &mut merger);
        }
        for record in &self.nomisec {
            upsert_entry(record, &mut merger);
        }
        for record in &self.nuclei {
            upsert_entry(record, &mut merger);
        }
        self.openpoc = merger.into_values().collect();
    }

    /// Sort every provider list and the summary list by URL for
    /// reproducible output.
    pub fn sort(&mut self) {
        self.exploitdb.sort_by(|a, b| a.url().cmp(b.url()));
        self.inthewild.sort_by(|a, b| a.url().cmp(b.url()));
        self.trickest.sort_by(|a, b| a.url().cmp(b.url()));
        self.nomisec.sort_by(|a, b| a.url().cmp(b.url()));
        self.nuclei.sort_by(|a, b| a.url().cmp(b.url()));
        self.openpoc.sort_by(|a, b| a.url.cmp(&b.url));
    }

    /// A result with an empty summary is never persisted as a file.
    pub fn is_empty(&self) -> bool {
        self.openpoc.is_empty()
    }
}

/// Upsert one record into the URL-keyed summary map.
///
/// Unseen URL: new entry. Seen URL: raise the trust score to the maximum and
/// keep the earliest genuine date (the sentinel is always replaced, and
/// never replaces a real date).
fn upsert_entry<T: PocMetadata>(record: &T, merger: &mut HashMap<String, OpenPocEntry>) {
    match merger.get_mut(record.url()) {
        None => {
            merger.insert(
                record.url().to_string(),
                OpenPocEntry {
                    cve: record.cve().to_string(),
                    url: record.url().to_string(),
                    added_at: record.publish_date(),
                    trust_score: record.trust_score(),
                    template_for: record.template_for().to_string(),
                },
            );
        }
        Some(entry) => {
            if record.trust_score() > entry.trust_score {
                entry.trust_score = record.trust_score();
            }
            let incoming = record.publish_date();
            if entry.added_at == default_date() {
                entry.added_at = incoming;
            } else if incoming != default_date() && incoming < entry.added_at {
                // Earliest genuine date wins as a proxy for true discovery date.
                entry.added_at = incoming;
            }
            if entry.template_for.is_empty() {
                entry.template_for = record.template_for().to_string();
            }
        }
    }
}
