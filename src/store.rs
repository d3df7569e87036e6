//! Per-CVE persistence.
//!
//! One JSON file per CVE at `<year>/<CVE-ID>.json`, reconciled with a
//! single-threaded read-modify-write: open-or-create, decode what is there
//! (corrupt JSON is treated as absent), merge, recompute the summary, then
//! truncate/rewind/re-encode, or delete when the summary is empty.
//! Filesystem errors here are fatal and abort the run.

use crate::error::{PocError, Result};
use crate::models::{AggregatorResult, RunStatus};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What the reconciler did for one CVE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The merged result was written.
    Written,
    /// A previously persisted file was removed because the summary is empty.
    Deleted,
    /// The summary is empty and no file existed; nothing was persisted.
    Skipped,
}

/// Filesystem store rooted at the output directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the year directory if absent. Idempotent.
    pub fn ensure_year_dir(&self, year: &str) -> Result<()> {
        let dir = self.root.join(sanitize(year));
        fs::create_dir_all(&dir).map_err(|err| PocError::store(dir, err))
    }

    fn path_for(&self, year: &str, cve: &str) -> PathBuf {
        // The identifiers already passed the canonical-form regex; this only
        // guards against path separators sneaking in.
        self.root
            .join(sanitize(year))
            .join(format!("{}.json", sanitize(cve)))
    }

    /// Read the persisted result for a CVE, treating corrupt JSON as absent.
    pub fn load(&self, year: &str, cve: &str) -> Option<AggregatorResult> {
        let path = self.path_for(year, cve);
        let body = fs::read(&path).ok()?;
        if body.is_empty() {
            return None;
        }
        match serde_json::from_slice(&body) {
            Ok(result) => Some(result),
            Err(err) => {
                // Likely a schema migration; the fresh data wins.
                warn!(path = %path.display(), error = %err, "ignoring undecodable persisted result");
                None
            }
        }
    }

    /// Reconcile one CVE file against freshly harvested data.
    pub fn reconcile(
        &self,
        year: &str,
        cve: &str,
        mut fresh: AggregatorResult,
        status: &RunStatus,
    ) -> Result<ReconcileOutcome> {
        let path = self.path_for(year, cve);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| PocError::store(&path, err))?;
        let existed = file
            .metadata()
            .map_err(|err| PocError::store(&path, err))?
            .len()
            > 0;

        if existed {
            match serde_json::from_reader::<_, AggregatorResult>(&mut file) {
                Ok(previous) => fresh.preserve_unrefreshed(previous, status),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring undecodable persisted result");
                }
            }
        }

        fresh.compute_openpoc();
        fresh.sort();

        if fresh.is_empty() {
            drop(file);
            fs::remove_file(&path).map_err(|err| PocError::store(&path, err))?;
            return Ok(if existed {
                debug!(path = %path.display(), "removed empty result");
                ReconcileOutcome::Deleted
            } else {
                ReconcileOutcome::Skipped
            });
        }

        file.set_len(0).map_err(|err| PocError::store(&path, err))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|err| PocError::store(&path, err))?;
        serde_json::to_writer_pretty(&mut file, &fresh)?;
        file.write_all(b"\n")
            .map_err(|err| PocError::store(&path, err))?;
        Ok(ReconcileOutcome::Written)
    }
}

fn sanitize(component: &str) -> &str {
    Path::new(component)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_date;
    use crate::providers::trickest::TrickestRecord;

    fn record(url: &str, score: f64) -> TrickestRecord {
        TrickestRecord {
            cve: "CVE-2021-44228".to_string(),
            url: url.to_string(),
            added_at: default_date(),
            trust_score: score,
        }
    }

    fn all_refreshed() -> RunStatus {
        RunStatus {
            exploitdb: true,
            inthewild: true,
            trickest: true,
            nomisec: true,
            nuclei: true,
        }
    }

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.ensure_year_dir("2021").unwrap();
        (dir, store)
    }

    #[test]
    fn writes_new_result() {
        let (_dir, store) = store();
        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://a", 0.4)];

        let outcome = store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Written);

        let loaded = store.load("2021", "CVE-2021-44228").unwrap();
        assert_eq!(loaded.openpoc.len(), 1);
        assert_eq!(loaded.openpoc[0].url, "https://a");
    }

    #[test]
    fn empty_summary_creates_no_file() {
        let (dir, store) = store();
        let outcome = store
            .reconcile(
                "2021",
                "CVE-2021-44228",
                AggregatorResult::new(),
                &all_refreshed(),
            )
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Skipped);
        assert!(!dir.path().join("2021/CVE-2021-44228.json").exists());
    }

    #[test]
    fn empty_summary_deletes_existing_file() {
        let (dir, store) = store();
        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://a", 0.4)];
        store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();
        assert!(dir.path().join("2021/CVE-2021-44228.json").exists());

        // Everything refreshed to empty this run.
        let outcome = store
            .reconcile(
                "2021",
                "CVE-2021-44228",
                AggregatorResult::new(),
                &all_refreshed(),
            )
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Deleted);
        assert!(!dir.path().join("2021/CVE-2021-44228.json").exists());
    }

    #[test]
    fn unrefreshed_provider_keeps_persisted_records() {
        let (_dir, store) = store();
        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![
            record("https://a", 0.4),
            record("https://b", 0.4),
            record("https://c", 0.4),
        ];
        store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();

        // Next run: trickest failed to fetch, its fresh list is empty.
        let mut status = all_refreshed();
        status.trickest = false;
        store
            .reconcile("2021", "CVE-2021-44228", AggregatorResult::new(), &status)
            .unwrap();

        let loaded = store.load("2021", "CVE-2021-44228").unwrap();
        assert_eq!(loaded.trickest.len(), 3);
        assert_eq!(loaded.openpoc.len(), 3);
    }

    #[test]
    fn refreshed_provider_list_fully_replaces_previous() {
        let (_dir, store) = store();
        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://a", 0.4), record("https://b", 0.4)];
        store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();

        let mut replacement = AggregatorResult::new();
        replacement.trickest = vec![record("https://only", 0.4)];
        store
            .reconcile("2021", "CVE-2021-44228", replacement, &all_refreshed())
            .unwrap();

        let loaded = store.load("2021", "CVE-2021-44228").unwrap();
        assert_eq!(loaded.trickest.len(), 1);
        assert_eq!(loaded.openpoc.len(), 1);
        assert_eq!(loaded.openpoc[0].url, "https://only");
    }

    #[test]
    fn persistence_failure_is_a_fatal_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        // Year directory deliberately not created: the open must fail.
        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://a", 0.4)];
        let err = store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap_err();
        assert!(matches!(err, PocError::Store { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn corrupt_persisted_json_is_treated_as_absent() {
        let (dir, store) = store();
        std::fs::write(
            dir.path().join("2021/CVE-2021-44228.json"),
            "{definitely-not-json",
        )
        .unwrap();

        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://a", 0.4)];
        let outcome = store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Written);
        let loaded = store.load("2021", "CVE-2021-44228").unwrap();
        assert_eq!(loaded.openpoc.len(), 1);
    }

    #[test]
    fn rerun_with_identical_input_is_byte_identical() {
        let (dir, store) = store();
        let path = dir.path().join("2021/CVE-2021-44228.json");

        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://b", 0.4), record("https://a", 0.9)];
        store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();
        let first = std::fs::read(&path).unwrap();

        // Rerun with nothing refreshed: every list carries over from disk and
        // the recomputed summary must not drift.
        store
            .reconcile(
                "2021",
                "CVE-2021-44228",
                AggregatorResult::new(),
                &RunStatus::default(),
            )
            .unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn output_is_two_space_indented_json() {
        let (dir, store) = store();
        let mut fresh = AggregatorResult::new();
        fresh.trickest = vec![record("https://a", 0.4)];
        store
            .reconcile("2021", "CVE-2021-44228", fresh, &all_refreshed())
            .unwrap();
        let body =
            std::fs::read_to_string(dir.path().join("2021/CVE-2021-44228.json")).unwrap();
        assert!(body.starts_with("{\n  \""));
        assert!(body.ends_with("\n"));
    }
}
