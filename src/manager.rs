//! Run orchestration.
//!
//! One run refreshes each provider in turn (fetch gated by a freshness
//! window, then harvest), aggregates everything by (year, CVE) and
//! reconciles the per-CVE files on disk. A provider that fails to fetch or
//! parse is skipped for the run: its flag in [`RunStatus`] stays `false`, so
//! reconciliation keeps the previously persisted lists instead of erasing
//! them. Only filesystem errors during persistence abort the run.

use crate::aggregator::{HarvestOutput, build_year_map};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{download, git_clone, run_git, sparse_checkout, was_modified_within};
use crate::gitdate::DateCache;
use crate::harvester::{ProcessFn, harvest};
use crate::models::{ProviderKind, RunStatus, Target};
use crate::providers::exploitdb::{self, ExploitDbRecord};
use crate::providers::inthewild::{self, InTheWildRecord};
use crate::providers::nomisec::{self, NomisecRecord};
use crate::providers::nuclei::{self, NucleiRecord};
use crate::providers::trickest::{self, TrickestRecord};
use crate::store::FileStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const HOUR: u64 = 3600;

fn exploitdb_target() -> Target {
    Target {
        url: "https://gitlab.com/exploit-database/exploitdb.git".to_string(),
        folder: "exploitdb".to_string(),
        branch: "main".to_string(),
        freshness: Duration::from_secs(24 * HOUR),
    }
}

fn inthewild_target() -> Target {
    Target {
        url: "https://inthewild.io/api/exploits".to_string(),
        folder: "inthewild".to_string(),
        branch: String::new(),
        // The API export moves slowly; four days between pulls is plenty.
        freshness: Duration::from_secs(96 * HOUR),
    }
}

fn trickest_target() -> Target {
    Target {
        url: "https://github.com/trickest/cve.git".to_string(),
        folder: "trickest-cve".to_string(),
        branch: "main".to_string(),
        freshness: Duration::from_secs(24 * HOUR),
    }
}

fn nomisec_target() -> Target {
    Target {
        url: "https://github.com/nomi-sec/PoC-in-GitHub.git".to_string(),
        folder: "poc-in-github".to_string(),
        branch: "master".to_string(),
        freshness: Duration::from_secs(24 * HOUR),
    }
}

fn nuclei_target() -> Target {
    Target {
        url: "https://github.com/projectdiscovery/nuclei-templates.git".to_string(),
        folder: "nuclei-templates".to_string(),
        branch: "main".to_string(),
        freshness: Duration::from_secs(24 * HOUR),
    }
}

/// Drives one full aggregation run.
pub struct PocManager {
    config: Config,
    store: FileStore,
}

impl PocManager {
    pub fn new(config: Config) -> Self {
        let store = FileStore::new(config.output_dir.clone());
        Self { config, store }
    }

    /// Refresh every provider, aggregate and persist.
    pub async fn run(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.datasources_dir).await?;

        let mut output = HarvestOutput::default();
        let mut status = RunStatus::default();

        match self.run_exploitdb().await {
            Ok(records) => {
                info!(records = records.len(), "exploitdb harvested");
                output.exploitdb = records;
                status.set_refreshed(ProviderKind::ExploitDb, true);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(error = %err, "skipping exploitdb this run"),
        }

        match self.run_inthewild().await {
            Ok(records) => {
                info!(records = records.len(), "inthewild harvested");
                output.inthewild = records;
                status.set_refreshed(ProviderKind::InTheWild, true);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(error = %err, "skipping inthewild this run"),
        }

        match self.run_trickest().await {
            Ok(records) => {
                info!(records = records.len(), "trickest harvested");
                output.trickest = records;
                status.set_refreshed(ProviderKind::Trickest, true);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(error = %err, "skipping trickest this run"),
        }

        match self.run_nomisec().await {
            Ok(records) => {
                info!(records = records.len(), "nomisec harvested");
                output.nomisec = records;
                status.set_refreshed(ProviderKind::Nomisec, true);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(error = %err, "skipping nomisec this run"),
        }

        match self.run_nuclei().await {
            Ok(records) => {
                info!(records = records.len(), "nuclei harvested");
                output.nuclei = records;
                status.set_refreshed(ProviderKind::Nuclei, true);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => warn!(error = %err, "skipping nuclei this run"),
        }

        self.persist(output, &status)
    }

    fn persist(&self, output: HarvestOutput, status: &RunStatus) -> Result<()> {
        let year_map = build_year_map(output);
        let mut written = 0usize;
        for (year, results) in year_map {
            self.store.ensure_year_dir(&year)?;
            for (cve, fresh) in results {
                if let Err(err) = self.store.reconcile(&year, &cve, fresh, status) {
                    error!(%cve, error = %err, "could not persist result");
                    return Err(err);
                }
                written += 1;
            }
        }
        info!(cves = written, "run complete");
        Ok(())
    }

    fn folder(&self, target: &Target) -> PathBuf {
        self.config.datasources_dir.join(&target.folder)
    }

    /// exploit-db's GitLab mirror. Only the exploit index CSV is needed, so
    /// the clone is no-checkout with a sparse checkout of that one file.
    async fn run_exploitdb(&self) -> Result<Vec<ExploitDbRecord>> {
        let target = exploitdb_target();
        let folder = self.folder(&target);
        let csv_path = folder.join("files_exploits.csv");

        if !was_modified_within(&csv_path, target.freshness) {
            refresh_dir(&folder).await?;
            git_clone(&target.url, &folder, 1, &target.branch, &["--no-checkout"]).await?;
            sparse_checkout(&folder, &target.branch, "files_exploits.csv").await?;
        } else {
            info!(path = %csv_path.display(), "exploitdb data fresh, skipping fetch");
        }

        let path = csv_path.clone();
        tokio::task::spawn_blocking(move || exploitdb::parse_exploitdb(&path)).await?
    }

    /// inthewild.io's exploit API export, a single JSON document.
    async fn run_inthewild(&self) -> Result<Vec<InTheWildRecord>> {
        let target = inthewild_target();
        let json_path = self.folder(&target).join("pocs.json");

        if !was_modified_within(&json_path, target.freshness) {
            download(&target.url, &json_path).await?;
        } else {
            info!(path = %json_path.display(), "inthewild data fresh, skipping fetch");
        }

        let path = json_path.clone();
        tokio::task::spawn_blocking(move || inthewild::parse_inthewild(&path)).await?
    }

    /// trickest/cve: per-CVE Markdown plus the references.txt index.
    ///
    /// The clone keeps full history because publish dates come from
    /// `git log` on each Markdown file; those lookups are memoized in an
    /// optionally encrypted cache that survives across runs.
    async fn run_trickest(&self) -> Result<Vec<TrickestRecord>> {
        let target = trickest_target();
        let folder = self.folder(&target);
        let references_path = folder.join("references.txt");

        if !was_modified_within(&references_path, target.freshness) {
            if folder.join(".git").exists() {
                run_git(&folder, &["pull", "--ff-only"]).await?;
            } else {
                refresh_dir(&folder).await?;
                git_clone(&target.url, &folder, 0, &target.branch, &[]).await?;
            }
        } else {
            info!(path = %references_path.display(), "trickest data fresh, skipping fetch");
        }

        let cache_path = self.config.datasources_dir.join("trickest.dates");
        let key = self.config.cache_key.as_deref();
        let cache = Arc::new(DateCache::load(&cache_path, key));

        let root = folder.clone();
        let harvest_cache = cache.clone();
        let process: ProcessFn<TrickestRecord> = Arc::new(move |path: &Path| {
            if !trickest::is_markdown_candidate(path) {
                return Ok(vec![]);
            }
            trickest::parse_markdown(&root, path, &harvest_cache)
        });
        let markdown = harvest(&folder, self.config.workers, process).await?;

        cache.save(&cache_path, key);

        let references = {
            let path = references_path.clone();
            tokio::task::spawn_blocking(move || trickest::parse_references(&path)).await??
        };
        Ok(trickest::merge_references(markdown, references))
    }

    /// nomi-sec/PoC-in-GitHub: one JSON file per CVE.
    async fn run_nomisec(&self) -> Result<Vec<NomisecRecord>> {
        let target = nomisec_target();
        let folder = self.folder(&target);

        if !was_modified_within(&folder.join("README.md"), target.freshness) {
            refresh_dir(&folder).await?;
            git_clone(&target.url, &folder, 1, &target.branch, &[]).await?;
        } else {
            info!(path = %folder.display(), "nomisec data fresh, skipping fetch");
        }

        let process: ProcessFn<NomisecRecord> = Arc::new(|path: &Path| {
            if !nomisec::is_candidate(path) {
                return Ok(vec![]);
            }
            nomisec::parse_nomisec(path)
        });
        harvest(&folder, self.config.workers, process).await
    }

    /// projectdiscovery/nuclei-templates: one YAML template per CVE.
    async fn run_nuclei(&self) -> Result<Vec<NucleiRecord>> {
        let target = nuclei_target();
        let folder = self.folder(&target);

        if !was_modified_within(&folder.join("README.md"), target.freshness) {
            refresh_dir(&folder).await?;
            git_clone(&target.url, &folder, 1, &target.branch, &[]).await?;
        } else {
            info!(path = %folder.display(), "nuclei data fresh, skipping fetch");
        }

        let root = folder.clone();
        let process: ProcessFn<NucleiRecord> = Arc::new(move |path: &Path| {
            if !nuclei::is_candidate(path) {
                return Ok(vec![]);
            }
            nuclei::parse_template(&root, path)
        });
        harvest(&folder, self.config.workers, process).await
    }
}

/// Remove a stale checkout so the next clone starts from scratch.
async fn refresh_dir(folder: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(folder).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
