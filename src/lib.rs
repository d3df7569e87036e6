//! openpoc aggregates public proof-of-concept exploit references per CVE.
//!
//! Five upstream providers (exploit-db, inthewild.io, trickest/cve,
//! nomi-sec/PoC-in-GitHub, projectdiscovery/nuclei-templates) are fetched,
//! parsed concurrently, classified by URL trust, aggregated per CVE and
//! reconciled against the previously persisted per-year JSON tree.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod cve;
pub mod error;
pub mod fetch;
pub mod gitdate;
pub mod harvester;
pub mod logging;
pub mod manager;
pub mod models;
pub mod policy;
pub mod providers;
pub mod store;

pub use config::Config;
pub use error::{PocError, Result};
pub use manager::PocManager;
