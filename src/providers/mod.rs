//! Upstream PoC reference providers.
//!
//! Each provider contributes records for CVEs in its own native shape; the
//! only contract the aggregation core depends on is the
//! [`crate::models::PocMetadata`] capability implemented by every record
//! variant.
//!
//! # Available Providers
//!
//! - [`exploitdb`] - Exploit-DB (`files_exploits.csv`, sparse git checkout)
//! - [`inthewild`] - inTheWild (`pocs.json`, HTTP download)
//! - [`trickest`] - trickest/cve (per-CVE Markdown plus a references index)
//! - [`nomisec`] - nomi-sec/PoC-in-GitHub (per-CVE JSON repository metadata)
//! - [`nuclei`] - projectdiscovery/nuclei-templates (template filenames)

pub mod exploitdb;
pub mod inthewild;
pub mod nomisec;
pub mod nuclei;
pub mod trickest;
