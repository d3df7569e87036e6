//! Source acquisition: shallow git clones, sparse checkouts, HTTP downloads
//! and the freshness gate.
//!
//! The external `git` binary is driven directly; pure-Rust git
//! implementations do not cope well with shallow clones of very large
//! repositories.

use crate::error::{PocError, Result};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::process::Command;
use tracing::debug;

/// Run `git` with the given arguments in `dir` (process cwd when empty).
pub async fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    let mut command = Command::new("git");
    command.args(args);
    if dir.as_os_str().is_empty() {
        debug!(?args, "running git");
    } else {
        debug!(?args, dir = %dir.display(), "running git");
        command.current_dir(dir);
    }
    let status = command
        .status()
        .await
        .map_err(|err| PocError::command(format!("git {}", args.join(" ")), err.to_string()))?;
    if !status.success() {
        return Err(PocError::command(
            format!("git {}", args.join(" ")),
            format!("exit status {status}"),
        ));
    }
    Ok(())
}

/// Shallow-clone `url` into `dest`.
pub async fn git_clone(
    url: &str,
    dest: &Path,
    depth: u32,
    branch: &str,
    extra_args: &[&str],
) -> Result<()> {
    let depth_arg;
    let mut args: Vec<&str> = vec!["clone"];
    if depth >= 1 {
        depth_arg = depth.to_string();
        args.push("--depth");
        args.push(&depth_arg);
    }
    if !branch.is_empty() {
        args.push("--branch");
        args.push(branch);
    }
    args.extend_from_slice(extra_args);
    args.push(url);
    let dest_str = dest.to_string_lossy();
    args.push(&dest_str);
    run_git(Path::new(""), &args).await
}

/// Configure a no-checkout clone to fetch only `file`, then check out `branch`.
pub async fn sparse_checkout(folder: &Path, branch: &str, file: &str) -> Result<()> {
    run_git(folder, &["config", "core.sparseCheckout", "true"]).await?;
    let sparse_path = folder.join(".git").join("info").join("sparse-checkout");
    tokio::fs::write(&sparse_path, format!("{file}\n")).await?;
    run_git(folder, &["checkout", branch]).await
}

/// Download `url` into `dest`, creating parent directories as needed.
pub async fn download(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(PocError::source_fetch(
            url,
            format!("HTTP {}", response.status()),
        ));
    }
    let body = response.bytes().await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &body).await?;
    Ok(())
}

/// Freshness gate: true when `path` was modified within `window`.
///
/// Inside the window, harvesting skips the fetch and re-parses local data.
pub fn was_modified_within(path: &Path, window: Duration) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age <= window,
        // Modification time in the future counts as fresh.
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_is_never_fresh() {
        assert!(!was_modified_within(
            Path::new("/nonexistent/definitely-missing"),
            Duration::from_secs(3600)
        ));
    }

    #[test]
    fn just_written_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();
        assert!(was_modified_within(&path, Duration::from_secs(3600)));
    }

    #[test]
    fn zero_window_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(!was_modified_within(&path, Duration::from_millis(1)));
    }
}
