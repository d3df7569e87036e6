//! Concurrent directory harvester.
//!
//! One producer enumerates regular files into a bounded queue, a pool of
//! workers applies the processing function, and a collector drains typed
//! records. The harvest is all-or-nothing: the first error from any worker
//! cancels dispatch of further work (in-flight calls finish) and the caller
//! gets only the error.
//!
//! Traversal order is filesystem-enumeration order; determinism of the final
//! output is restored later by the aggregator's sort step.

use crate::error::{PocError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

const QUEUE_DEPTH: usize = 100;

/// Per-file processing function, run on the blocking pool.
pub type ProcessFn<T> = Arc<dyn Fn(&Path) -> Result<Vec<T>> + Send + Sync>;

/// Traverse `root` and invoke `process` concurrently on every regular file,
/// returning the union of all records or the first error.
pub async fn harvest<T: Send + 'static>(
    root: &Path,
    workers: usize,
    process: ProcessFn<T>,
) -> Result<Vec<T>> {
    let workers = workers.max(1);
    let (path_tx, path_rx) = mpsc::channel::<PathBuf>(QUEUE_DEPTH);
    let (record_tx, mut record_rx) = mpsc::channel::<T>(QUEUE_DEPTH);
    let (error_tx, mut error_rx) = mpsc::channel::<PocError>(1);
    let cancel = CancellationToken::new();

    // Producer: enumerate the tree into the bounded queue. Directories and
    // non-regular entries are skipped.
    let producer = {
        let root = root.to_path_buf();
        let cancel = cancel.clone();
        let error_tx = error_tx.clone();
        tokio::task::spawn_blocking(move || {
            for entry in WalkDir::new(&root) {
                if cancel.is_cancelled() {
                    return;
                }
                match entry {
                    Ok(entry) => {
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        // Send fails once every worker has exited.
                        if path_tx.blocking_send(entry.into_path()).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        let _ = error_tx.try_send(PocError::Walk {
                            root: root.clone(),
                            message: err.to_string(),
                        });
                        cancel.cancel();
                        return;
                    }
                }
            }
        })
    };

    let path_rx = Arc::new(Mutex::new(path_rx));
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let path_rx = path_rx.clone();
        let record_tx = record_tx.clone();
        let error_tx = error_tx.clone();
        let cancel = cancel.clone();
        let process = process.clone();
        handles.push(tokio::spawn(async move {
            loop {
                // Stop accepting new work once cancelled; the in-flight call
                // of another worker is allowed to finish.
                let path = {
                    let mut rx = path_rx.lock().await;
                    tokio::select! {
                        _ = cancel.cancelled() => None,
                        path = rx.recv() => path,
                    }
                };
                let Some(path) = path else { return };

                let process = process.clone();
                let job = path.clone();
                let outcome = tokio::task::spawn_blocking(move || process(&job)).await;
                let records = match outcome {
                    Ok(Ok(records)) => records,
                    Ok(Err(err)) => {
                        let _ = error_tx.try_send(err);
                        cancel.cancel();
                        return;
                    }
                    Err(err) => {
                        let _ = error_tx.try_send(PocError::TaskJoin(err));
                        cancel.cancel();
                        return;
                    }
                };
                for record in records {
                    if record_tx.send(record).await.is_err() {
                        return;
                    }
                }
            }
        }));
    }
    drop(record_tx);
    drop(error_tx);
    // Workers now hold the only receiver handles. When the last worker exits
    // the path channel closes, which unblocks a producer stuck on a full
    // queue; holding this handle here would deadlock the cancellation path.
    drop(path_rx);

    // Collector: drain until every worker has dropped its sender.
    let mut collected = Vec::new();
    while let Some(record) = record_rx.recv().await {
        collected.push(record);
    }

    producer.await?;
    for handle in handles {
        handle.await?;
    }

    // First error wins; records already collected for this harvest are
    // discarded with it.
    if let Some(err) = error_rx.recv().await {
        return Err(err);
    }
    Ok(collected)
}
