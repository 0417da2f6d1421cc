//! Worker pool for per-document analysis.
//!
//! Each worker owns its document end-to-end: read through the
//! [`DocumentSource`], then extract/classify/score on a blocking thread
//! (parsing is CPU-bound). A source failure degrades that one document to
//! a filename-only record and never aborts sibling work.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analyzer::{degraded_record, process_document};
use crate::{Config, DocumentSource, ProgressEvent, Record};

/// One document analysis job submitted to the pool.
pub struct DocJob {
    pub path: PathBuf,
    /// Path relative to the scan root, used as the record identity.
    pub rel_path: String,
    pub index: usize,
    pub total: usize,
    pub result_tx: oneshot::Sender<Record>,
    /// Progress callback for this job.
    pub progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
}

/// A pool of worker tasks that process document analysis jobs.
///
/// Submit jobs via [`submit()`](AnalysisPool::submit), receive records via
/// the oneshot receiver paired with each job.
pub struct AnalysisPool {
    job_tx: async_channel::Sender<DocJob>,
    pool_handle: JoinHandle<()>,
}

impl AnalysisPool {
    /// Create a new pool with `num_workers` worker tasks.
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn DocumentSource>,
        cancel: CancellationToken,
        num_workers: usize,
    ) -> Self {
        let (job_tx, job_rx) = async_channel::unbounded::<DocJob>();

        let pool_handle = tokio::spawn(async move {
            let mut handles = Vec::with_capacity(num_workers.max(1));
            for _ in 0..num_workers.max(1) {
                handles.push(tokio::spawn(worker_loop(
                    job_rx.clone(),
                    config.clone(),
                    source.clone(),
                    cancel.clone(),
                )));
            }

            // Drop our clone so workers are the last holders.
            drop(job_rx);

            for h in handles {
                let _ = h.await;
            }
        });

        Self {
            job_tx,
            pool_handle,
        }
    }

    /// Submit a job to the pool.
    pub async fn submit(&self, job: DocJob) {
        let _ = self.job_tx.send(job).await;
    }

    /// Close the pool and wait for all workers to finish.
    pub async fn shutdown(self) {
        self.job_tx.close();
        let _ = self.pool_handle.await;
    }
}

async fn worker_loop(
    job_rx: async_channel::Receiver<DocJob>,
    config: Arc<Config>,
    source: Arc<dyn DocumentSource>,
    cancel: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = job_rx.recv() => match job {
                Ok(job) => job,
                Err(_) => break,
            },
        };

        (job.progress)(ProgressEvent::Processing {
            index: job.index,
            total: job.total,
            path: job.rel_path.clone(),
        });

        let worker_config = config.clone();
        let worker_source = source.clone();
        let path = job.path.clone();
        let rel_path = job.rel_path.clone();
        let result = tokio::task::spawn_blocking(move || {
            match worker_source.read(&path) {
                Ok(text) => (process_document(&worker_config, &rel_path, &text), false),
                Err(err) => {
                    tracing::warn!(path = %rel_path, error = %err, "unreadable document, degrading to filename-only record");
                    (degraded_record(&worker_config, &rel_path), true)
                }
            }
        })
        .await;

        let (record, degraded) = match result {
            Ok(pair) => pair,
            // A panic in analysis is isolated to this one document.
            Err(err) => {
                tracing::error!(path = %job.rel_path, error = %err, "analysis task failed");
                (degraded_record(&config, &job.rel_path), true)
            }
        };

        (job.progress)(ProgressEvent::Processed {
            index: job.index,
            total: job.total,
            path: job.rel_path.clone(),
            degraded,
        });

        let _ = job.result_tx.send(record);
    }
}
