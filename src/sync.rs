//! Keeps a local copy of the service's job collection in step with the server.
//!
//! The poll loop is the only writer of the cache. Each poll replaces the whole
//! collection; there is no merging. Polls are tagged with a sequence number so
//! a slow poll finishing after a newer one is discarded, and a stop bumps the
//! generation so polls still in flight never write to a stopped synchronizer.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    config::JobOrdering,
    error::{ClientError, Result},
    models::{Job, JobRequest, JobStatus},
    notifications::NotificationQueue,
    services::JobService,
};

/// Per-status job counts for a header badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub pending: usize,
    pub running: usize,
    pub success: usize,
    pub failed: usize,
    pub canceled: usize,
}

impl StatusSummary {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut summary = Self::default();
        for job in jobs {
            match job.status {
                JobStatus::Pending => summary.pending += 1,
                JobStatus::Running => summary.running += 1,
                JobStatus::Success => summary.success += 1,
                JobStatus::Failed => summary.failed += 1,
                JobStatus::Canceled => summary.canceled += 1,
            }
        }
        summary
    }

    pub fn active(&self) -> usize {
        self.pending + self.running
    }

    pub fn total(&self) -> usize {
        self.active() + self.success + self.failed + self.canceled
    }
}

/// Newest first; equal timestamps fall back to id order so repeated polls of
/// the same data render identically.
pub fn order_jobs(jobs: &mut [Job], ordering: JobOrdering) {
    if ordering == JobOrdering::NewestFirst {
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

#[derive(Debug, Default)]
struct JobCache {
    jobs: Arc<Vec<Job>>,
    /// sequence number of the poll that produced `jobs`
    applied_seq: u64,
    generation: u64,
    stopped: bool,
    synced_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct JobSynchronizer {
    service: Arc<dyn JobService>,
    notifications: NotificationQueue,
    cache: Arc<RwLock<JobCache>>,
    seq: Arc<AtomicU64>,
    shutdown: Arc<Mutex<Option<broadcast::Sender<()>>>>,
    ordering: JobOrdering,
    poll_interval: Duration,
}

impl JobSynchronizer {
    pub fn new(
        service: Arc<dyn JobService>,
        notifications: NotificationQueue,
        ordering: JobOrdering,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            notifications,
            cache: Arc::new(RwLock::new(JobCache::default())),
            seq: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(Mutex::new(None)),
            ordering,
            poll_interval,
        }
    }

    /// Start polling: once right away, then every poll interval. Calling it
    /// while the loop is already running does nothing.
    pub async fn start(&self) {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            return;
        }
        self.cache.write().await.stopped = false;

        let (tx, mut rx) = broadcast::channel(1);
        *shutdown = Some(tx);

        let sync = self.clone();
        let period = self.poll_interval;
        info!("Job polling started (every {:?})", period);

        tokio::spawn(async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = rx.recv() => break,
                    _ = tick.tick() => {
                        sync.refresh().await;
                    }
                }
            }
            debug!("Job poll loop exited");
        });
    }

    /// Stop polling. Polls already in flight finish but their results are
    /// thrown away.
    pub async fn stop(&self) {
        {
            let mut cache = self.cache.write().await;
            cache.stopped = true;
            cache.generation += 1;
        }
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(());
            info!("Job polling stopped");
        }
    }

    /// Non-async stop for drop paths. Skips whatever is locked at the moment.
    pub fn abandon(&self) {
        if let Ok(mut cache) = self.cache.try_write() {
            cache.stopped = true;
            cache.generation += 1;
        }
        if let Ok(mut shutdown) = self.shutdown.try_lock() {
            if let Some(tx) = shutdown.take() {
                let _ = tx.send(());
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.shutdown.lock().await.is_some()
    }

    /// Fetch the job collection and install it if it is still the newest
    /// result. Returns whether the cache was replaced.
    pub async fn poll(&self) -> Result<bool> {
        let generation = {
            let cache = self.cache.read().await;
            if cache.stopped {
                return Err(ClientError::Stopped);
            }
            cache.generation
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let mut jobs = self.service.list_jobs().await?;
        order_jobs(&mut jobs, self.ordering);

        let mut cache = self.cache.write().await;
        if cache.stopped || cache.generation != generation {
            debug!("Discarding poll #{} that finished after stop", seq);
            return Ok(false);
        }
        if seq <= cache.applied_seq {
            debug!("Discarding stale poll #{} (have #{})", seq, cache.applied_seq);
            return Ok(false);
        }
        debug!("Poll #{}: {} job(s)", seq, jobs.len());
        cache.jobs = Arc::new(jobs);
        cache.applied_seq = seq;
        cache.synced_at = Some(Utc::now());
        Ok(true)
    }

    /// Poll, logging failures instead of returning them.
    pub async fn refresh(&self) -> bool {
        match self.poll().await {
            Ok(applied) => applied,
            Err(ClientError::Stopped) => false,
            Err(e) => {
                warn!("Job poll failed: {}", e);
                false
            }
        }
    }

    pub async fn jobs(&self) -> Arc<Vec<Job>> {
        Arc::clone(&self.cache.read().await.jobs)
    }

    pub async fn job(&self, id: &str) -> Option<Job> {
        self.cache
            .read()
            .await
            .jobs
            .iter()
            .find(|job| job.id == id)
            .cloned()
    }

    /// Increases every time a poll result is installed.
    pub async fn revision(&self) -> u64 {
        self.cache.read().await.applied_seq
    }

    pub async fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.synced_at
    }

    pub async fn summary(&self) -> StatusSummary {
        StatusSummary::from_jobs(&self.cache.read().await.jobs)
    }

    /// Toast the outcome of a user action, then resync with the server.
    async fn settle<T>(&self, outcome: Result<T>, success: &str, failure: &str) -> Result<T> {
        match &outcome {
            Ok(_) => {
                info!("{}", success);
                self.notifications.success(success).await;
            }
            Err(e) => {
                warn!("{}: {}", failure, e);
                self.notifications.error(e.user_message(failure)).await;
            }
        }
        self.refresh().await;
        outcome
    }

    pub async fn create(&self, request: &JobRequest) -> Result<String> {
        let outcome = self.service.create_job(request).await;
        self.settle(outcome, "Job created", "Failed to create job").await
    }

    /// Submit an existing job's request again as a new job.
    pub async fn duplicate(&self, job: &Job) -> Result<String> {
        let outcome = self.service.create_job(&job.request).await;
        self.settle(outcome, "Job duplicated", "Failed to duplicate job")
            .await
    }

    pub async fn cancel(&self, id: &str) -> Result<()> {
        let outcome = self.service.cancel_job(id).await;
        self.settle(outcome, "Job canceled", "Failed to cancel job").await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let outcome = self.service.delete_job(id).await;
        self.settle(outcome, "Job deleted", "Failed to delete job").await
    }

    /// Irreversible; callers route this through a confirmation first.
    pub async fn delete_all(&self) -> Result<()> {
        let outcome = self.service.delete_all_jobs().await;
        self.settle(outcome, "All jobs deleted", "Failed to delete jobs")
            .await
    }

    /// Save a finished job's video to `dest`. Only jobs the last poll saw as
    /// successful can be downloaded.
    pub async fn download(&self, id: &str, dest: &Path) -> Result<u64> {
        let outcome = self.fetch_result(id, dest).await;
        match &outcome {
            Ok(bytes) => {
                info!("Saved {} ({} bytes) to {}", id, bytes, dest.display());
                self.notifications
                    .success(format!("Saved to {}", dest.display()))
                    .await;
            }
            Err(e) => {
                warn!("Download of {} failed: {}", id, e);
                self.notifications
                    .error(e.user_message("Download failed"))
                    .await;
            }
        }
        outcome
    }

    async fn fetch_result(&self, id: &str, dest: &Path) -> Result<u64> {
        let job = self.job(id).await.ok_or_else(|| ClientError::UnknownJob {
            id: id.to_string(),
        })?;
        if !job.can_download() {
            return Err(ClientError::NotDownloadable { id: job.id });
        }
        let bytes = self.service.download_result(id).await?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
