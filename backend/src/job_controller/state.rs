//! Shared state of background reconciliation jobs.
//!
//! - `JobsState`: clonable handle holding the status of every job. It is
//!   injected into the Actix application as `web::Data`.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: the single task that applies `JobUpdate`s to the
//!   shared map, so workers never need write access to it.

use common::jobs::JobStatus;
use log::debug;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Capacity of the update channel.
pub const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// Status of every job started by this process.
#[derive(Clone)]
pub struct JobsState {
    /// Job ID to current status. Read by the status endpoint, written only by
    /// `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates an empty state and the receiving end for `start_job_updater`.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending`.
    pub async fn register(&self, job_id: &str) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
    }

    /// `None` for a job ID this process never issued.
    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// New status of one job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies incoming updates until every sender is gone.
///
/// A finished job keeps its final status; late progress updates for it are
/// dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if jobs.get(&update.job_id).is_some_and(JobStatus::is_finished) {
            debug!("Ignoring update for finished job {}", update.job_id);
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}
