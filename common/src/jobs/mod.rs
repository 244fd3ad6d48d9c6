use crate::model::reconcile::JobReport;
use serde::{Deserialize, Serialize};

/// Lifecycle of a background reconciliation job as seen by pollers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of the job that is done.
    InProgress(u32),
    Completed(JobReport),
    Failed(String),
}

impl JobStatus {
    /// `Completed` and `Failed` are final.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
