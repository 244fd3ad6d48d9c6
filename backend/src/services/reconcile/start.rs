//! # Reconciliation Job Start Service
//!
//! 1.  **HTTP Request**: `process` receives a `StartReconcileRequest` and turns
//!     it into a `ReconcileJob`. A request that cannot become a job (bad
//!     delimiter, missing output directory, ...) is answered with 400 and no
//!     job is created.
//!
//! 2.  **Job Scheduling**: `schedule_reconcile_job` registers a new `job_id` as
//!     `Pending`, spawns the job and returns the ID immediately.
//!
//! 3.  **Background Processing**: the job runs on the blocking thread pool via
//!     `spawn_blocking`. Each `JobStage` it enters is sent over a per-job
//!     channel, translated into `JobStatus::InProgress` and forwarded to the
//!     job controller. The final `Completed` or `Failed` status is sent once
//!     the blocking task returns.

use crate::config::JobDefaults;
use crate::job::{JobStage, ReconcileJob};
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::error_response;
use crate::table_io::CsvFiles;
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::requests::StartReconcileRequest;
use log::{error, info};
use tokio::sync::mpsc;
use uuid::Uuid;

pub(crate) async fn process(
    state: web::Data<JobsState>,
    defaults: web::Data<JobDefaults>,
    payload: web::Json<StartReconcileRequest>,
) -> impl Responder {
    let job = match ReconcileJob::from_request(payload.into_inner(), &defaults) {
        Ok(job) => job,
        Err(err) => return error_response(&err),
    };
    let job_id = schedule_reconcile_job(&state, job).await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

async fn schedule_reconcile_job(state: &JobsState, job: ReconcileJob) -> String {
    let job_id = Uuid::new_v4().to_string();
    state.register(&job_id).await;
    info!(
        "Scheduled job {} for {} and {}",
        job_id,
        job.privacy_form.display(),
        job.survey.display()
    );

    let tx = state.tx.clone();
    let job_id_clone = job_id.clone();

    tokio::spawn(async move {
        let (stage_tx, mut stage_rx) = mpsc::channel::<JobStage>(8);

        let job_updater_tx = tx.clone();
        let job_id_for_updater = job_id_clone.clone();
        tokio::spawn(async move {
            while let Some(stage) = stage_rx.recv().await {
                info!("Job {} entered stage {:?}", job_id_for_updater, stage);
                let _ = job_updater_tx
                    .send(JobUpdate {
                        job_id: job_id_for_updater.clone(),
                        status: JobStatus::InProgress(stage.percent()),
                    })
                    .await;
            }
        });

        let handle = tokio::task::spawn_blocking(move || {
            job.run(&CsvFiles, &CsvFiles, |stage| {
                let _ = stage_tx.blocking_send(stage);
            })
        });

        let status = match handle.await {
            Ok(Ok(report)) => {
                info!("Job {} completed", job_id_clone);
                JobStatus::Completed(report)
            }
            Ok(Err(e)) => {
                error!("Job {} failed: {}", job_id_clone, e);
                JobStatus::Failed(e.to_string())
            }
            Err(e) => {
                error!("Job {} did not finish: {}", job_id_clone, e);
                JobStatus::Failed(format!("Task join error: {}", e))
            }
        };
        let _ = tx
            .send(JobUpdate {
                job_id: job_id_clone,
                status,
            })
            .await;
    });

    job_id
}
