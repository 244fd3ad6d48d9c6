//! Reconciliation job routes.
//!
//! - `POST /api/reconcile/start`: validates the request, schedules the job in
//!   the background and answers with `{ "job_id": ... }` right away.
//! - `GET /api/reconcile/status/{job_id}`: polls a job. Returns the
//!   `JobStatus` as JSON, or 404 for an unknown ID.

mod get_status;
mod start;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/reconcile";

/// Routes under `/api/reconcile`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/start", post().to(start::process))
        .route("/status/{job_id}", get().to(get_status::process))
}
