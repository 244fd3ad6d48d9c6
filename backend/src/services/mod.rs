//! HTTP surface.
//!
//! - `POST /api/data_sources/csv/headers`: header rows of both sources.
//! - `POST /api/reconcile/start`: schedules a job and returns its `job_id`.
//! - `GET /api/reconcile/status/{job_id}`: current `JobStatus` of a job.

pub mod data_sources;
pub mod reconcile;

use crate::error::ReconcileError;
use actix_web::{web, HttpResponse};
use log::error;

/// Registers every route. The app must carry `JobsState` and `JobDefaults`
/// as `web::Data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(data_sources::csv::configure_routes())
        .service(reconcile::configure_routes());
}

/// 400 for problems with the request itself, 500 for everything else.
pub(crate) fn error_response(err: &ReconcileError) -> HttpResponse {
    if err.is_client_error() {
        HttpResponse::BadRequest().body(err.to_string())
    } else {
        error!("{}", err);
        HttpResponse::InternalServerError().body(err.to_string())
    }
}
