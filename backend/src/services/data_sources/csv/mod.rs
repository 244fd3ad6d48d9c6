//! CSV data source routes.
//!
//! - `POST /api/data_sources/csv/headers`: reads the header rows of the
//!   privacy form and survey files so the caller can pick the identifier and
//!   consent columns before starting a job.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod headers;

const API_PATH: &str = "/api/data_sources/csv";

/// Routes under `/api/data_sources/csv`.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/headers", post().to(headers::process))
}
