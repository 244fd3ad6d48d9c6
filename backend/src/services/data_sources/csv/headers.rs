use crate::config::JobDefaults;
use crate::job::inspect_headers;
use crate::services::error_response;
use crate::table_io::CsvFiles;
use actix_web::{web, HttpResponse, Responder};
use common::requests::InspectHeadersRequest;
use log::info;

pub(crate) async fn process(
    defaults: web::Data<JobDefaults>,
    payload: web::Json<InspectHeadersRequest>,
) -> impl Responder {
    let req = payload.into_inner();
    info!(
        "Reading headers of {} and {}",
        req.privacy_form_file_path, req.survey_file_path
    );
    let defaults = defaults.into_inner();
    let result =
        web::block(move || inspect_headers(&CsvFiles, &req, &defaults)).await;

    match result {
        Ok(Ok(headers)) => HttpResponse::Ok().json(headers),
        Ok(Err(err)) => error_response(&err),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}
