use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::jobs::JobStatus;
use common::model::csv::SourceHeaders;
use psmatch::config::JobDefaults;
use psmatch::job_controller::state::{start_job_updater, JobsState};
use psmatch::services;
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn sources() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("privacy.csv"), "code;consent\nA;YES\n").unwrap();
    fs::write(dir.path().join("survey.csv"), "code;foo\nA;bar\nB;baz\n").unwrap();
    dir
}

fn start_body(dir: &TempDir) -> Value {
    json!({
        "privacyFormFilePath": dir.path().join("privacy.csv"),
        "surveyFilePath": dir.path().join("survey.csv"),
        "outputDirectoryPath": dir.path(),
        "privacyFormIdentifierColumn": { "name": "code" },
        "privacyFormConsentColumn": { "index": 1 },
        "surveyIdentifierColumn": { "name": "code" },
        "consentLiteral": "YES"
    })
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new(JobDefaults::default()))
                .configure(services::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn headers_of_both_sources() {
    let dir = sources();
    let (state, _rx) = JobsState::new();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/data_sources/csv/headers")
        .set_json(json!({
            "privacyFormFilePath": dir.path().join("privacy.csv"),
            "surveyFilePath": dir.path().join("survey.csv"),
            "separator": ";"
        }))
        .to_request();
    let headers: SourceHeaders = test::call_and_read_body_json(&app, req).await;
    assert_eq!(headers.privacy_form_file_headers, vec!["code", "consent"]);
    assert_eq!(headers.survey_file_headers, vec!["code", "foo"]);
}

#[actix_web::test]
async fn headers_of_missing_file_fail() {
    let dir = sources();
    let (state, _rx) = JobsState::new();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/data_sources/csv/headers")
        .set_json(json!({
            "privacyFormFilePath": dir.path().join("nope.csv"),
            "surveyFilePath": dir.path().join("survey.csv")
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn started_job_completes() {
    let dir = sources();
    let (state, rx) = JobsState::new();
    actix_web::rt::spawn(start_job_updater(state.clone(), rx));
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/reconcile/start")
        .set_json(start_body(&dir))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let mut status = JobStatus::Pending;
    for _ in 0..200 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/reconcile/status/{}", job_id))
            .to_request();
        status = test::call_and_read_body_json(&app, req).await;
        if status.is_finished() {
            break;
        }
        actix_web::rt::time::sleep(Duration::from_millis(25)).await;
    }

    let JobStatus::Completed(report) = status else {
        panic!("job did not complete: {:?}", status);
    };
    assert_eq!(report.stats.valid, 1);
    assert_eq!(report.stats.only_survey, 1);
    assert!(dir.path().join("StudyCodes_all.csv").exists());
    assert!(dir.path().join("survey_commented.csv").exists());
}

#[actix_web::test]
async fn invalid_request_is_rejected_up_front() {
    let dir = sources();
    let (state, _rx) = JobsState::new();
    let app = app!(state);

    let mut body = start_body(&dir);
    body["separator"] = json!(";;");
    let req = test::TestRequest::post()
        .uri("/api/reconcile/start")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(state.jobs.read().await.is_empty());
}

#[actix_web::test]
async fn unknown_job_is_404() {
    let (state, _rx) = JobsState::new();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/reconcile/status/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
