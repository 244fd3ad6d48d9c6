use actix_web::{web, App, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use psmatch::cli::{app_config, Cli, Command, RunArgs};
use psmatch::config::{AppConfig, JobDefaults};
use psmatch::job::ReconcileJob;
use psmatch::job_controller::state::{start_job_updater, JobsState};
use psmatch::services;
use psmatch::table_io::CsvFiles;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    let outcome = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => app_config(&cli.server, &cli.defaults)
            .map_err(|e| e.to_string())
            .and_then(|config| {
                actix_web::rt::System::new()
                    .block_on(serve_http(config))
                    .map_err(|e| e.to_string())
            }),
        Command::Run(args) => cli
            .defaults
            .job_defaults()
            .map_err(|e| e.to_string())
            .and_then(|defaults| run_once(&args, &defaults)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run_once(args: &RunArgs, defaults: &JobDefaults) -> Result<(), String> {
    let job = ReconcileJob::from_request(args.to_request(), defaults).map_err(|e| e.to_string())?;
    let report = job
        .run(&CsvFiles, &CsvFiles, |stage| info!("{:?}", stage))
        .map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

async fn serve_http(config: AppConfig) -> std::io::Result<()> {
    let (jobs_state, rx) = JobsState::new();

    let updater_state = jobs_state.clone();
    actix_web::rt::spawn(async move {
        start_job_updater(updater_state, rx).await;
    });

    info!("Server running at {}", config.server.url());

    let json_limit = config.server.json_limit;
    let defaults = web::Data::new(config.defaults);
    let jobs = web::Data::new(jobs_state);
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(jobs.clone())
            .app_data(defaults.clone())
            .configure(services::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
