//! Command line interface.

use crate::config::{
    AppConfig, JobDefaults, ServerConfig, DEFAULT_DELIMITER, DEFAULT_HOST, DEFAULT_JSON_LIMIT,
    DEFAULT_PORT,
};
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use common::model::csv::ColumnRef;
use common::requests::StartReconcileRequest;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "psmatch")]
#[command(about = "Reconciles a privacy form export with a survey export")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub server: ServeArgs,

    #[command(flatten)]
    pub defaults: DefaultArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API (the default)
    Serve,
    /// Run one job and print its report as JSON
    Run(RunArgs),
}

/// Fallbacks for options a job request leaves open.
#[derive(Args, Debug, Clone)]
pub struct DefaultArgs {
    /// Field delimiter of inputs and outputs (`tab` for tab)
    #[arg(long, global = true, default_value = DEFAULT_DELIMITER, env = "PSMATCH_DELIMITER")]
    pub delimiter: String,

    /// Cell value in the consent column that counts as consent
    #[arg(long, global = true, env = "PSMATCH_CONSENT_LITERAL")]
    pub consent_literal: Option<String>,

    /// Regular expression every identifier must match
    #[arg(long, global = true, env = "PSMATCH_IDENTIFIER_PATTERN")]
    pub identifier_pattern: Option<String>,

    /// Leave blank and unparsable rows out of the commented files
    #[arg(long, global = true)]
    pub omit_rejected_rows: bool,
}

impl DefaultArgs {
    /// Job defaults after parsing the delimiter and the identifier pattern.
    pub fn job_defaults(&self) -> Result<JobDefaults> {
        JobDefaults::from_raw(
            &self.delimiter,
            self.consent_literal.clone(),
            self.identifier_pattern.as_deref(),
            !self.omit_rejected_rows,
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, global = true, default_value = DEFAULT_HOST, env = "PSMATCH_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, global = true, default_value_t = DEFAULT_PORT, env = "PSMATCH_PORT")]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Privacy form export
    #[arg(long)]
    pub privacy_form: PathBuf,

    /// Survey export
    #[arg(long)]
    pub survey: PathBuf,

    /// Directory the four output files are written to
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Identifier column of the privacy form, by position or title
    #[arg(long, default_value = "0")]
    pub privacy_form_identifier: String,

    /// Consent column of the privacy form, by position or title
    #[arg(long, default_value = "1")]
    pub privacy_form_consent: String,

    /// Identifier column of the survey, by position or title
    #[arg(long, default_value = "0")]
    pub survey_identifier: String,

    /// Replace line breaks inside cells with " / "
    #[arg(long)]
    pub replace_newlines: bool,
}

impl RunArgs {
    /// Options not given here come from the job defaults.
    pub fn to_request(&self) -> StartReconcileRequest {
        StartReconcileRequest {
            privacy_form_file_path: self.privacy_form.display().to_string(),
            survey_file_path: self.survey.display().to_string(),
            output_directory_path: self.output_dir.display().to_string(),
            separator: None,
            privacy_form_identifier_column: ColumnRef::parse(&self.privacy_form_identifier),
            privacy_form_consent_column: ColumnRef::parse(&self.privacy_form_consent),
            survey_identifier_column: ColumnRef::parse(&self.survey_identifier),
            consent_literal: None,
            identifier_pattern: None,
            replace_newlines: self.replace_newlines,
            report_rejected_rows: None,
        }
    }
}

/// Configuration of `psmatch serve`.
pub fn app_config(serve: &ServeArgs, defaults: &DefaultArgs) -> Result<AppConfig> {
    Ok(AppConfig {
        server: ServerConfig {
            host: serve.host.clone(),
            port: serve.port,
            json_limit: DEFAULT_JSON_LIMIT,
        },
        defaults: defaults.job_defaults()?,
    })
}
