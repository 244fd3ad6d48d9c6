//! Runtime configuration.
//!
//! Values come from command line arguments (with environment fallbacks, see
//! [`crate::cli`]) and end up here after validation. Anything a job request
//! leaves open is filled from [`JobDefaults`].

use crate::error::{ReconcileError, Result};
use crate::reconcile::consent::ConsentInterpretation;
use regex::Regex;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DELIMITER: &str = ";";
/// 10 MB
pub const DEFAULT_JSON_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub defaults: JobDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted JSON body size in bytes.
    pub json_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            json_limit: DEFAULT_JSON_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Base URL the server is reachable at.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Fallbacks for the optional fields of a job request.
#[derive(Debug, Clone)]
pub struct JobDefaults {
    pub delimiter: u8,
    pub consent_literal: String,
    pub identifier_pattern: Option<Regex>,
    pub report_rejected_rows: bool,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            delimiter: b';',
            consent_literal: ConsentInterpretation::DEFAULT_LITERAL.to_string(),
            identifier_pattern: None,
            report_rejected_rows: true,
        }
    }
}

impl JobDefaults {
    /// Builds defaults from raw strings, rejecting unusable values.
    pub fn from_raw(
        delimiter: &str,
        consent_literal: Option<String>,
        identifier_pattern: Option<&str>,
        report_rejected_rows: bool,
    ) -> Result<Self> {
        let delimiter = parse_delimiter(delimiter).map_err(ReconcileError::Config)?;
        let identifier_pattern = identifier_pattern
            .filter(|p| !p.is_empty())
            .map(compile_pattern)
            .transpose()
            .map_err(ReconcileError::Config)?;
        Ok(Self {
            delimiter,
            consent_literal: consent_literal
                .unwrap_or_else(|| ConsentInterpretation::DEFAULT_LITERAL.to_string()),
            identifier_pattern,
            report_rejected_rows,
        })
    }
}

/// A delimiter must be exactly one ASCII character. `\t` and `tab` both mean tab.
pub fn parse_delimiter(raw: &str) -> std::result::Result<u8, String> {
    let raw = match raw {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        [] => Err("delimiter must not be empty".to_string()),
        _ => Err(format!("delimiter {:?} is not a single ASCII character", raw)),
    }
}

/// Compiles a user supplied identifier pattern.
pub fn compile_pattern(raw: &str) -> std::result::Result<Regex, String> {
    Regex::new(raw).map_err(|e| format!("invalid identifier pattern {:?}: {}", raw, e))
}
