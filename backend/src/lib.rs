//! Reconciles a privacy form (consent) export with a survey export by study
//! code and writes the resulting ledgers and annotated copies of both inputs.

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod job_controller;
pub mod reconcile;
pub mod services;
pub mod table_io;
