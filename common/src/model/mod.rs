pub mod csv;
pub mod datasource;
pub mod reconcile;
pub mod stats;
pub mod status;
