//! Types shared between the reconciliation backend and its callers.
//!
//! Everything in here crosses a boundary: it is serialized into HTTP
//! responses, printed by the CLI or deserialized from job requests.

pub mod jobs;
pub mod model;
pub mod requests;
pub mod text;
