//! The reconciliation core.
//!
//! Validation, indexing, classification and projection of the two sources.
//! Nothing in here performs I/O; the job runner feeds it tables and writes
//! back what it produces.

pub mod columns;
pub mod consent;
pub mod engine;
pub mod index;
pub mod presentation;
pub mod projector;
pub mod record;
pub mod validator;

pub use consent::ConsentInterpretation;
pub use engine::{reconcile, Classification, Reconciliation};
pub use index::{IdentifierIndex, UnprocessedEntry};
pub use record::{Passthrough, PrivacyFormRecord, SurveyRecord};
pub use validator::{RecordValidator, RowOutcome, RowRejection};
