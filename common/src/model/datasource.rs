use serde::{Deserialize, Serialize};
use std::fmt;

/// The two tabular inputs of a reconciliation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Consent records, one row per submitted privacy form.
    PrivacyForm,
    /// Survey responses whose extra columns are carried through to the output.
    Survey,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::PrivacyForm => f.write_str("privacy form"),
            SourceKind::Survey => f.write_str("survey"),
        }
    }
}
