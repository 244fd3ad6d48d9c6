use crate::text::to_upper_snake;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final classification of an identifier once both sources have been ingested.
///
/// Exactly one status applies to each identifier. The decision only depends on
/// whether the identifier occurred in the privacy form, in the survey, and on
/// the consent carried by its most recent privacy form row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Present in both sources and consent was given.
    OkValid,
    /// Present in both sources but the latest consent answer is not affirmative.
    ErrorNoConsent,
    /// Only present in the privacy form.
    ErrorOnlyPrivacyForm,
    /// Only present in the survey.
    ErrorOnlySurvey,
    /// Present in neither source. Cannot happen for indexed identifiers.
    ErrorInvalid,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::OkValid,
        Status::ErrorNoConsent,
        Status::ErrorOnlyPrivacyForm,
        Status::ErrorOnlySurvey,
        Status::ErrorInvalid,
    ];

    /// Applies the decision table to the occurrence counts of one identifier.
    pub fn decide(privacy_form_occurrences: usize, survey_occurrences: usize, consent: bool) -> Self {
        match (privacy_form_occurrences > 0, survey_occurrences > 0) {
            (true, true) if consent => Status::OkValid,
            (true, true) => Status::ErrorNoConsent,
            (true, false) => Status::ErrorOnlyPrivacyForm,
            (false, true) => Status::ErrorOnlySurvey,
            (false, false) => Status::ErrorInvalid,
        }
    }

    /// Short tag telling which sources back this status: `P+S`, `P`, `S`, or empty.
    pub fn visualization(self) -> &'static str {
        match self {
            Status::OkValid | Status::ErrorNoConsent => "P+S",
            Status::ErrorOnlyPrivacyForm => "P",
            Status::ErrorOnlySurvey => "S",
            Status::ErrorInvalid => "",
        }
    }

    /// Only `OkValid` identifiers go into the valid ledger.
    pub fn is_valid(self) -> bool {
        self == Status::OkValid
    }
}

impl fmt::Display for Status {
    /// Renders the upper snake case form used in every output file, e.g. `OK_VALID`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_upper_snake(&format!("{:?}", self)))
    }
}

#[cfg(test)]
mod tests {
    use super::Status;

    #[test]
    fn decision_table() {
        assert_eq!(Status::decide(1, 1, true), Status::OkValid);
        assert_eq!(Status::decide(3, 2, false), Status::ErrorNoConsent);
        assert_eq!(Status::decide(1, 0, true), Status::ErrorOnlyPrivacyForm);
        assert_eq!(Status::decide(0, 4, false), Status::ErrorOnlySurvey);
        assert_eq!(Status::decide(0, 0, true), Status::ErrorInvalid);
    }

    #[test]
    fn display_matches_serialized_name() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
        assert_eq!(Status::ErrorOnlyPrivacyForm.to_string(), "ERROR_ONLY_PRIVACY_FORM");
    }

    #[test]
    fn visualization_tags() {
        assert_eq!(Status::OkValid.visualization(), "P+S");
        assert_eq!(Status::ErrorNoConsent.visualization(), "P+S");
        assert_eq!(Status::ErrorOnlyPrivacyForm.visualization(), "P");
        assert_eq!(Status::ErrorOnlySurvey.visualization(), "S");
        assert_eq!(Status::ErrorInvalid.visualization(), "");
    }
}
