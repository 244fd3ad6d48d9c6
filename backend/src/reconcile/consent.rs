/// Turns the raw consent cell of a privacy form row into a boolean.
///
/// The affirmative answer differs between survey instruments and languages,
/// so the literal is always supplied by the caller. Only an exact match counts
/// as consent; every other value, the empty cell included, does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentInterpretation {
    literal: String,
}

impl ConsentInterpretation {
    /// The affirmative answer of the German privacy form the tool was built for.
    pub const DEFAULT_LITERAL: &'static str = "JA, ich willige ein";

    /// Treats exactly `literal` as consent.
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// True only for an exact, case-sensitive match. No trimming is done.
    pub fn interpret(&self, raw: &str) -> bool {
        raw == self.literal
    }
}

impl Default for ConsentInterpretation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LITERAL)
    }
}
