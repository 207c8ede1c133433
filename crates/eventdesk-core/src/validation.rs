use thiserror::Error;

/// A draft that cannot be saved as entered.
///
/// These are reported back to the editor as values; they never abort a save
/// with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A start or end time string does not parse.
    #[error("invalid time format")]
    InvalidTimeFormat,

    /// The event, or its repeat boundary, ends at or before its start.
    #[error("start is not before end")]
    StartNotBeforeEnd,
}

impl ValidationError {
    /// Returns a stable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimeFormat => "invalid_time_format",
            Self::StartNotBeforeEnd => "start_not_before_end",
        }
    }
}
