use thiserror::Error;

/// Errors raised by the matching engine
///
/// Only caller contract violations are errors; malformed optional profile
/// fields are absorbed as defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
