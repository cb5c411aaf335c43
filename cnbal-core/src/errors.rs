use crate::reporter::ConservationViolation;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum CNBalError {
    #[error("{0}")]
    ConservationViolation(ConservationViolation),
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Invalid timestep length {0}. Step lengths must be finite and non-negative")]
    InvalidTimestep(f64),
    #[error("Could not parse configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CNBalError {
    fn from(value: toml::de::Error) -> Self {
        CNBalError::Config(value.to_string())
    }
}

/// Convenience type for `Result<T, CNBalError>`.
pub type CNBalResult<T> = Result<T, CNBalError>;
