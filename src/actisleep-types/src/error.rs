use thiserror::Error;

/// Maximum number of offending indices listed in a validation message.
pub const MAX_REPORTED_INDICES: usize = 10;

pub type Result<T> = std::result::Result<T, ActisleepError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActisleepError {
    // Input validation
    #[error("input is empty")]
    EmptyInput,
    #[error("length mismatch: {left_name} has {left} entries, {right_name} has {right}")]
    LengthMismatch {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },
    #[error("{reason} activity values at indices {indices:?} ({count} total)")]
    InvalidActivityValues {
        reason: &'static str,
        indices: Vec<usize>,
        count: usize,
    },
    #[error("unsupported epoch length of {0}s, expected a divisor of 60s")]
    UnsupportedEpochLength(u32),
    #[error("irregular timestamps at index {index}: expected {expected}s spacing, got {actual}s")]
    IrregularTimestamps {
        index: usize,
        expected: i64,
        actual: i64,
    },
    #[error("input has {len} epochs, maximum is {max}")]
    TooManyEpochs { len: usize, max: usize },
    #[error("activity channel `{0}` is not present in the series")]
    MissingChannel(String),
    #[error("{name} index {index} is out of range for length {len}")]
    IndexOutOfRange {
        name: &'static str,
        index: usize,
        len: usize,
    },
    #[error("onset index {onset} must be before offset index {offset}")]
    OnsetNotBeforeOffset { onset: usize, offset: usize },

    // Configuration
    #[error("unknown {kind} `{id}`")]
    UnknownAlgorithm { kind: &'static str, id: String },
    #[error("{kind} `{id}` is already registered")]
    DuplicateRegistration { kind: &'static str, id: String },
    #[error("unknown parameter `{name}` for `{algorithm}`")]
    UnknownParameter { algorithm: String, name: String },
    #[error("invalid value for parameter `{name}` of `{algorithm}`: {reason}")]
    InvalidParameter {
        algorithm: String,
        name: String,
        reason: String,
    },
    #[error("parameter `{name}` of `{algorithm}` is fixed")]
    FixedParameter { algorithm: String, name: String },
}

impl ActisleepError {
    pub fn is_validation(&self) -> bool {
        !self.is_configuration()
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownAlgorithm { .. }
                | Self::DuplicateRegistration { .. }
                | Self::UnknownParameter { .. }
                | Self::InvalidParameter { .. }
                | Self::FixedParameter { .. }
        )
    }

    pub fn invalid_parameter(
        algorithm: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            algorithm: algorithm.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_parameter(algorithm: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownParameter {
            algorithm: algorithm.into(),
            name: name.into(),
        }
    }
}
