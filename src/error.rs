use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid filter specification: {0}")]
    InvalidSpecification(String),

    #[error("Buffer has {actual} channels but the filter bank is configured for {expected}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("Non-finite filter output on channel(s) {channels:?}, channel state was reset")]
    NumericInstability { channels: Vec<usize> },

    #[error("Filter bank has not been configured")]
    NotConfigured,

    #[error("Session is faulted, reconfigure or restart acquisition")]
    SessionFaulted,
}

impl FilterError {
    /// Instability is recovered from in place; every other `process` error
    /// means the buffer could not be filtered at all.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FilterError::NumericInstability { .. })
    }
}

/// Splits a `process` result into the channels that were reset for
/// numeric instability, whose buffer is still fully filtered, and the errors
/// that left the buffer untouched.
pub fn recovered_channels(result: Result<()>) -> Result<Vec<usize>> {
    match result {
        Ok(()) => Ok(Vec::new()),
        Err(FilterError::NumericInstability { channels }) => Ok(channels),
        Err(e) => Err(e),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instability_is_recovered_other_errors_are_not() {
        assert_eq!(recovered_channels(Ok(())), Ok(vec![]));
        assert_eq!(
            recovered_channels(Err(FilterError::NumericInstability {
                channels: vec![0, 2]
            })),
            Ok(vec![0, 2])
        );
        assert_eq!(
            recovered_channels(Err(FilterError::NotConfigured)),
            Err(FilterError::NotConfigured)
        );
        assert!(recovered_channels(Err(FilterError::ChannelCountMismatch {
            expected: 2,
            actual: 3
        }))
        .is_err());
    }
}
