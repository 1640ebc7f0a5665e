//! Error types shared by the whole crate.

/// Errors raised while loading instances, validating parameters or running a search.
#[derive(Debug, thiserror::Error)]
pub enum KCenterError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Missing edge weight between nodes {from} and {to}")]
    MissingEdgeWeight { from: usize, to: usize },
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl KCenterError {
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        KCenterError::InvalidParameters(message.into())
    }

    pub(crate) fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        KCenterError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KCenterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KCenterError::MissingEdgeWeight { from: 3, to: 7 };
        assert_eq!(err.to_string(), "Missing edge weight between nodes 3 and 7");

        let err = KCenterError::parse(12, "Invalid dimension");
        assert_eq!(err.to_string(), "Parse error at line 12: Invalid dimension");
    }
}
