use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanRiskError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Malformed loan '{loan_id}': {reason}")]
    MalformedInput { loan_id: String, reason: String },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanRiskError {
    pub(crate) fn malformed(loan_id: &str, reason: impl Into<String>) -> Self {
        LoanRiskError::MalformedInput {
            loan_id: loan_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanRiskError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanRiskError {
    fn from(e: serde_json::Error) -> Self {
        LoanRiskError::SerializationError(e.to_string())
    }
}
