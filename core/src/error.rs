use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::chain::ChainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ActionRejected,
    InsufficientFunds,
    CallException,
    UnpredictableGasLimit,
    NetworkError,
    InvalidArgument,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ActionRejected => "ACTION_REJECTED",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::CallException => "CALL_EXCEPTION",
            ErrorCode::UnpredictableGasLimit => "UNPREDICTABLE_GAS_LIMIT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed operation as pages see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct TxError {
    pub message: String,
    pub code: Option<ErrorCode>,
}

impl TxError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        TxError {
            message: message.into(),
            code: Some(ErrorCode::InvalidArgument),
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.code == Some(ErrorCode::ActionRejected)
    }
}

/// Normalizes a chain failure. `action` names what was being attempted
/// and only goes to the log.
pub fn handle_transaction_error(err: &ChainError, action: &str) -> TxError {
    let (message, code) = match err {
        ChainError::Rejected => (
            "Transaction rejected by user".to_string(),
            ErrorCode::ActionRejected,
        ),
        ChainError::Reverted(reason) => (reason.clone(), ErrorCode::CallException),
        ChainError::InsufficientFunds => (
            "Insufficient funds for gas and value".to_string(),
            ErrorCode::InsufficientFunds,
        ),
        ChainError::GasEstimation(reason) => (
            format!("Cannot estimate gas; transaction may fail ({reason})"),
            ErrorCode::UnpredictableGasLimit,
        ),
        ChainError::Network(reason) => (
            format!("Network error: {reason}"),
            ErrorCode::NetworkError,
        ),
        ChainError::Dropped => (
            "Transaction was dropped before confirmation".to_string(),
            ErrorCode::UnknownError,
        ),
        ChainError::NoSigner => ("Wallet not connected".to_string(), ErrorCode::UnknownError),
        ChainError::Other(reason) => (reason.clone(), ErrorCode::UnknownError),
    };
    warn!(code = code.as_str(), "Error {action}: {message}");
    TxError {
        message,
        code: Some(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_is_action_rejected() {
        let err = handle_transaction_error(&ChainError::Rejected, "buying with ETH");
        assert_eq!(err.code, Some(ErrorCode::ActionRejected));
        assert!(err.is_rejection());
        assert_eq!(err.code.unwrap().to_string(), "ACTION_REJECTED");
    }

    #[test]
    fn revert_reason_becomes_the_message() {
        let err = handle_transaction_error(
            &ChainError::Reverted("Sale token not set".into()),
            "buying with ETH",
        );
        assert_eq!(err.message, "Sale token not set");
        assert_eq!(err.code, Some(ErrorCode::CallException));
        assert!(!err.is_rejection());
    }

    #[test]
    fn codes_serialize_like_provider_codes() {
        let json = serde_json::to_string(&TxError::invalid_input("bad")).unwrap();
        assert_eq!(json, r#"{"message":"bad","code":"INVALID_ARGUMENT"}"#);
    }
}
