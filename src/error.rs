// SPF Safe Shell - Classified Errors
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every failure a caller can see. None of these are fatal to the gateway:
// the transport turns each one into a JSON-RPC error and keeps serving.

use serde_json::{json, Value};

/// Classified failure of a single request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// Refused by policy. The underlying command was never started.
    #[error("{operation}: argument '{token}' refused: {reason}")]
    PolicyViolation {
        operation: String,
        token: String,
        reason: String,
    },

    /// Executable missing or not startable. No exit status exists.
    #[error("failed to launch '{command}': {reason}")]
    LaunchFailure { command: String, reason: String },

    /// Command ran and exited non-zero. Message is its stderr.
    #[error("{command} exited with status {status}: {stderr}")]
    ExecutionFailure {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("{command} exceeded {timeout_secs}s and was killed")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("{command} cancelled by caller")]
    Cancelled { command: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

pub type Result<T> = std::result::Result<T, GateError>;

/// JSON-RPC parse error, used for undecodable lines.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC invalid params.
pub const INVALID_PARAMS: i64 = -32602;

impl GateError {
    /// Stable snake_case kind, surfaced in the error `data` object.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "unknown_operation",
            Self::PolicyViolation { .. } => "policy_violation",
            Self::LaunchFailure { .. } => "launch_failure",
            Self::ExecutionFailure { .. } => "execution_failure",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::MalformedRequest(_) => "malformed_request",
        }
    }

    /// Numeric JSON-RPC error code.
    pub fn code(&self) -> i64 {
        match self {
            Self::UnknownOperation(_) => -32601,
            Self::PolicyViolation { .. } => -32001,
            Self::LaunchFailure { .. } => -32002,
            Self::ExecutionFailure { .. } => -32003,
            Self::Timeout { .. } => -32004,
            Self::Cancelled { .. } => -32005,
            Self::MalformedRequest(_) => INVALID_PARAMS,
        }
    }

    /// True when the request was refused before any process was started.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperation(_) | Self::PolicyViolation { .. } | Self::MalformedRequest(_)
        )
    }

    /// JSON-RPC error object for this failure.
    pub fn to_rpc_error(&self) -> Value {
        let mut data = json!({ "kind": self.kind() });
        match self {
            Self::PolicyViolation { operation, token, .. } => {
                data["operation"] = json!(operation);
                data["token"] = json!(token);
            }
            Self::ExecutionFailure { status, .. } => {
                data["exitStatus"] = json!(status);
            }
            Self::Timeout { timeout_secs, .. } => {
                data["timeoutSecs"] = json!(timeout_secs);
            }
            _ => {}
        }
        json!({
            "code": self.code(),
            "message": self.to_string(),
            "data": data,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_violation_message_names_token() {
        let err = GateError::PolicyViolation {
            operation: "list-directory".to_string(),
            token: "--unsafe-flag".to_string(),
            reason: "flag not in allowlist".to_string(),
        };
        assert!(err.to_string().contains("--unsafe-flag"));
        assert!(err.is_refusal());
        assert_eq!(err.to_rpc_error()["data"]["token"], "--unsafe-flag");
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            GateError::UnknownOperation("x".into()),
            GateError::PolicyViolation { operation: "o".into(), token: "t".into(), reason: "r".into() },
            GateError::LaunchFailure { command: "c".into(), reason: "r".into() },
            GateError::ExecutionFailure { command: "c".into(), status: 1, stderr: "e".into() },
            GateError::Timeout { command: "c".into(), timeout_secs: 1 },
            GateError::Cancelled { command: "c".into() },
            GateError::MalformedRequest("m".into()),
        ];
        let mut codes: Vec<i64> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn execution_failure_carries_exit_status() {
        let err = GateError::ExecutionFailure {
            command: "ls".into(),
            status: 2,
            stderr: "No such file or directory".into(),
        };
        let rpc = err.to_rpc_error();
        assert_eq!(rpc["code"], -32003);
        assert_eq!(rpc["data"]["exitStatus"], 2);
        assert!(rpc["message"].as_str().unwrap_or("").contains("No such file"));
        assert!(!err.is_refusal());
    }
}
