/// Tool call failures and their machine-readable kinds

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Longest slice of a remote error body echoed back to the caller
const MAX_BODY_EXCERPT: usize = 512;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("WHMCS request failed: {0}")]
    Transport(String),

    #[error("WHMCS API returned HTTP {status_code}: {body}")]
    Remote { status_code: u16, body: String },

    #[error("WHMCS API returned invalid JSON: {0}")]
    MalformedResponse(String),
}

/// Failure category reported in the envelope metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnknownTool,
    InvalidArguments,
    TransportError,
    RemoteError,
    MalformedResponse,
}

impl ToolError {
    pub fn invalid_arguments(tool: &str, message: impl std::fmt::Display) -> Self {
        ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    /// Non-success status; the body is truncated so HTML error pages stay readable
    pub fn remote(status_code: u16, body: &str) -> Self {
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_BODY_EXCERPT) {
            Some((cut, _)) => format!("{}…", &body[..cut]),
            None => body.to_string(),
        };
        ToolError::Remote { status_code, body }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_) => ErrorKind::UnknownTool,
            ToolError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            ToolError::Transport(_) => ErrorKind::TransportError,
            ToolError::Remote { .. } => ErrorKind::RemoteError,
            ToolError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ToolError::Remote { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// `_meta` object attached to an error envelope
    pub fn meta(&self) -> Value {
        let mut meta = json!({ "errorKind": self.kind() });
        if let Some(code) = self.status_code() {
            meta["statusCode"] = json!(code);
        }
        meta
    }
}
