//! Error type shared by the sync pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Payload is not valid JSON or lacks a field its record type needs
    #[error("malformed update payload: {0}")]
    MalformedInput(String),

    #[error("unknown spreadsheet type '{0}' (expected animation, render or general)")]
    UnknownType(String),

    #[error("shot '{shot}' not found in sheet")]
    ShotNotFound { shot: String },

    #[error("task '{task}' not found at or after shot '{shot}'")]
    TaskNotFound { shot: String, task: String },

    /// The Sheets API (or the transport in front of it) rejected a call
    #[error("{}", remote_message(.status, .message))]
    RemoteService { status: Option<u16>, message: String },

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SyncError::Io {
            context: context.into(),
            source,
        }
    }

    /// Short machine-readable kind, used by the JSON formatter
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::MalformedInput(_) => "malformed_input",
            SyncError::UnknownType(_) => "unknown_type",
            SyncError::ShotNotFound { .. } => "shot_not_found",
            SyncError::TaskNotFound { .. } => "task_not_found",
            SyncError::RemoteService { .. } => "remote_service",
            SyncError::Auth(_) => "auth",
            SyncError::Config(_) => "config",
            SyncError::Io { .. } => "io",
        }
    }
}

fn remote_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("remote service error (HTTP {}): {}", code, message),
        None => format!("remote service error: {}", message),
    }
}
