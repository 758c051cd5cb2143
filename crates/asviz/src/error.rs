// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by the decoder, daemon adapter and data sources.

use crate::ia::IsdAs;
use std::path::PathBuf;
use thiserror::Error;

/// A required field of a daemon record could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Decode error: field '{field}' {reason}")]
pub struct DecodeError {
    pub field: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "missing")
    }

    pub fn invalid(field: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::new(field, format!("invalid: {}", detail))
    }
}

/// Failures talking to the path-lookup daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The daemon socket never became reachable.
    #[error("Cannot reach path daemon for {ia} at {socket:?} after {attempts} attempt(s): {reason}")]
    Connection {
        ia: IsdAs,
        socket: PathBuf,
        attempts: u32,
        reason: String,
    },

    /// The daemon answered a query with an application-level failure.
    #[error("Daemon rejected {query} query (status 0x{status:02x}): {message}")]
    Response {
        query: &'static str,
        status: u8,
        message: String,
    },

    #[error("Daemon did not answer {query} query within {timeout_ms} ms")]
    Timeout { query: &'static str, timeout_ms: u64 },

    #[error("Daemon I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Clone for DaemonError {
    fn clone(&self) -> Self {
        match self {
            Self::Connection {
                ia,
                socket,
                attempts,
                reason,
            } => Self::Connection {
                ia: *ia,
                socket: socket.clone(),
                attempts: *attempts,
                reason: reason.clone(),
            },
            Self::Response {
                query,
                status,
                message,
            } => Self::Response {
                query: *query,
                status: *status,
                message: message.clone(),
            },
            Self::Timeout { query, timeout_ms } => Self::Timeout {
                query: *query,
                timeout_ms: *timeout_ms,
            },
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl DaemonError {
    /// Transport failures leave the stream unusable; a rejected query does not.
    pub fn invalidates_connection(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

/// Errors surfaced per report section.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Daemon(#[from] DaemonError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Cannot read {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} are not available from this data source")]
    Unsupported(&'static str),
}

impl SourceError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Whether the daemon connection behind this error must be dropped.
    pub fn invalidates_connection(&self) -> bool {
        match self {
            Self::Daemon(e) => e.invalidates_connection(),
            _ => false,
        }
    }
}
