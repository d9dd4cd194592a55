//! Error types for the orchestration core.
//!
//! Collaborator failures ([`SessionError`], [`DeviceError`]) are propagated
//! through [`StreamError`] verbatim: the stream never retries and never
//! rewrites what a backend reported.

use thiserror::Error;

use crate::device::DeviceId;
use crate::stream::Phase;

/// Result type alias for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors reported by a session backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The processing graph could not be built or bound
    #[error("session graph setup failed: {details}")]
    GraphSetup { details: String },

    /// The session is in the wrong lifecycle state for this call
    #[error("session not ready for {operation}")]
    NotReady { operation: &'static str },

    /// A data transfer over an endpoint failed
    #[error("session transfer failed: {details}")]
    Transfer { details: String },

    /// Backend-specific failure with its native status code
    #[error("session backend error {code}: {message}")]
    Backend { code: i32, message: String },
}

impl SessionError {
    pub fn graph_setup(details: impl Into<String>) -> Self {
        Self::GraphSetup {
            details: details.into(),
        }
    }

    pub fn backend(code: i32, message: impl Into<String>) -> Self {
        Self::Backend {
            code,
            message: message.into(),
        }
    }
}

/// Errors reported by a device endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The endpoint could not be acquired
    #[error("device {id:?} unavailable: {details}")]
    Unavailable { id: DeviceId, details: String },

    /// The device is in the wrong lifecycle state for this call
    #[error("device {id:?} not ready for {operation}")]
    NotReady {
        id: DeviceId,
        operation: &'static str,
    },

    /// Backend-specific failure with its native status code
    #[error("device {id:?} backend error {code}: {message}")]
    Backend {
        id: DeviceId,
        code: i32,
        message: String,
    },
}

impl DeviceError {
    pub fn unavailable(id: DeviceId, details: impl Into<String>) -> Self {
        Self::Unavailable {
            id,
            details: details.into(),
        }
    }

    pub fn backend(id: DeviceId, code: i32, message: impl Into<String>) -> Self {
        Self::Backend {
            id,
            code,
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`Stream`](crate::Stream) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Construction-time failure (attributes, session, or device creation).
    /// Fatal: no partially constructed stream is ever returned.
    #[error("failed to allocate {what}: {details}")]
    Allocation {
        what: &'static str,
        details: String,
    },

    /// The attribute direction is not output, input, or output|input
    #[error("unsupported stream direction {value:#x}")]
    InvalidDirection { value: u32 },

    /// Operation issued in a lifecycle phase that cannot service it
    #[error("stream is {phase:?}, cannot {operation}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    /// A session sub-operation failed; propagated verbatim
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A device sub-operation failed; propagated verbatim
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl StreamError {
    pub fn allocation(what: &'static str, details: impl Into<String>) -> Self {
        Self::Allocation {
            what,
            details: details.into(),
        }
    }
}
