//! Error types for platform configuration loading.

use thiserror::Error;

/// Result type alias for platform-info operations
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Errors raised while loading the platform capability tables
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Structurally invalid platform XML
    #[error("malformed platform config: {details}")]
    Malformed { details: String },

    /// A required attribute was absent from an element
    #[error("missing required attribute '{attribute}' on <{tag}>")]
    MissingAttribute { tag: String, attribute: String },

    /// A vendor UUID that does not parse
    #[error("invalid vendor uuid '{value}'")]
    InvalidUuid { value: String },

    /// A sound model config referenced a capture profile that was never declared
    #[error("unknown capture profile '{name}' referenced by sound model config")]
    UnknownProfile { name: String },

    /// Low-level XML reader failure
    #[error("xml read failed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Config file could not be read
    #[error("platform config io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    /// Create a new malformed-config error
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed {
            details: details.into(),
        }
    }

    /// Create a new missing-attribute error
    pub fn missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }
}
