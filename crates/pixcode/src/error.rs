//! Error types for pixcode.
//!
//! This module defines all error types used throughout the pixcode crate,
//! providing detailed context for debugging and user-friendly error messages.

use thiserror::Error;

/// The main error type for pixcode operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Encoding Errors ===
    /// A field value does not fit in the two-digit length prefix.
    #[error("value for tag {tag} is {length} characters long (maximum is 99)")]
    ValueTooLong {
        /// Tag of the offending field.
        tag: String,
        /// Character count of the rejected value.
        length: usize,
    },

    /// A field tag is not exactly two ASCII digits.
    #[error("invalid tag {tag:?}: expected two ASCII digits")]
    InvalidTag {
        /// The rejected tag.
        tag: String,
    },

    // === Decoding Errors ===
    /// The payload could not be walked as TLV fields.
    #[error("malformed payload at offset {offset}: {message}")]
    MalformedPayload {
        /// Character offset where parsing failed.
        offset: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The trailing CRC field does not match the payload contents.
    #[error("checksum mismatch: payload carries {actual}, computed {expected}")]
    ChecksumMismatch {
        /// Checksum recomputed over the payload.
        expected: String,
        /// Checksum found at the end of the payload.
        actual: String,
    },

    // === Configuration Errors ===
    /// No merchant identity has been configured.
    #[error("merchant is not configured; set [merchant] in {hint}")]
    MerchantNotConfigured {
        /// Where the user should put the merchant table.
        hint: String,
    },

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Platform Errors ===
    /// The system clipboard could not be reached or written.
    #[error("clipboard error: {0}")]
    Clipboard(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for pixcode operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a new malformed payload error.
    #[must_use]
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            offset,
            message: message.into(),
        }
    }

    /// Create a new clipboard error.
    #[must_use]
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard(message.into())
    }

    /// Check if this error is a checksum failure.
    #[must_use]
    pub fn is_checksum_error(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    /// Check if this error comes from loading or validating configuration.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } | Self::MerchantNotConfigured { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_too_long_display() {
        let err = Error::ValueTooLong {
            tag: "59".to_string(),
            length: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("59"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_invalid_tag_display() {
        let err = Error::InvalidTag {
            tag: "5x".to_string(),
        };
        assert!(err.to_string().contains("\"5x\""));
    }

    #[test]
    fn test_malformed_display() {
        let err = Error::malformed(12, "length is not numeric");
        assert_eq!(
            err.to_string(),
            "malformed payload at offset 12: length is not numeric"
        );
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = Error::ChecksumMismatch {
            expected: "D765".to_string(),
            actual: "0000".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("D765"));
        assert!(msg.contains("0000"));
    }

    #[test]
    fn test_is_checksum_error() {
        let err = Error::ChecksumMismatch {
            expected: "AAAA".to_string(),
            actual: "BBBB".to_string(),
        };
        assert!(err.is_checksum_error());
        assert!(!Error::malformed(0, "x").is_checksum_error());
    }

    #[test]
    fn test_is_config_error() {
        assert!(Error::config_validation("bad").is_config_error());
        assert!(Error::MerchantNotConfigured {
            hint: "config.toml".to_string()
        }
        .is_config_error());
        assert!(!Error::clipboard("unavailable").is_config_error());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("merchant.name is empty");
        assert_eq!(
            err.to_string(),
            "invalid configuration: merchant.name is empty"
        );
    }

    #[test]
    fn test_clipboard_error_display() {
        let err = Error::clipboard("no display");
        assert_eq!(err.to_string(), "clipboard error: no display");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }
}
