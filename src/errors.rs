/*!
 * Error types for the locsync application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while reading or writing the source snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot file exists but cannot be read
    #[error("Failed to read snapshot: {0}")]
    Unreadable(String),

    /// The snapshot file was read but cannot be trusted
    #[error("Snapshot is corrupt: {0}")]
    Corrupt(String),

    /// The snapshot file cannot be written
    #[error("Failed to write snapshot: {0}")]
    WriteFailed(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider returned a document whose structure does not match the request
    #[error("Translated document '{document}' is malformed: {reason}")]
    InvalidDocument {
        /// Name of the document that came back malformed
        document: String,
        /// What exactly did not line up
        reason: String,
    },
}

/// Main synchronization error type that wraps all other errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// The base-language documents cannot be loaded
    #[error("Failed to read source documents: {0}")]
    SourceUnreadable(String),

    /// The translation response did not contain a requested target language
    #[error("Translation response is missing requested language: {0}")]
    MissingLanguage(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the snapshot store
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for SyncError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
