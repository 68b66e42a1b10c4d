//! Error types for metadata ingestion.
//!
//! This module provides the [`IngestError`] type for every fatal, document-scoped
//! failure, the [`Result`] convenience type, and [`ExtractionFailure`] for the
//! non-fatal case where a single field could not be derived.

use std::fmt;

use thiserror::Error;

/// Error type for all fatal ingestion failures.
///
/// Every variant is scoped to one document: a failing document never affects
/// the processing of other documents in the same batch.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The raw document matches no known schema signature.
    #[error("Classification error: {0}")]
    Classification(String),

    /// The raw bytes are not well-formed XML or JSON, or cannot be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The document violates a hard catalogue requirement.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while decoding a compressed payload.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`IngestError`].
pub type Result<T> = std::result::Result<T, IngestError>;

/// A single field that could not be derived from its source representation.
///
/// Extraction failures are never fatal: the field is omitted from the
/// document and the failure is kept for data-quality reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// Canonical field name, e.g. `geometry` or `temporal_coverage`.
    pub field: &'static str,
    /// Human readable reason, usually quoting the offending source value.
    pub reason: String,
}

impl ExtractionFailure {
    /// Create a new extraction failure for `field`.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ExtractionFailure {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}
