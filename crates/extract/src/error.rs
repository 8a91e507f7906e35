// ABOUTME: Error types for listing extraction: ErrorCode, ExtractError, FieldError and MetadataError.
// ABOUTME: ExtractError is the only error crossing the public boundary; the others are recovered internally.

use std::fmt;

/// Error codes representing different categories of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Metadata,
    Field,
    Assembly,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Metadata => "metadata error",
            ErrorCode::Field => "field extraction error",
            ErrorCode::Assembly => "assembly error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type returned by `extract`.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "immo: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Metadata error.
    pub fn metadata(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Metadata, url, op, source)
    }

    /// Create a Field error.
    pub fn field(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Field, url, op, source)
    }

    /// Create an Assembly error.
    pub fn assembly(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Assembly, url, op, source)
    }

    /// Human-readable message without the op/url prefix.
    pub fn message(&self) -> String {
        match self.source {
            Some(ref src) => format!("{}: {}", self.code, src),
            None => self.code.to_string(),
        }
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Metadata error.
    pub fn is_metadata(&self) -> bool {
        self.code == ErrorCode::Metadata
    }

    /// Returns true if this is a Field error.
    pub fn is_field(&self) -> bool {
        self.code == ErrorCode::Field
    }

    /// Returns true if this is an Assembly error.
    pub fn is_assembly(&self) -> bool {
        self.code == ErrorCode::Assembly
    }
}

/// Failure while evaluating one field's strategies.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("no profile registered for `{0}`")]
    MissingProfile(String),

    #[error("extractor panicked: {0}")]
    Panicked(String),
}

/// Failure while reading the embedded structured-metadata block.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("metadata is not a JSON object")]
    NotAnObject,
}
