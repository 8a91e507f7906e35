// ABOUTME: Configuration for the listing extractor: FailurePolicy, Options, and ExtractorBuilder.
// ABOUTME: ExtractorBuilder provides a fluent API for constructing Extractor instances.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::extractor::Extractor;
use crate::profiles::ProfileRegistry;

/// What happens when a single field extractor fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and keep the field's default value.
    #[default]
    Isolate,
    /// Fail the whole extraction with an assembly error.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailurePolicy::Isolate => "isolate",
            FailurePolicy::Abort => "abort",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for FailurePolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "abort" | "fail-closed" | "strict" => FailurePolicy::Abort,
            _ => FailurePolicy::Isolate,
        }
    }
}

/// Configuration options for the extractor.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub failure_policy: FailurePolicy,
    /// Fixed capture time. `None` stamps each record with the current time.
    pub captured_at: Option<DateTime<Utc>>,
    /// Profiles to use instead of the builtin ones.
    pub registry: Option<ProfileRegistry>,
}

/// Builder for constructing Extractor instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ExtractorBuilder {
    opts: Options,
}

impl ExtractorBuilder {
    /// Create a new ExtractorBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.opts.failure_policy = policy;
        self
    }

    /// Stamp every record with `at` instead of the current time.
    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.opts.captured_at = Some(at);
        self
    }

    /// Set a custom profile registry.
    pub fn registry(mut self, reg: ProfileRegistry) -> Self {
        self.opts.registry = Some(reg);
        self
    }

    /// Build the Extractor with the configured options.
    pub fn build(self) -> Extractor {
        Extractor::new(self.opts)
    }
}
