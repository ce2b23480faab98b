//! Accumulated configuration checks.
//!
//! [`ValidationCollector`] gathers every problem with a reader, coupler or
//! writer configuration and reports them together as one
//! [`IoError::Validation`].

use crate::error::IoError;

/// Accumulates validation errors and converts them into a single
/// [`IoError::Validation`].
pub(crate) struct ValidationCollector {
    errors: Vec<String>,
}

impl ValidationCollector {
    /// Create an empty collector.
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record one validation error.
    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Record an error if `value` is empty or only whitespace.
    pub(crate) fn require_name(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(format!("{field} must not be empty"));
        }
    }

    /// Record an error if `values` is empty or any entry is blank.
    pub(crate) fn require_names(&mut self, field: &str, values: &[String]) {
        if values.is_empty() {
            self.push(format!("{field} must list at least one name"));
        } else if values.iter().any(|v| v.trim().is_empty()) {
            self.push(format!("{field} contains an empty name"));
        }
    }

    /// Consume the collector and return `Ok(())` if no errors were recorded,
    /// or `Err(IoError::Validation { count, details })` otherwise.
    ///
    /// The `details` string joins all messages with `"; "`.
    pub(crate) fn finish(self) -> Result<(), IoError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: self.errors.len(),
                details: self.errors.join("; "),
            })
        }
    }
}
