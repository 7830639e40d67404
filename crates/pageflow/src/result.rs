//! Result and error types for pageflow.

use thiserror::Error;

/// Result type for pageflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while opening sessions, navigating and running flows
#[derive(Debug, Error)]
pub enum FlowError {
    /// Browser could not be launched
    #[error("Failed to start session: {message}")]
    SessionStart {
        /// Error message
        message: String,
    },

    /// Expected page root did not become resolvable in time
    #[error("Page '{page}' did not load within {timeout_ms}ms (waited {elapsed_ms}ms)")]
    PageLoadTimeout {
        /// Page type that was expected
        page: String,
        /// Time actually spent waiting
        elapsed_ms: u64,
        /// Configured bound
        timeout_ms: u64,
    },

    /// A step target never resolved
    #[error("Element '{target}' could not be resolved ({locator})")]
    ElementResolution {
        /// Page-object path of the target
        target: String,
        /// Locator chain used for resolution
        locator: String,
    },

    /// Expected-versus-actual mismatch
    #[error("Assertion failed: {message} (expected {expected}, got {actual})")]
    AssertionFailed {
        /// Human-readable message
        message: String,
        /// Observed value
        actual: String,
        /// Expected value
        expected: String,
    },

    /// Target region does not support the requested interaction
    #[error("'{target}' is a {kind} and cannot be {capability}")]
    UnsupportedAction {
        /// Page-object path of the target
        target: String,
        /// Region kind of the target
        kind: String,
        /// Missing capability
        capability: String,
    },

    /// Operation attempted on a closed session
    #[error("Session is closed")]
    SessionClosed,

    /// Page runtime failure not covered by a more specific variant
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },

    /// Malformed flow script or document
    #[error("Invalid script: {message}")]
    InvalidScript {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A flow step failed; wraps the underlying cause with its position
    #[error("Step {index} ({description}) failed: {source}")]
    Step {
        /// 1-based position of the failing step
        index: usize,
        /// Step description
        description: String,
        /// Underlying failure
        #[source]
        source: Box<FlowError>,
    },

    /// The suite setup flow failed before the case script ran
    #[error("Setup '{script}' failed: {source}")]
    Setup {
        /// Setup script name
        script: String,
        /// Underlying failure
        #[source]
        source: Box<FlowError>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FlowError {
    /// Create a runtime error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Create an invalid script error
    #[must_use]
    pub fn invalid_script(message: impl Into<String>) -> Self {
        Self::InvalidScript {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an error with the position and description of the step that raised it
    #[must_use]
    pub fn at_step(self, index: usize, description: impl Into<String>) -> Self {
        Self::Step {
            index,
            description: description.into(),
            source: Box::new(self),
        }
    }

    /// Innermost cause, skipping step and setup wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Step { source, .. } | Self::Setup { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// 1-based index of the failing step, if this error came from a flow
    #[must_use]
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Step { index, .. } => Some(*index),
            Self::Setup { source, .. } => source.step_index(),
            _ => None,
        }
    }

    /// Whether this is (or wraps) an assertion failure
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(self.root_cause(), Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_wrapper_display() {
        let err = FlowError::runtime("boom").at_step(3, "click 'Save'");
        assert_eq!(
            err.to_string(),
            "Step 3 (click 'Save') failed: Runtime error: boom"
        );
        assert_eq!(err.step_index(), Some(3));
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let err = FlowError::AssertionFailed {
            message: "name".into(),
            actual: "a".into(),
            expected: "b".into(),
        }
        .at_step(1, "assert");
        assert!(err.is_assertion());
        assert!(matches!(
            err.root_cause(),
            FlowError::AssertionFailed { .. }
        ));
    }

    #[test]
    fn test_setup_wrapper_keeps_step_and_cause() {
        let err = FlowError::Setup {
            script: "Login".into(),
            source: Box::new(
                FlowError::AssertionFailed {
                    message: "title".into(),
                    actual: "Home".into(),
                    expected: "Login".into(),
                }
                .at_step(2, "assert title"),
            ),
        };
        assert_eq!(err.step_index(), Some(2));
        assert!(err.is_assertion());
        assert!(err.to_string().starts_with("Setup 'Login' failed: Step 2"));
    }

    #[test]
    fn test_page_load_timeout_display() {
        let err = FlowError::PageLoadTimeout {
            page: "RecordHome".into(),
            elapsed_ms: 5003,
            timeout_ms: 5000,
        };
        let text = err.to_string();
        assert!(text.contains("RecordHome"));
        assert!(text.contains("5000ms"));
    }

    #[test]
    fn test_non_step_has_no_index() {
        assert_eq!(FlowError::SessionClosed.step_index(), None);
        assert!(!FlowError::SessionClosed.is_assertion());
    }
}
