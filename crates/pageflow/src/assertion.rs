//! Assertions on observed UI state.
//!
//! Every assertion returns `Ok(())` or [`FlowError::AssertionFailed`]
//! carrying both the observed and the expected value. A failed assertion is
//! terminal for the flow that raised it.

use crate::page_object::{NodeId, PageTree};
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
    /// Observed value
    pub actual: String,
    /// Expected value
    pub expected: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
            actual: String::new(),
            expected: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(
        message: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            passed: false,
            message: message.into(),
            actual: actual.into(),
            expected: expected.into(),
        }
    }

    /// Convert into a flow result
    pub fn into_result(self) -> FlowResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(FlowError::AssertionFailed {
                message: self.message,
                actual: self.actual,
                expected: self.expected,
            })
        }
    }
}

/// Assertion helpers
#[derive(Debug, Clone, Copy)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug + ?Sized>(actual: &T, expected: &T, message: &str) -> AssertionResult {
        if actual == expected {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message, format!("{actual:?}"), format!("{expected:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str, message: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message, format!("{haystack:?}"), format!("text containing {needle:?}"))
        }
    }
}

/// Fail unless `actual == expected`
pub fn assert_equal<T: PartialEq + Debug + ?Sized>(actual: &T, expected: &T, message: &str) -> FlowResult<()> {
    Assertion::equals(actual, expected, message).into_result()
}

/// Fail unless `haystack` contains `needle`
pub fn assert_contains(haystack: &str, needle: &str, message: &str) -> FlowResult<()> {
    Assertion::contains(haystack, needle, message).into_result()
}

/// Fail unless `node` resolves within the element bound.
///
/// Always asks the page; an earlier resolution of `node` does not count.
pub fn assert_present(session: &mut Session, tree: &PageTree, node: NodeId) -> FlowResult<()> {
    let wait = session.config().element_wait();
    match session.refresh(tree, node, wait) {
        Ok(_) => Ok(()),
        Err(FlowError::ElementResolution { .. }) => Err(FlowError::AssertionFailed {
            message: format!("{} should be present", tree.path(node)),
            actual: "absent".into(),
            expected: "present".into(),
        }),
        Err(e) => Err(e),
    }
}

/// Fail unless `node` disappears within the element bound
pub fn assert_absent(session: &mut Session, tree: &PageTree, node: NodeId) -> FlowResult<()> {
    if session.wait_for_absence(tree, node)? {
        Ok(())
    } else {
        Err(FlowError::AssertionFailed {
            message: format!("{} should be absent", tree.path(node)),
            actual: "present".into(),
            expected: "absent".into(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod assertion_result_tests {
        use super::*;

        #[test]
        fn test_pass_converts_to_ok() {
            assert!(AssertionResult::pass().into_result().is_ok());
        }

        #[test]
        fn test_fail_carries_values() {
            let err = AssertionResult::fail("title", "a", "b").into_result().unwrap_err();
            match err {
                FlowError::AssertionFailed { message, actual, expected } => {
                    assert_eq!(message, "title");
                    assert_eq!(actual, "a");
                    assert_eq!(expected, "b");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn test_assert_equal_strings() {
            assert!(assert_equal("Utam", "Utam", "name").is_ok());
            let err = assert_equal("Utam", "Other", "name").unwrap_err();
            let text = err.to_string();
            assert!(text.contains("\"Utam\""));
            assert!(text.contains("\"Other\""));
        }

        #[test]
        fn test_assert_contains() {
            assert!(assert_contains("Edit Lead", "Lead", "title").is_ok());
            assert!(assert_contains("Edit Lead", "Account", "title").is_err());
        }
    }

    proptest! {
        #[test]
        fn prop_equal_values_never_fail(x in ".*") {
            prop_assert!(assert_equal(x.as_str(), x.as_str(), "same").is_ok());
        }

        #[test]
        fn prop_distinct_values_report_both(x in "[a-z]{0,12}", y in "[A-Z]{1,12}") {
            let err = assert_equal(x.as_str(), y.as_str(), "differs").unwrap_err();
            match err {
                FlowError::AssertionFailed { actual, expected, .. } => {
                    prop_assert_eq!(actual, format!("{x:?}"));
                    prop_assert_eq!(expected, format!("{y:?}"));
                }
                other => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        #[test]
        fn prop_numbers(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(assert_equal(&a, &b, "n").is_ok(), a == b);
        }
    }
}
