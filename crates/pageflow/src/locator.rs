//! Locator abstraction for page-object nodes.
//!
//! A [`Locator`] finds one element relative to its parent node. A
//! [`LocatorChain`] is the full path from the page root down to a node and is
//! what runtimes receive when asked to resolve an element.
//!
//! Selectors are scoped: a child locator searches inside the element its
//! parent resolved to (including the parent's shadow root, where the runtime
//! supports one).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    #[serde(rename = "xpath")]
    XPath(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a CSS selector filtered by text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Whether the selector string is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Text(s) | Self::TestId(s) => s.trim().is_empty(),
            Self::CssWithText { css, .. } => css.trim().is_empty(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::TestId(id) => write!(f, "[data-testid=\"{id}\"]"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text(\"{text}\")"),
        }
    }
}

/// A locator for one node, relative to its parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// The selector for finding elements
    pub selector: Selector,
    /// Pick the n-th match (0-based) instead of requiring the first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            nth: None,
        }
    }

    /// Filter by text content
    ///
    /// Only CSS selectors can carry a text filter; other selectors are kept
    /// as they are.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let selector = match self.selector {
            Selector::Css(css) => Selector::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        };
        Self {
            selector,
            nth: self.nth,
        }
    }

    /// Select the n-th match (0-based)
    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::from_selector(selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nth {
            Some(n) => write!(f, "{}:nth({n})", self.selector),
            None => write!(f, "{}", self.selector),
        }
    }
}

/// Path of locators from a page root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorChain {
    steps: Vec<Locator>,
}

impl LocatorChain {
    /// Create an empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a locator, returning the extended chain
    #[must_use]
    pub fn then(mut self, locator: Locator) -> Self {
        self.steps.push(locator);
        self
    }

    /// Append a locator in place
    pub fn push(&mut self, locator: Locator) {
        self.steps.push(locator);
    }

    /// Locators from root to leaf
    #[must_use]
    pub fn steps(&self) -> &[Locator] {
        &self.steps
    }

    /// Number of locators
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Innermost locator
    #[must_use]
    pub fn leaf(&self) -> Option<&Locator> {
        self.steps.last()
    }

    /// Whether `prefix` is the beginning of this chain
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.steps.starts_with(&prefix.steps)
    }
}

impl FromIterator<Locator> for LocatorChain {
    fn from_iter<I: IntoIterator<Item = Locator>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " >> ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_display_variants() {
            assert_eq!(Selector::css("button").to_string(), "button");
            assert_eq!(Selector::xpath("//h1").to_string(), "xpath=//h1");
            assert_eq!(Selector::text("Save").to_string(), "text=Save");
            assert_eq!(
                Selector::test_id("save").to_string(),
                "[data-testid=\"save\"]"
            );
            assert_eq!(
                Selector::css_with_text("button", "Save").to_string(),
                "button:has-text(\"Save\")"
            );
        }

        #[test]
        fn test_is_empty() {
            assert!(Selector::css("  ").is_empty());
            assert!(!Selector::css("a").is_empty());
        }

        #[test]
        fn test_serde_tagging() {
            let json = serde_json::to_string(&Selector::css("a.b")).unwrap();
            assert_eq!(json, r#"{"css":"a.b"}"#);
            let back: Selector = serde_json::from_str(r#"{"xpath":"//a"}"#).unwrap();
            assert_eq!(back, Selector::xpath("//a"));
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_with_text_on_css() {
            let loc = Locator::new("button").with_text("Save");
            assert_eq!(loc.selector(), &Selector::css_with_text("button", "Save"));
        }

        #[test]
        fn test_with_text_keeps_other_selectors() {
            let loc = Locator::from_selector(Selector::xpath("//b")).with_text("x");
            assert_eq!(loc.selector(), &Selector::xpath("//b"));
        }

        #[test]
        fn test_nth_display() {
            let loc = Locator::new("li").nth(2);
            assert_eq!(loc.to_string(), "li:nth(2)");
        }
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn test_display_joins_steps() {
            let chain = LocatorChain::new()
                .then(Locator::new("form"))
                .then(Locator::new("button").with_text("Save"));
            assert_eq!(chain.to_string(), "form >> button:has-text(\"Save\")");
            assert_eq!(chain.len(), 2);
        }

        #[test]
        fn test_starts_with() {
            let parent = LocatorChain::new().then(Locator::new("form"));
            let child = parent.clone().then(Locator::new("input"));
            assert!(child.starts_with(&parent));
            assert!(!parent.starts_with(&child));
        }

        #[test]
        fn test_collect() {
            let chain: LocatorChain = vec![Locator::new("a"), Locator::new("b")]
                .into_iter()
                .collect();
            assert_eq!(chain.leaf(), Some(&Locator::new("b")));
        }
    }
}
