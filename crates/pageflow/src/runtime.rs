//! Page runtime abstraction.
//!
//! The harness never talks to a browser directly. Everything it needs from
//! the page goes through [`PageRuntime`], and sessions are created by a
//! [`Launcher`]. Runtimes own the bounded polling: the core passes a
//! [`WaitOptions`] and gets back a definite answer.

use crate::config::SessionConfig;
use crate::locator::LocatorChain;
use crate::result::FlowResult;
use crate::wait::WaitOptions;
use std::fmt;

/// Handle to an element a runtime has located
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    /// Runtime-assigned identifier
    pub id: String,
    /// Locator chain the element was resolved from
    pub chain: LocatorChain,
}

impl ElementHandle {
    /// Create a handle
    #[must_use]
    pub fn new(id: impl Into<String>, chain: LocatorChain) -> Self {
        Self {
            id: id.into(),
            chain,
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.chain, self.id)
    }
}

/// Result of resolving a locator chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Element found
    Resolved(ElementHandle),
    /// Nothing matched within the bound
    Absent {
        /// Time spent waiting
        elapsed_ms: u64,
    },
}

impl Resolution {
    /// The handle, if resolved
    #[must_use]
    pub fn into_handle(self) -> Option<ElementHandle> {
        match self {
            Self::Resolved(handle) => Some(handle),
            Self::Absent { .. } => None,
        }
    }

    /// Whether the element was found
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Operations a page runtime provides to sessions.
///
/// Implementations: [`crate::MockRuntime`] (scripted, in-memory) and, with
/// the `browser` feature, `ChromiumRuntime`.
pub trait PageRuntime {
    /// Load a URL.
    ///
    /// A load still running at the session's navigation timeout fails with
    /// [`crate::FlowError::PageLoadTimeout`] carrying the URL as the page.
    fn load(&mut self, url: &str) -> FlowResult<()>;

    /// URL of the currently loaded page
    fn current_url(&mut self) -> FlowResult<String>;

    /// Locate the element at the end of `chain`, polling within `wait`
    fn resolve(&mut self, chain: &LocatorChain, wait: WaitOptions) -> FlowResult<Resolution>;

    /// Whether `chain` currently matches an element (no waiting)
    fn is_present(&mut self, chain: &LocatorChain) -> FlowResult<bool>;

    /// Poll until `chain` matches nothing; `false` if it is still present at the bound
    fn wait_for_absence(&mut self, chain: &LocatorChain, wait: WaitOptions) -> FlowResult<bool>;

    /// Poll until the current URL contains `fragment`
    fn wait_for_url(&mut self, fragment: &str, wait: WaitOptions) -> FlowResult<bool>;

    /// Click an element
    fn click(&mut self, element: &ElementHandle) -> FlowResult<()>;

    /// Replace the value of an editable element
    fn set_text(&mut self, element: &ElementHandle, text: &str) -> FlowResult<()>;

    /// Pick the option at `index` (1-based) of a selectable element
    fn select_index(&mut self, element: &ElementHandle, index: usize) -> FlowResult<()>;

    /// Visible text (or input value) of an element
    fn text(&mut self, element: &ElementHandle) -> FlowResult<String>;

    /// Number of elements `chain` currently matches
    fn count(&mut self, chain: &LocatorChain) -> FlowResult<usize>;

    /// Shut the browser down
    fn quit(&mut self) -> FlowResult<()>;
}

/// Starts page runtimes
pub trait Launcher {
    /// Launch a browser configured by `config`
    fn launch(&self, config: &SessionConfig) -> FlowResult<Box<dyn PageRuntime>>;
}
