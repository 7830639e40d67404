//! Pageflow: declarative UI-flow testing over page-object trees
//!
//! A flow is an ordered script of steps (navigate, click, type, select,
//! wait, assert) against a tree of page objects. Each step resolves its
//! target through a browser session and acts through the region's
//! capability; the first failing step stops the flow and the session is
//! always torn down exactly once.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      PAGEFLOW Architecture                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────┐  │
//! │  │ FlowScript │──►│ Executor   │──►│ Session    │──►│ Page    │  │
//! │  │ (YAML/Rust)│   │ + Asserts  │   │ (cache)    │   │ Runtime │  │
//! │  └────────────┘   └────────────┘   └────────────┘   └─────────┘  │
//! │        ▲                                              │     │    │
//! │  ┌────────────┐                               Mock ◄──┘     └──► │
//! │  │ PageTree   │                                      Chromium    │
//! │  └────────────┘                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pageflow::prelude::*;
//!
//! let site = MockSite::new().route(
//!     MockRoute::new("/home")
//!         .element("main", MockElement::new())
//!         .element("main >> h1", MockElement::with_text("Welcome")),
//! );
//! let launcher = MockLauncher::new(site);
//!
//! let mut tree = PageTree::new();
//! let home = tree.root("Home", Locator::new("main"));
//! let title = tree.child(home, "title", Locator::new("h1"), RegionKind::Text);
//!
//! let script = FlowScript::builder("welcome", tree)
//!     .navigate("https://example.test/home", home)
//!     .assert_text(title, "Welcome")
//!     .build()?;
//!
//! let report = with_session(SessionConfig::default(), &launcher, |session| {
//!     FlowExecutor::run(session, &script)
//! })?;
//! assert!(report.passed);
//! assert_eq!(launcher.quit_count(), 1);
//! # Ok::<(), pageflow::FlowError>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod assertion;
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::needless_raw_string_hashes)]
mod browser;
mod capability;
mod config;
mod executor;
mod harness;
mod locator;
mod navigator;
mod page_object;
mod result;
mod runtime;
mod session;
mod step;

/// YAML/JSON flow documents compiled into flow scripts
pub mod document;

/// Scripted in-memory runtime for exercising flows without a browser
pub mod mock;

/// Salesforce Lightning page objects and scenario flows
pub mod salesforce;

/// Bounded polling
pub mod wait;

pub use assertion::{
    assert_absent, assert_contains, assert_equal, assert_present, Assertion, AssertionResult,
};
#[cfg(feature = "browser")]
pub use browser::{ChromiumLauncher, ChromiumRuntime};
pub use capability::{
    Button, Checkbox, Clickable, Combobox, Container, Datepicker, Presentable, Region,
    Selectable, Tab, Table, TextEditable, TextInput, TextRegion,
};
pub use config::{
    SessionConfig, TestEnvironment, ENV_ACCOUNT_ID, ENV_BASE_URL, ENV_CONTACT_ID, ENV_LEAD_ID,
    ENV_REDIRECT_URL,
};
pub use document::{interpolate, FlowDocument};
pub use executor::{Execution, FlowExecutor, RunReport, StepRecord, StepStatus};
pub use harness::{SuiteResults, TestCase, TestHarness, TestResult, TestSuite};
pub use locator::{Locator, LocatorChain, Selector};
pub use mock::{MockLauncher, MockRuntime};
pub use navigator::{Navigator, PageRef};
pub use page_object::{NodeId, PageNode, PageTree, PageType, RegionKind};
pub use result::{FlowError, FlowResult};
pub use runtime::{ElementHandle, Launcher, PageRuntime, Resolution};
pub use session::{with_session, Session, SessionState};
pub use step::{Action, FlowBuilder, FlowScript, Step};
pub use wait::{WaitOptions, WaitOutcome, Waiter};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::capability::*;
    pub use super::config::*;
    pub use super::document::{FlowDocument, PageDecl, StepDecl};
    pub use super::executor::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::mock::*;
    pub use super::navigator::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::runtime::*;
    pub use super::session::*;
    pub use super::step::*;
    pub use super::wait::{WaitOptions, WaitOutcome, Waiter};
}
