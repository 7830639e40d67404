//! Flow scripts: ordered steps against page-object nodes.

use crate::page_object::{NodeId, PageTree};
use crate::result::{FlowError, FlowResult};
use std::fmt;

/// One atomic UI action or check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Load a URL and wait for a page root
    Navigate {
        /// Absolute URL or path relative to the session's base URL
        url: String,
        /// Root expected to load
        expect: NodeId,
    },
    /// Treat the current page as the given root
    LoadPage {
        /// Root to resolve
        page: NodeId,
    },
    /// Click a region
    Click {
        /// Target node
        target: NodeId,
    },
    /// Replace the value of an editable region
    SetText {
        /// Target node
        target: NodeId,
        /// Text to enter
        text: String,
    },
    /// Pick an option (1-based) from a selectable region
    SelectIndex {
        /// Target node
        target: NodeId,
        /// Option position
        index: usize,
    },
    /// Wait until the URL contains a fragment
    WaitForUrl {
        /// Expected fragment
        fragment: String,
    },
    /// Text of a region equals a literal
    AssertText {
        /// Target node
        target: NodeId,
        /// Expected text
        expected: String,
    },
    /// Text of a region contains a literal
    AssertContains {
        /// Target node
        target: NodeId,
        /// Expected substring
        expected: String,
    },
    /// Region is present
    AssertPresent {
        /// Target node
        target: NodeId,
    },
    /// Region disappears
    AssertAbsent {
        /// Target node
        target: NodeId,
    },
    /// Region's locator matches exactly this many elements
    AssertCount {
        /// Target node
        target: NodeId,
        /// Expected count
        expected: usize,
    },
    /// Capture the text of a region under a key
    Remember {
        /// Target node
        target: NodeId,
        /// Capture key
        key: String,
    },
    /// Text of a region still equals a captured value
    AssertUnchanged {
        /// Target node
        target: NodeId,
        /// Capture key
        key: String,
    },
    /// Click `target` unless `indicator` already shows `label`
    EnsureActive {
        /// Region showing the active label
        indicator: NodeId,
        /// Label that means "already active" (case-insensitive)
        label: String,
        /// Region to click otherwise
        target: NodeId,
    },
}

impl Action {
    /// Short action name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::LoadPage { .. } => "load_page",
            Self::Click { .. } => "click",
            Self::SetText { .. } => "set_text",
            Self::SelectIndex { .. } => "select_index",
            Self::WaitForUrl { .. } => "wait_for_url",
            Self::AssertText { .. } => "assert_text",
            Self::AssertContains { .. } => "assert_contains",
            Self::AssertPresent { .. } => "assert_present",
            Self::AssertAbsent { .. } => "assert_absent",
            Self::AssertCount { .. } => "assert_count",
            Self::Remember { .. } => "remember",
            Self::AssertUnchanged { .. } => "assert_unchanged",
            Self::EnsureActive { .. } => "ensure_active",
        }
    }

    /// Nodes the action refers to
    #[must_use]
    pub fn targets(&self) -> Vec<NodeId> {
        match self {
            Self::Navigate { expect, .. } => vec![*expect],
            Self::LoadPage { page } => vec![*page],
            Self::Click { target }
            | Self::SetText { target, .. }
            | Self::SelectIndex { target, .. }
            | Self::AssertText { target, .. }
            | Self::AssertContains { target, .. }
            | Self::AssertPresent { target }
            | Self::AssertAbsent { target }
            | Self::AssertCount { target, .. }
            | Self::Remember { target, .. }
            | Self::AssertUnchanged { target, .. } => vec![*target],
            Self::EnsureActive { indicator, target, .. } => vec![*indicator, *target],
            Self::WaitForUrl { .. } => Vec::new(),
        }
    }

    /// Whether this action only observes the page
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::AssertText { .. }
                | Self::AssertContains { .. }
                | Self::AssertPresent { .. }
                | Self::AssertAbsent { .. }
                | Self::AssertCount { .. }
                | Self::AssertUnchanged { .. }
        )
    }

    /// Default description, naming targets by their tree path
    #[must_use]
    pub fn describe(&self, tree: &PageTree) -> String {
        match self {
            Self::Navigate { url, expect } => {
                format!("navigate to {url} and expect {}", tree.path(*expect))
            }
            Self::LoadPage { page } => format!("load page {}", tree.path(*page)),
            Self::Click { target } => format!("click {}", tree.path(*target)),
            Self::SetText { target, text } => format!("set {} to {text:?}", tree.path(*target)),
            Self::SelectIndex { target, index } => {
                format!("select option {index} of {}", tree.path(*target))
            }
            Self::WaitForUrl { fragment } => format!("wait for URL containing {fragment:?}"),
            Self::AssertText { target, expected } => {
                format!("assert {} text is {expected:?}", tree.path(*target))
            }
            Self::AssertContains { target, expected } => {
                format!("assert {} text contains {expected:?}", tree.path(*target))
            }
            Self::AssertPresent { target } => format!("assert {} is present", tree.path(*target)),
            Self::AssertAbsent { target } => format!("assert {} is absent", tree.path(*target)),
            Self::AssertCount { target, expected } => {
                format!("assert {} matches {expected} elements", tree.path(*target))
            }
            Self::Remember { target, key } => {
                format!("remember text of {} as {key}", tree.path(*target))
            }
            Self::AssertUnchanged { target, key } => {
                format!("assert {} text still equals {key}", tree.path(*target))
            }
            Self::EnsureActive { indicator, label, target } => format!(
                "activate {} unless {} shows {label:?}",
                tree.path(*target),
                tree.path(*indicator)
            ),
        }
    }
}

/// An action with a human-readable description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// What the step does, used in logs and failure output
    pub description: String,
    /// The action
    pub action: Action,
}

impl Step {
    /// Create a step
    #[must_use]
    pub fn new(description: impl Into<String>, action: Action) -> Self {
        Self {
            description: description.into(),
            action,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Ordered steps over a page tree
#[derive(Debug, Clone)]
pub struct FlowScript {
    name: String,
    tree: PageTree,
    steps: Vec<Step>,
}

impl FlowScript {
    /// Create a script, checking every step target belongs to `tree`
    pub fn new(name: impl Into<String>, tree: PageTree, steps: Vec<Step>) -> FlowResult<Self> {
        let script = Self {
            name: name.into(),
            tree,
            steps,
        };
        script.validate()?;
        Ok(script)
    }

    /// Start building a script over `tree`
    #[must_use]
    pub fn builder(name: impl Into<String>, tree: PageTree) -> FlowBuilder {
        FlowBuilder {
            name: name.into(),
            tree,
            steps: Vec::new(),
        }
    }

    /// Script name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page tree the steps refer to
    #[must_use]
    pub const fn tree(&self) -> &PageTree {
        &self.tree
    }

    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check that every target exists and every text capture is used after it is taken
    pub fn validate(&self) -> FlowResult<()> {
        if self.name.trim().is_empty() {
            return Err(FlowError::invalid_script("script name is empty"));
        }
        let mut remembered: Vec<&str> = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            for target in step.action.targets() {
                if !self.tree.contains(target) {
                    return Err(FlowError::invalid_script(format!(
                        "step {} ({}) refers to unknown node {target}",
                        i + 1,
                        step.description
                    )));
                }
            }
            match &step.action {
                Action::Remember { key, .. } => remembered.push(key),
                Action::AssertUnchanged { key, .. } if !remembered.contains(&key.as_str()) => {
                    return Err(FlowError::invalid_script(format!(
                        "step {} ({}) compares with '{key}' before it is remembered",
                        i + 1,
                        step.description
                    )));
                }
                Action::SelectIndex { index: 0, .. } => {
                    return Err(FlowError::invalid_script(format!(
                        "step {} ({}) selects option 0; options start at 1",
                        i + 1,
                        step.description
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Builder for [`FlowScript`]; descriptions default to [`Action::describe`]
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    name: String,
    tree: PageTree,
    steps: Vec<Step>,
}

impl FlowBuilder {
    /// Append an action with its default description
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        let description = action.describe(&self.tree);
        self.steps.push(Step::new(description, action));
        self
    }

    /// Append an action with a custom description
    #[must_use]
    pub fn step(mut self, description: impl Into<String>, action: Action) -> Self {
        self.steps.push(Step::new(description, action));
        self
    }

    /// Navigate to `url` and expect `page`
    #[must_use]
    pub fn navigate(self, url: impl Into<String>, page: NodeId) -> Self {
        self.action(Action::Navigate {
            url: url.into(),
            expect: page,
        })
    }

    /// Resolve the current page as `page`
    #[must_use]
    pub fn load_page(self, page: NodeId) -> Self {
        self.action(Action::LoadPage { page })
    }

    /// Click `target`
    #[must_use]
    pub fn click(self, target: NodeId) -> Self {
        self.action(Action::Click { target })
    }

    /// Type `text` into `target`
    #[must_use]
    pub fn set_text(self, target: NodeId, text: impl Into<String>) -> Self {
        self.action(Action::SetText {
            target,
            text: text.into(),
        })
    }

    /// Pick option `index` (1-based) of `target`
    #[must_use]
    pub fn select_index(self, target: NodeId, index: usize) -> Self {
        self.action(Action::SelectIndex { target, index })
    }

    /// Wait for the URL to contain `fragment`
    #[must_use]
    pub fn wait_for_url(self, fragment: impl Into<String>) -> Self {
        self.action(Action::WaitForUrl {
            fragment: fragment.into(),
        })
    }

    /// Assert the text of `target`
    #[must_use]
    pub fn assert_text(self, target: NodeId, expected: impl Into<String>) -> Self {
        self.action(Action::AssertText {
            target,
            expected: expected.into(),
        })
    }

    /// Assert the text of `target` contains `expected`
    #[must_use]
    pub fn assert_contains(self, target: NodeId, expected: impl Into<String>) -> Self {
        self.action(Action::AssertContains {
            target,
            expected: expected.into(),
        })
    }

    /// Assert `target` is present
    #[must_use]
    pub fn assert_present(self, target: NodeId) -> Self {
        self.action(Action::AssertPresent { target })
    }

    /// Assert `target` disappears
    #[must_use]
    pub fn assert_absent(self, target: NodeId) -> Self {
        self.action(Action::AssertAbsent { target })
    }

    /// Assert the number of elements `target` matches
    #[must_use]
    pub fn assert_count(self, target: NodeId, expected: usize) -> Self {
        self.action(Action::AssertCount { target, expected })
    }

    /// Capture the text of `target` under `key`
    #[must_use]
    pub fn remember(self, target: NodeId, key: impl Into<String>) -> Self {
        self.action(Action::Remember {
            target,
            key: key.into(),
        })
    }

    /// Assert the text of `target` still equals the capture under `key`
    #[must_use]
    pub fn assert_unchanged(self, target: NodeId, key: impl Into<String>) -> Self {
        self.action(Action::AssertUnchanged {
            target,
            key: key.into(),
        })
    }

    /// Click `target` unless `indicator` already reads `label`
    #[must_use]
    pub fn ensure_active(self, indicator: NodeId, label: impl Into<String>, target: NodeId) -> Self {
        self.action(Action::EnsureActive {
            indicator,
            label: label.into(),
            target,
        })
    }

    /// Finish the script
    pub fn build(self) -> FlowResult<FlowScript> {
        FlowScript::new(self.name, self.tree, self.steps)
    }
}
