//! YAML flow documents.
//!
//! A document declares the page-object nodes a flow needs and the ordered
//! steps over them:
//!
//! ```yaml
//! version: "1.0"
//! name: edit-account
//! pages:
//!   - id: home
//!     locator: { css: one-record-home-flexipage2 }
//!     kind: page
//!   - id: edit
//!     parent: home
//!     locator: { css_with_text: { css: button, text: Edit } }
//!     kind: button
//! steps:
//!   - action: navigate
//!     url: ${base_url}/lightning/r/Account/${account_id}/view
//!     expect: home
//!   - action: click
//!     target: edit
//! ```
//!
//! `${name}` placeholders are filled from the test environment when the
//! document is compiled; `${now}` is the current local date and time.

use crate::locator::{Locator, Selector};
use crate::page_object::{NodeId, PageTree, RegionKind};
use crate::result::{FlowError, FlowResult};
use crate::step::{Action, FlowScript, Step};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

/// Supported document version
pub const DOCUMENT_VERSION: &str = "1.0";

/// Variable that expands to the current timestamp unless set explicitly
pub const NOW_VAR: &str = "now";

/// Timestamp format used for `${now}` (e.g. `Oct 19, 2026, 3:04 PM`)
pub const NOW_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

const PLACEHOLDER: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

/// Root of a flow document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Schema version (must be "1.0")
    #[serde(default = "default_version")]
    pub version: String,
    /// Script name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Page-object nodes; parents must be declared before children
    #[serde(default)]
    pub pages: Vec<PageDecl>,
    /// Steps in execution order
    pub steps: Vec<StepDecl>,
}

/// Declaration of one page-object node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDecl {
    /// Identifier steps refer to
    pub id: String,
    /// Owning node id; omitted for page roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Selector relative to the parent
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub locator: Selector,
    /// Pick the n-th match (0-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
    /// Region kind
    #[serde(default)]
    pub kind: RegionKind,
}

/// Declaration of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDecl {
    /// Description; generated from the action when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The action
    #[serde(flatten)]
    pub action: ActionDecl,
}

/// Step action referring to nodes by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDecl {
    /// Load a URL and wait for a page root
    Navigate {
        /// URL
        url: String,
        /// Expected root id
        expect: String,
    },
    /// Resolve the current page
    LoadPage {
        /// Root id
        page: String,
    },
    /// Click
    Click {
        /// Node id
        target: String,
    },
    /// Type text
    SetText {
        /// Node id
        target: String,
        /// Text
        text: String,
    },
    /// Pick an option (1-based)
    SelectIndex {
        /// Node id
        target: String,
        /// Option position
        index: usize,
    },
    /// Wait for the URL
    WaitForUrl {
        /// Expected fragment
        fragment: String,
    },
    /// Text equals
    AssertText {
        /// Node id
        target: String,
        /// Expected text
        expected: String,
    },
    /// Text contains
    AssertContains {
        /// Node id
        target: String,
        /// Expected substring
        expected: String,
    },
    /// Node present
    AssertPresent {
        /// Node id
        target: String,
    },
    /// Node absent
    AssertAbsent {
        /// Node id
        target: String,
    },
    /// Match count
    AssertCount {
        /// Node id
        target: String,
        /// Expected count
        expected: usize,
    },
    /// Capture text
    Remember {
        /// Node id
        target: String,
        /// Capture key
        key: String,
    },
    /// Compare with a capture
    AssertUnchanged {
        /// Node id
        target: String,
        /// Capture key
        key: String,
    },
    /// Click unless already active
    EnsureActive {
        /// Node showing the active label
        indicator: String,
        /// Active label
        label: String,
        /// Node to click
        target: String,
    },
}

impl ActionDecl {
    fn node_ids(&self) -> Vec<&str> {
        match self {
            Self::Navigate { expect, .. } => vec![expect.as_str()],
            Self::LoadPage { page } => vec![page.as_str()],
            Self::Click { target }
            | Self::SetText { target, .. }
            | Self::SelectIndex { target, .. }
            | Self::AssertText { target, .. }
            | Self::AssertContains { target, .. }
            | Self::AssertPresent { target }
            | Self::AssertAbsent { target }
            | Self::AssertCount { target, .. }
            | Self::Remember { target, .. }
            | Self::AssertUnchanged { target, .. } => vec![target.as_str()],
            Self::EnsureActive { indicator, target, .. } => vec![indicator.as_str(), target.as_str()],
            Self::WaitForUrl { .. } => Vec::new(),
        }
    }

    fn texts(&self) -> Vec<&str> {
        match self {
            Self::Navigate { url, .. } => vec![url.as_str()],
            Self::SetText { text, .. } => vec![text.as_str()],
            Self::WaitForUrl { fragment } => vec![fragment.as_str()],
            Self::AssertText { expected, .. } | Self::AssertContains { expected, .. } => {
                vec![expected.as_str()]
            }
            Self::EnsureActive { label, .. } => vec![label.as_str()],
            _ => Vec::new(),
        }
    }
}

impl FlowDocument {
    /// Parse and validate a YAML (or JSON) document
    pub fn from_yaml(content: &str) -> FlowResult<Self> {
        let document: Self = serde_yaml_ng::from_str(content)?;
        document.validate()?;
        Ok(document)
    }

    /// Load a `.yaml`, `.yml` or `.json` document
    pub fn from_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml_ng::from_str(&content)?,
        };
        document.validate()?;
        Ok(document)
    }

    /// Check structure: version, unique ids, parents declared first, known step targets
    pub fn validate(&self) -> FlowResult<()> {
        if self.version != DOCUMENT_VERSION {
            return Err(FlowError::invalid_script(format!(
                "unsupported document version '{}' (expected {DOCUMENT_VERSION})",
                self.version
            )));
        }
        if self.name.trim().is_empty() {
            return Err(FlowError::invalid_script("document has no name"));
        }

        let mut declared: BTreeSet<&str> = BTreeSet::new();
        for page in &self.pages {
            if page.id.trim().is_empty() {
                return Err(FlowError::invalid_script("page declaration with empty id"));
            }
            if page.locator.is_empty() {
                return Err(FlowError::invalid_script(format!(
                    "page '{}' has an empty locator",
                    page.id
                )));
            }
            if let Some(parent) = &page.parent {
                if !declared.contains(parent.as_str()) {
                    return Err(FlowError::invalid_script(format!(
                        "page '{}' has unknown parent '{parent}' (parents must be declared first)",
                        page.id
                    )));
                }
            }
            if !declared.insert(&page.id) {
                return Err(FlowError::invalid_script(format!("duplicate page id '{}'", page.id)));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            for id in step.action.node_ids() {
                if !declared.contains(id) {
                    return Err(FlowError::invalid_script(format!(
                        "step {} refers to unknown page id '{id}'",
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }

    /// Variables referenced by placeholders, in name order
    pub fn variables(&self) -> FlowResult<BTreeSet<String>> {
        let pattern = placeholder_regex()?;
        let mut names = BTreeSet::new();
        let texts = self
            .steps
            .iter()
            .flat_map(|s| s.action.texts())
            .chain(self.steps.iter().filter_map(|s| s.description.as_deref()))
            .chain(self.pages.iter().flat_map(|p| selector_texts(&p.locator)));
        for text in texts {
            for caps in pattern.captures_iter(text) {
                let _ = names.insert(caps[1].to_string());
            }
        }
        Ok(names)
    }

    /// Variables referenced but not provided by `vars` (`now` is always provided)
    pub fn missing_variables(&self, vars: &BTreeMap<String, String>) -> FlowResult<Vec<String>> {
        Ok(self
            .variables()?
            .into_iter()
            .filter(|name| name != NOW_VAR && !vars.contains_key(name))
            .collect())
    }

    /// Build the page tree and flow script, filling placeholders from `vars`
    pub fn compile(&self, vars: &BTreeMap<String, String>) -> FlowResult<FlowScript> {
        self.validate()?;
        let mut vars = vars.clone();
        if !vars.contains_key(NOW_VAR) {
            let now = chrono::Local::now().format(NOW_FORMAT).to_string();
            let _ = vars.insert(NOW_VAR.to_string(), now);
        }
        let fill = |text: &str| interpolate(text, &vars);

        let mut tree = PageTree::new();
        let mut ids: HashMap<&str, NodeId> = HashMap::new();
        for page in &self.pages {
            let mut locator = Locator::from_selector(fill_selector(&page.locator, &fill)?);
            if let Some(n) = page.nth {
                locator = locator.nth(n);
            }
            let node = match page.parent.as_deref().and_then(|p| ids.get(p)) {
                Some(&parent) => tree.try_child(parent, page.id.clone(), locator, page.kind)?,
                None => tree.root(page.id.clone(), locator),
            };
            let _ = ids.insert(page.id.as_str(), node);
        }

        let node = |id: &str| {
            ids.get(id)
                .copied()
                .ok_or_else(|| FlowError::invalid_script(format!("unknown page id '{id}'")))
        };

        let mut steps = Vec::with_capacity(self.steps.len());
        for decl in &self.steps {
            let action = match &decl.action {
                ActionDecl::Navigate { url, expect } => Action::Navigate {
                    url: fill(url)?,
                    expect: node(expect)?,
                },
                ActionDecl::LoadPage { page } => Action::LoadPage { page: node(page)? },
                ActionDecl::Click { target } => Action::Click {
                    target: node(target)?,
                },
                ActionDecl::SetText { target, text } => Action::SetText {
                    target: node(target)?,
                    text: fill(text)?,
                },
                ActionDecl::SelectIndex { target, index } => Action::SelectIndex {
                    target: node(target)?,
                    index: *index,
                },
                ActionDecl::WaitForUrl { fragment } => Action::WaitForUrl {
                    fragment: fill(fragment)?,
                },
                ActionDecl::AssertText { target, expected } => Action::AssertText {
                    target: node(target)?,
                    expected: fill(expected)?,
                },
                ActionDecl::AssertContains { target, expected } => Action::AssertContains {
                    target: node(target)?,
                    expected: fill(expected)?,
                },
                ActionDecl::AssertPresent { target } => Action::AssertPresent {
                    target: node(target)?,
                },
                ActionDecl::AssertAbsent { target } => Action::AssertAbsent {
                    target: node(target)?,
                },
                ActionDecl::AssertCount { target, expected } => Action::AssertCount {
                    target: node(target)?,
                    expected: *expected,
                },
                ActionDecl::Remember { target, key } => Action::Remember {
                    target: node(target)?,
                    key: key.clone(),
                },
                ActionDecl::AssertUnchanged { target, key } => Action::AssertUnchanged {
                    target: node(target)?,
                    key: key.clone(),
                },
                ActionDecl::EnsureActive {
                    indicator,
                    label,
                    target,
                } => Action::EnsureActive {
                    indicator: node(indicator)?,
                    label: fill(label)?,
                    target: node(target)?,
                },
            };
            let description = match &decl.description {
                Some(d) => fill(d)?,
                None => action.describe(&tree),
            };
            steps.push(Step::new(description, action));
        }

        FlowScript::new(self.name.clone(), tree, steps)
    }
}

/// Compiled once per process
fn placeholder_regex() -> FlowResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(PLACEHOLDER))
        .as_ref()
        .map_err(|e| FlowError::config(format!("placeholder pattern: {e}")))
}

fn selector_texts(selector: &Selector) -> Vec<&str> {
    match selector {
        Selector::Css(s) | Selector::XPath(s) | Selector::Text(s) | Selector::TestId(s) => vec![s.as_str()],
        Selector::CssWithText { css, text } => vec![css.as_str(), text.as_str()],
    }
}

fn fill_selector<F>(selector: &Selector, fill: &F) -> FlowResult<Selector>
where
    F: Fn(&str) -> FlowResult<String>,
{
    Ok(match selector {
        Selector::Css(s) => Selector::Css(fill(s)?),
        Selector::XPath(s) => Selector::XPath(fill(s)?),
        Selector::Text(s) => Selector::Text(fill(s)?),
        Selector::TestId(s) => Selector::TestId(fill(s)?),
        Selector::CssWithText { css, text } => Selector::CssWithText {
            css: fill(css)?,
            text: fill(text)?,
        },
    })
}

/// Replace `${name}` placeholders; an unknown name is a configuration error
pub fn interpolate(text: &str, vars: &BTreeMap<String, String>) -> FlowResult<String> {
    let pattern = placeholder_regex()?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = vars.get(name.as_str()).ok_or_else(|| {
            FlowError::config(format!("undefined variable '${{{}}}'", name.as_str()))
        })?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}
