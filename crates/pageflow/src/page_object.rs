//! Page-object trees.
//!
//! Page objects form an ownership chain (panel -> form -> layout -> item ->
//! input). Instead of a type hierarchy, every node lives in a [`PageTree`]
//! arena and points at its parent by index. A node is only a description
//! (name, locator, region kind); resolving it against a live page is the
//! session's job and happens lazily, the first time a step touches it.

use crate::locator::{Locator, LocatorChain};
use crate::result::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Index of a node inside a [`PageTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of UI region a node represents; decides its capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Root of a page
    Page,
    /// Structural container (panel, form, layout, modal)
    #[default]
    Container,
    /// Button or link
    Button,
    /// Text input
    TextInput,
    /// Date picker input
    Datepicker,
    /// Combobox / picklist
    Combobox,
    /// Tab header
    Tab,
    /// Checkbox
    Checkbox,
    /// Data table
    Table,
    /// Read-only text
    Text,
}

impl RegionKind {
    /// Name used in messages and documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Container => "container",
            Self::Button => "button",
            Self::TextInput => "text_input",
            Self::Datepicker => "datepicker",
            Self::Combobox => "combobox",
            Self::Tab => "tab",
            Self::Checkbox => "checkbox",
            Self::Table => "table",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed page root.
///
/// Implement this for every page a flow can land on; the navigator uses
/// the root locator to decide whether the page has loaded.
///
/// # Example
///
/// ```
/// use pageflow::{Locator, PageTree, PageType};
///
/// struct LoginPage;
///
/// impl PageType for LoginPage {
///     const NAME: &'static str = "LoginPage";
///
///     fn root_locator() -> Locator {
///         Locator::new("form#login")
///     }
/// }
///
/// let mut tree = PageTree::new();
/// let root = tree.page::<LoginPage>();
/// assert_eq!(tree.path(root), "LoginPage");
/// ```
pub trait PageType {
    /// Page name used in logs and errors
    const NAME: &'static str;

    /// Locator of the element that marks the page as loaded
    fn root_locator() -> Locator;
}

/// One node of a page-object tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    /// Node name (unique among siblings)
    pub name: String,
    /// Locator relative to the parent
    pub locator: Locator,
    /// Owning node, `None` for page roots
    pub parent: Option<NodeId>,
    /// Region kind
    pub kind: RegionKind,
    children: Vec<NodeId>,
}

impl PageNode {
    /// Child nodes in insertion order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is a page root
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena of page-object nodes addressed by [`NodeId`]
#[derive(Debug, Clone)]
pub struct PageTree {
    id: Uuid,
    nodes: Vec<PageNode>,
    roots: HashMap<String, NodeId>,
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTree {
    /// Create an empty tree with a fresh identity
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: Vec::new(),
            roots: HashMap::new(),
        }
    }

    /// Identity of this tree; session caches are keyed by it
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add (or return the existing) root node with this name
    pub fn root(&mut self, name: impl Into<String>, locator: Locator) -> NodeId {
        let name = name.into();
        if let Some(&id) = self.roots.get(&name) {
            return id;
        }
        let id = self.push(PageNode {
            name: name.clone(),
            locator,
            parent: None,
            kind: RegionKind::Page,
            children: Vec::new(),
        });
        let _ = self.roots.insert(name, id);
        id
    }

    /// Add (or return the existing) root for a typed page
    pub fn page<P: PageType>(&mut self) -> NodeId {
        self.root(P::NAME, P::root_locator())
    }

    /// Add a child under `parent`.
    ///
    /// Asking twice for the same name and locator under the same parent
    /// returns the same node, so repeated page-object getters share one
    /// cached resolution.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        locator: Locator,
        kind: RegionKind,
    ) -> NodeId {
        let name = name.into();
        let existing = self.nodes[parent.0].children.iter().copied().find(|c| {
            let node = &self.nodes[c.0];
            node.name == name && node.locator == locator && node.kind == kind
        });
        if let Some(id) = existing {
            return id;
        }

        let id = self.push(PageNode {
            name,
            locator,
            parent: Some(parent),
            kind,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add a child, validating the parent id first
    pub fn try_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        locator: Locator,
        kind: RegionKind,
    ) -> FlowResult<NodeId> {
        let _ = self.get(parent)?;
        Ok(self.child(parent, name, locator, kind))
    }

    fn push(&mut self, node: PageNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Get a node
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PageNode> {
        self.nodes.get(id.0)
    }

    /// Get a node or fail with an invalid-script error
    pub fn get(&self, id: NodeId) -> FlowResult<&PageNode> {
        self.node(id)
            .ok_or_else(|| FlowError::invalid_script(format!("unknown page-object node {id}")))
    }

    /// Whether `id` belongs to this tree
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Nodes from the page root down to `id` (inclusive)
    #[must_use]
    pub fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut lineage = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.node(node_id) {
                Some(node) => {
                    lineage.push(node_id);
                    current = node.parent;
                }
                None => break,
            }
        }
        lineage.reverse();
        lineage
    }

    /// Locator chain from the page root to `id`
    #[must_use]
    pub fn chain(&self, id: NodeId) -> LocatorChain {
        self.lineage(id)
            .into_iter()
            .filter_map(|n| self.node(n))
            .map(|n| n.locator.clone())
            .collect()
    }

    /// Human-readable path, e.g. `RecordHome > highlights > actions`
    #[must_use]
    pub fn path(&self, id: NodeId) -> String {
        self.lineage(id)
            .into_iter()
            .filter_map(|n| self.node(n))
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// `id` and every node below it
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.node(next) {
                out.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// All page roots
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self.roots.values().copied().collect();
        roots.sort();
        roots
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct RecordHome;

    impl PageType for RecordHome {
        const NAME: &'static str = "RecordHome";

        fn root_locator() -> Locator {
            Locator::new("one-record-home-flexipage2")
        }
    }

    fn sample() -> (PageTree, NodeId, NodeId, NodeId) {
        let mut tree = PageTree::new();
        let root = tree.page::<RecordHome>();
        let form = tree.child(root, "form", Locator::new("records-form"), RegionKind::Container);
        let input = tree.child(form, "name", Locator::new("input").nth(0), RegionKind::TextInput);
        (tree, root, form, input)
    }

    mod tree_tests {
        use super::*;

        #[test]
        fn test_page_root_is_shared() {
            let mut tree = PageTree::new();
            let a = tree.page::<RecordHome>();
            let b = tree.page::<RecordHome>();
            assert_eq!(a, b);
            assert_eq!(tree.len(), 1);
            assert_eq!(tree.get(a).unwrap().kind, RegionKind::Page);
        }

        #[test]
        fn test_child_dedup() {
            let (mut tree, _, form, input) = sample();
            let again = tree.child(form, "name", Locator::new("input").nth(0), RegionKind::TextInput);
            assert_eq!(again, input);
            let other = tree.child(form, "name", Locator::new("input").nth(1), RegionKind::TextInput);
            assert_ne!(other, input);
        }

        #[test]
        fn test_chain_and_path() {
            let (tree, root, _, input) = sample();
            assert_eq!(
                tree.chain(input).to_string(),
                "one-record-home-flexipage2 >> records-form >> input:nth(0)"
            );
            assert_eq!(tree.path(input), "RecordHome > form > name");
            assert_eq!(tree.lineage(input).first(), Some(&root));
        }

        #[test]
        fn test_subtree() {
            let (tree, root, form, input) = sample();
            assert_eq!(tree.subtree(root), vec![root, form, input]);
            assert_eq!(tree.subtree(input), vec![input]);
        }

        #[test]
        fn test_unknown_node() {
            let (tree, ..) = sample();
            assert!(tree.get(NodeId(99)).is_err());
            assert!(!tree.contains(NodeId(99)));
        }

        #[test]
        fn test_try_child_rejects_foreign_parent() {
            let mut tree = PageTree::new();
            let result = tree.try_child(NodeId(3), "x", Locator::new("x"), RegionKind::Button);
            assert!(result.is_err());
        }

        #[test]
        fn test_tree_identity_is_unique() {
            assert_ne!(PageTree::new().id(), PageTree::new().id());
        }
    }

    mod region_kind_tests {
        use super::*;

        #[test]
        fn test_display() {
            assert_eq!(RegionKind::TextInput.to_string(), "text_input");
            assert_eq!(RegionKind::default(), RegionKind::Container);
        }

        #[test]
        fn test_serde_names() {
            let kind: RegionKind = serde_json::from_str("\"combobox\"").unwrap();
            assert_eq!(kind, RegionKind::Combobox);
        }
    }
}
