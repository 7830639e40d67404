//! Interaction capabilities of page regions.
//!
//! Each region kind implements exactly the capabilities it supports. Flow
//! steps ask a [`Region`] for the capability they need and fail with
//! [`FlowError::UnsupportedAction`] when it is missing, so the executor
//! never matches on region kinds itself.

use crate::page_object::{NodeId, PageTree, RegionKind};
use crate::result::{FlowError, FlowResult};
use crate::session::Session;

/// Anything that occupies part of the page
pub trait Presentable {
    /// Node this region is bound to
    fn node(&self) -> NodeId;

    /// Kind of region
    fn kind(&self) -> RegionKind;

    /// Whether the region is on the page right now
    fn is_present(&self, session: &mut Session, tree: &PageTree) -> FlowResult<bool> {
        session.is_present(tree, self.node())
    }

    /// Visible text (input value for editable regions)
    fn text(&self, session: &mut Session, tree: &PageTree) -> FlowResult<String> {
        session.text(tree, self.node())
    }

    /// Wait for the region to disappear
    fn wait_for_absence(&self, session: &mut Session, tree: &PageTree) -> FlowResult<bool> {
        session.wait_for_absence(tree, self.node())
    }

    /// Number of elements matching the region's locator
    fn count(&self, session: &mut Session, tree: &PageTree) -> FlowResult<usize> {
        session.count(tree, self.node())
    }
}

/// Regions that can be clicked
pub trait Clickable: Presentable {
    /// Click the region
    fn click(&self, session: &mut Session, tree: &PageTree) -> FlowResult<()> {
        session.click(tree, self.node())
    }
}

/// Regions whose value can be typed
pub trait TextEditable: Presentable {
    /// Replace the region's value
    fn set_text(&self, session: &mut Session, tree: &PageTree, text: &str) -> FlowResult<()> {
        session.set_text(tree, self.node(), text)
    }
}

/// Regions offering a list of options
pub trait Selectable: Presentable {
    /// Pick the option at `index` (1-based)
    fn select_index(&self, session: &mut Session, tree: &PageTree, index: usize) -> FlowResult<()> {
        if index == 0 {
            return Err(FlowError::invalid_script("option indexes start at 1"));
        }
        session.select_index(tree, self.node(), index)
    }
}

macro_rules! region {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub NodeId);

        impl Presentable for $name {
            fn node(&self) -> NodeId {
                self.0
            }

            fn kind(&self) -> RegionKind {
                $kind
            }
        }
    };
}

region!(
    /// Page root or structural container
    Container => RegionKind::Container
);
region!(
    /// Button or link
    Button => RegionKind::Button
);
region!(
    /// Text input
    TextInput => RegionKind::TextInput
);
region!(
    /// Date picker input
    Datepicker => RegionKind::Datepicker
);
region!(
    /// Combobox or picklist
    Combobox => RegionKind::Combobox
);
region!(
    /// Tab header
    Tab => RegionKind::Tab
);
region!(
    /// Checkbox
    Checkbox => RegionKind::Checkbox
);
region!(
    /// Data table
    Table => RegionKind::Table
);
region!(
    /// Read-only text
    TextRegion => RegionKind::Text
);

impl Clickable for Button {}
impl Clickable for Tab {}
impl Clickable for Checkbox {}
impl Clickable for TextInput {}
impl Clickable for Datepicker {}
impl Clickable for Combobox {}

impl TextEditable for TextInput {}
impl TextEditable for Datepicker {}

impl Selectable for Combobox {}

/// A node viewed through its region kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Page root or container
    Container(Container),
    /// Button
    Button(Button),
    /// Text input
    TextInput(TextInput),
    /// Date picker
    Datepicker(Datepicker),
    /// Combobox
    Combobox(Combobox),
    /// Tab
    Tab(Tab),
    /// Checkbox
    Checkbox(Checkbox),
    /// Table
    Table(Table),
    /// Text
    Text(TextRegion),
}

impl Region {
    /// Region for a node of the given kind
    #[must_use]
    pub const fn new(node: NodeId, kind: RegionKind) -> Self {
        match kind {
            RegionKind::Page | RegionKind::Container => Self::Container(Container(node)),
            RegionKind::Button => Self::Button(Button(node)),
            RegionKind::TextInput => Self::TextInput(TextInput(node)),
            RegionKind::Datepicker => Self::Datepicker(Datepicker(node)),
            RegionKind::Combobox => Self::Combobox(Combobox(node)),
            RegionKind::Tab => Self::Tab(Tab(node)),
            RegionKind::Checkbox => Self::Checkbox(Checkbox(node)),
            RegionKind::Table => Self::Table(Table(node)),
            RegionKind::Text => Self::Text(TextRegion(node)),
        }
    }

    /// Region for a node of `tree`
    pub fn of(tree: &PageTree, node: NodeId) -> FlowResult<Self> {
        Ok(Self::new(node, tree.get(node)?.kind))
    }

    /// Every region is presentable
    #[must_use]
    pub fn as_presentable(&self) -> &dyn Presentable {
        match self {
            Self::Container(r) => r,
            Self::Button(r) => r,
            Self::TextInput(r) => r,
            Self::Datepicker(r) => r,
            Self::Combobox(r) => r,
            Self::Tab(r) => r,
            Self::Checkbox(r) => r,
            Self::Table(r) => r,
            Self::Text(r) => r,
        }
    }

    /// Click capability, if supported
    #[must_use]
    pub fn as_clickable(&self) -> Option<&dyn Clickable> {
        match self {
            Self::Button(r) => Some(r),
            Self::Tab(r) => Some(r),
            Self::Checkbox(r) => Some(r),
            Self::TextInput(r) => Some(r),
            Self::Datepicker(r) => Some(r),
            Self::Combobox(r) => Some(r),
            Self::Container(_) | Self::Table(_) | Self::Text(_) => None,
        }
    }

    /// Text entry capability, if supported
    #[must_use]
    pub fn as_text_editable(&self) -> Option<&dyn TextEditable> {
        match self {
            Self::TextInput(r) => Some(r),
            Self::Datepicker(r) => Some(r),
            _ => None,
        }
    }

    /// Selection capability, if supported
    #[must_use]
    pub fn as_selectable(&self) -> Option<&dyn Selectable> {
        match self {
            Self::Combobox(r) => Some(r),
            _ => None,
        }
    }

    /// Click capability or an `UnsupportedAction` error naming the node
    pub fn clickable(&self, tree: &PageTree) -> FlowResult<&dyn Clickable> {
        self.as_clickable()
            .ok_or_else(|| self.unsupported(tree, "clicked"))
    }

    /// Text entry capability or an `UnsupportedAction` error naming the node
    pub fn text_editable(&self, tree: &PageTree) -> FlowResult<&dyn TextEditable> {
        self.as_text_editable()
            .ok_or_else(|| self.unsupported(tree, "typed into"))
    }

    /// Selection capability or an `UnsupportedAction` error naming the node
    pub fn selectable(&self, tree: &PageTree) -> FlowResult<&dyn Selectable> {
        self.as_selectable()
            .ok_or_else(|| self.unsupported(tree, "selected from"))
    }

    fn unsupported(&self, tree: &PageTree, capability: &str) -> FlowError {
        let presentable = self.as_presentable();
        FlowError::UnsupportedAction {
            target: tree.path(presentable.node()),
            kind: presentable.kind().to_string(),
            capability: capability.to_string(),
        }
    }
}
