//! Lightning page objects.
//!
//! Each struct is a thin, copyable view over nodes in a [`PageTree`]. Getters
//! add the child node on first use and return the same node afterwards, so
//! a flow can call them freely while building its steps.

use crate::locator::Locator;
use crate::page_object::{NodeId, PageTree, PageType, RegionKind};

fn container(tree: &mut PageTree, parent: NodeId, name: &str, css: &str) -> NodeId {
    tree.child(parent, name, Locator::new(css), RegionKind::Container)
}

/// Record home page (`one-record-home-flexipage2`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHome {
    /// Page root
    pub root: NodeId,
}

impl PageType for RecordHome {
    const NAME: &'static str = "RecordHome";

    fn root_locator() -> Locator {
        Locator::new("one-record-home-flexipage2")
    }
}

impl RecordHome {
    /// Add (or reuse) the page root
    pub fn load(tree: &mut PageTree) -> Self {
        Self {
            root: tree.page::<Self>(),
        }
    }

    /// Highlights panel at the top of the record
    pub fn highlights(&self, tree: &mut PageTree) -> HighlightsPanel {
        HighlightsPanel {
            node: container(tree, self.root, "highlights", "records-lwc-highlights-panel"),
        }
    }

    /// Main tabset (Related, Details, News...)
    pub fn tabset(&self, tree: &mut PageTree) -> Tabset {
        Tabset {
            node: container(tree, self.root, "tabset", "lightning-tabset"),
        }
    }
}

/// Record highlights panel with the record-level actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightsPanel {
    /// Panel node
    pub node: NodeId,
}

impl HighlightsPanel {
    /// Action button with the given title (e.g. "Edit")
    pub fn action(&self, tree: &mut PageTree, title: &str) -> NodeId {
        let renderer = tree.child(
            self.node,
            format!("action '{title}'"),
            Locator::new(format!("runtime_platform_actions-action-renderer[title='{title}']")),
            RegionKind::Container,
        );
        tree.child(renderer, "button", Locator::new("button"), RegionKind::Button)
    }
}

/// Record action modal (`records-record-action-wrapper`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordActionWrapper {
    /// Page root
    pub root: NodeId,
}

impl PageType for RecordActionWrapper {
    const NAME: &'static str = "RecordActionWrapper";

    fn root_locator() -> Locator {
        Locator::new("records-record-action-wrapper")
    }
}

impl RecordActionWrapper {
    /// Add (or reuse) the modal root
    pub fn load(tree: &mut PageTree) -> Self {
        Self {
            root: tree.page::<Self>(),
        }
    }

    /// Record form inside the modal
    pub fn record_form(&self, tree: &mut PageTree) -> BaseRecordForm {
        BaseRecordForm {
            node: container(tree, self.root, "form", "records-base-record-form"),
        }
    }

    /// Detail panel inside the modal (edit layouts with field sections)
    pub fn detail_panel(&self, tree: &mut PageTree) -> DetailPanel {
        DetailPanel {
            node: container(tree, self.root, "detail panel", "records-lwc-detail-panel"),
        }
    }
}

/// Record form with a layout and a footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseRecordForm {
    /// Form node
    pub node: NodeId,
}

impl BaseRecordForm {
    /// Field layout
    pub fn record_layout(&self, tree: &mut PageTree) -> RecordLayout {
        RecordLayout {
            node: container(tree, self.node, "layout", "records-lwc-record-layout"),
        }
    }

    /// Footer button with the given label ("Save", "Cancel")
    pub fn footer_button(&self, tree: &mut PageTree, label: &str) -> NodeId {
        let footer = container(tree, self.node, "footer", "records-form-footer");
        tree.child(
            footer,
            format!("button '{label}'"),
            Locator::new("button").with_text(label),
            RegionKind::Button,
        )
    }
}

/// Sectioned field layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Layout node
    pub node: NodeId,
}

impl RecordLayout {
    /// Item at `section`, `row`, `column` (all 1-based)
    pub fn item(&self, tree: &mut PageTree, section: usize, row: usize, column: usize) -> RecordLayoutItem {
        let css = format!(
            "records-record-layout-section:nth-of-type({section}) \
             records-record-layout-row:nth-of-type({row}) \
             records-record-layout-item:nth-of-type({column})"
        );
        RecordLayoutItem {
            node: tree.child(
                self.node,
                format!("item({section},{row},{column})"),
                Locator::new(css),
                RegionKind::Container,
            ),
        }
    }

    /// Editable item whose field label is `label` (e.g. "Account Name")
    pub fn editable_item_by_name(&self, tree: &mut PageTree, label: &str) -> RecordLayoutItem {
        RecordLayoutItem {
            node: tree.child(
                self.node,
                format!("item '{label}'"),
                Locator::new("records-record-layout-item").with_text(label),
                RegionKind::Container,
            ),
        }
    }
}

/// One field of a record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayoutItem {
    /// Item node
    pub node: NodeId,
}

impl RecordLayoutItem {
    /// Text input of the field
    pub fn text_input(&self, tree: &mut PageTree) -> NodeId {
        tree.child(self.node, "text input", Locator::new("input"), RegionKind::TextInput)
    }

    /// Date input of the field
    pub fn datepicker(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.node,
            "datepicker",
            Locator::new("lightning-datepicker input"),
            RegionKind::Datepicker,
        )
    }

    /// Time combobox input of a date-time field
    pub fn time_input(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.node,
            "time input",
            Locator::new("lightning-timepicker input"),
            RegionKind::TextInput,
        )
    }

    /// Picklist or lookup combobox of the field
    pub fn combobox(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.node,
            "combobox",
            Locator::new("lightning-base-combobox"),
            RegionKind::Combobox,
        )
    }

    /// Formatted name output (read mode)
    pub fn formatted_name(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.node,
            "formatted name",
            Locator::new("lightning-formatted-name"),
            RegionKind::Text,
        )
    }

    /// Pencil button that switches the field to inline edit
    pub fn inline_edit_button(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.node,
            "inline edit",
            Locator::new("button.inline-edit-trigger"),
            RegionKind::Button,
        )
    }
}

/// Lightning tabset with a tab bar and the active tab's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tabset {
    /// Tabset node
    pub node: NodeId,
}

impl Tabset {
    fn tab_bar(&self, tree: &mut PageTree) -> NodeId {
        container(tree, self.node, "tab bar", "lightning-tab-bar")
    }

    /// Label of the active tab
    pub fn active_tab(&self, tree: &mut PageTree) -> NodeId {
        let bar = self.tab_bar(tree);
        tree.child(bar, "active tab", Locator::new("li.slds-is-active a"), RegionKind::Text)
    }

    /// Tab header with the given label
    pub fn tab(&self, tree: &mut PageTree, label: &str) -> NodeId {
        let bar = self.tab_bar(tree);
        tree.child(
            bar,
            format!("tab '{label}'"),
            Locator::new(format!("a[data-label='{label}']")),
            RegionKind::Tab,
        )
    }

    /// Details panel in the active tab
    pub fn detail_panel(&self, tree: &mut PageTree) -> DetailPanel {
        DetailPanel {
            node: container(tree, self.node, "detail panel", "records-lwc-detail-panel"),
        }
    }
}

/// Record details panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailPanel {
    /// Panel node
    pub node: NodeId,
}

impl DetailPanel {
    /// Record form of the panel
    pub fn record_form(&self, tree: &mut PageTree) -> BaseRecordForm {
        BaseRecordForm {
            node: container(tree, self.node, "form", "records-base-record-form"),
        }
    }
}

/// Desktop detail panel loaded as its own page (`records-lwc-detail-panel`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailPanelDesktop {
    /// Page root
    pub root: NodeId,
}

impl PageType for DetailPanelDesktop {
    const NAME: &'static str = "DetailPanelDesktop";

    fn root_locator() -> Locator {
        Locator::new("records-lwc-detail-panel")
    }
}

impl DetailPanelDesktop {
    /// Add (or reuse) the page root
    pub fn load(tree: &mut PageTree) -> Self {
        Self {
            root: tree.page::<Self>(),
        }
    }

    /// Field layout of the panel
    pub fn record_layout(&self, tree: &mut PageTree) -> RecordLayout {
        RecordLayout {
            node: container(tree, self.root, "layout", "records-lwc-record-layout"),
        }
    }
}

/// Console object home with list views (`lst-object-home`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHome {
    /// Page root
    pub root: NodeId,
}

impl PageType for ObjectHome {
    const NAME: &'static str = "ObjectHome";

    fn root_locator() -> Locator {
        Locator::new("lst-object-home")
    }
}

impl ObjectHome {
    /// Add (or reuse) the page root
    pub fn load(tree: &mut PageTree) -> Self {
        Self {
            root: tree.page::<Self>(),
        }
    }

    /// List view manager header
    pub fn list_view_header(&self, tree: &mut PageTree) -> ListViewHeader {
        ListViewHeader {
            node: container(tree, self.root, "list view header", "lst-list-view-manager-header"),
        }
    }

    /// List view data table
    pub fn list_view(&self, tree: &mut PageTree) -> ListViewTable {
        ListViewTable {
            node: tree.child(
                self.root,
                "list view",
                Locator::new("lst-list-view-manager-container table"),
                RegionKind::Table,
            ),
        }
    }
}

/// List view manager header: title, view picker and actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListViewHeader {
    /// Header node
    pub node: NodeId,
}

impl ListViewHeader {
    /// Header action button ("New", "Import"...)
    pub fn action(&self, tree: &mut PageTree, label: &str) -> NodeId {
        tree.child(
            self.node,
            format!("action '{label}'"),
            Locator::new("a[role='button'], button").with_text(label),
            RegionKind::Button,
        )
    }

    /// Name of the selected list view
    pub fn selected_list_view(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.node,
            "selected list view",
            Locator::new("span.triggerLinkText"),
            RegionKind::Text,
        )
    }

    /// Icon button in the button bar with the given title ("Show filters")
    pub fn icon_button(&self, tree: &mut PageTree, title: &str) -> NodeId {
        tree.child(
            self.node,
            format!("icon '{title}'"),
            Locator::new(format!("lst-list-view-manager-button-bar button[title='{title}']")),
            RegionKind::Button,
        )
    }
}

/// List view data table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListViewTable {
    /// Table node
    pub node: NodeId,
}

impl ListViewTable {
    /// Body rows
    pub fn rows(&self, tree: &mut PageTree) -> NodeId {
        tree.child(self.node, "rows", Locator::new("tbody tr"), RegionKind::Table)
    }

    /// Header cells
    pub fn header_cells(&self, tree: &mut PageTree) -> NodeId {
        tree.child(self.node, "header cells", Locator::new("thead th"), RegionKind::Table)
    }

    /// Row selection checkbox of row `row` (1-based)
    pub fn row_checkbox(&self, tree: &mut PageTree, row: usize) -> NodeId {
        tree.child(
            self.node,
            format!("row {row} checkbox"),
            Locator::new(format!("tr:nth-of-type({row}) td div.forceVirtualCheckbox")),
            RegionKind::Checkbox,
        )
    }
}

/// Desktop layout with the app navigation bar (`one-appnav`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppNav {
    /// Page root
    pub root: NodeId,
}

impl PageType for AppNav {
    const NAME: &'static str = "AppNav";

    fn root_locator() -> Locator {
        Locator::new("one-appnav")
    }
}

impl AppNav {
    /// Add (or reuse) the page root
    pub fn load(tree: &mut PageTree) -> Self {
        Self {
            root: tree.page::<Self>(),
        }
    }

    /// Navigation item for an object ("Lead", "Accounts"...)
    pub fn nav_item(&self, tree: &mut PageTree, label: &str) -> NodeId {
        tree.child(
            self.root,
            format!("nav item '{label}'"),
            Locator::new(format!("one-app-nav-bar-item-root[data-id='{label}'] a")),
            RegionKind::Button,
        )
    }
}

/// Sales path assistant drawer on lead and opportunity records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathAssistant {
    /// Page root
    pub root: NodeId,
}

impl PageType for PathAssistant {
    const NAME: &'static str = "PathAssistant";

    fn root_locator() -> Locator {
        Locator::new("runtime_sales_pathassistant-collapsible-drawer")
    }
}

impl PathAssistant {
    /// Add (or reuse) the page root
    pub fn load(tree: &mut PageTree) -> Self {
        Self {
            root: tree.page::<Self>(),
        }
    }

    /// Active stage tab
    pub fn active_stage(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.root,
            "active stage",
            Locator::new("li.slds-is-current a"),
            RegionKind::Text,
        )
    }

    /// Stage tab with the given name
    pub fn stage(&self, tree: &mut PageTree, name: &str) -> NodeId {
        tree.child(
            self.root,
            format!("stage '{name}'"),
            Locator::new(format!("li[data-name='{name}'] a")),
            RegionKind::Tab,
        )
    }

    /// "Mark status as complete" button
    pub fn complete_step_button(&self, tree: &mut PageTree) -> NodeId {
        tree.child(
            self.root,
            "complete step",
            Locator::new("button.slds-path__mark-complete"),
            RegionKind::Button,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_item_chain() {
        let mut tree = PageTree::new();
        let modal = RecordActionWrapper::load(&mut tree);
        let form = modal.record_form(&mut tree);
        let input = form.record_layout(&mut tree).item(&mut tree, 1, 2, 1).text_input(&mut tree);
        assert_eq!(
            tree.path(input),
            "RecordActionWrapper > form > layout > item(1,2,1) > text input"
        );
        let chain = tree.chain(input).to_string();
        assert!(chain.starts_with("records-record-action-wrapper >> records-base-record-form"));
        assert!(chain.contains("records-record-layout-row:nth-of-type(2)"));
        assert!(chain.ends_with(">> input"));
    }

    #[test]
    fn test_getters_reuse_nodes() {
        let mut tree = PageTree::new();
        let home = RecordHome::load(&mut tree);
        let a = home.highlights(&mut tree).action(&mut tree, "Edit");
        let b = home.highlights(&mut tree).action(&mut tree, "Edit");
        assert_eq!(a, b);
        assert_eq!(RecordHome::load(&mut tree), home);
    }

    #[test]
    fn test_footer_button_locator() {
        let mut tree = PageTree::new();
        let form = RecordActionWrapper::load(&mut tree).record_form(&mut tree);
        let save = form.footer_button(&mut tree, "Save");
        assert_eq!(tree.get(save).unwrap().kind, RegionKind::Button);
        assert!(tree
            .chain(save)
            .to_string()
            .ends_with("records-form-footer >> button:has-text(\"Save\")"));
    }

    #[test]
    fn test_editable_item_by_name() {
        let mut tree = PageTree::new();
        let panel = DetailPanelDesktop::load(&mut tree);
        let layout = panel.record_layout(&mut tree);
        let item = layout.editable_item_by_name(&mut tree, "Account Name");
        let pencil = item.inline_edit_button(&mut tree);
        assert_eq!(
            tree.path(pencil),
            "DetailPanelDesktop > layout > item 'Account Name' > inline edit"
        );
        assert_eq!(
            tree.chain(pencil).to_string(),
            "records-lwc-detail-panel >> records-lwc-record-layout >> \
             records-record-layout-item:has-text(\"Account Name\") >> button.inline-edit-trigger"
        );
        assert_eq!(layout.editable_item_by_name(&mut tree, "Account Name"), item);
    }

    #[test]
    fn test_tabset_nodes() {
        let mut tree = PageTree::new();
        let tabset = RecordHome::load(&mut tree).tabset(&mut tree);
        let details = tabset.tab(&mut tree, "Details");
        let active = tabset.active_tab(&mut tree);
        assert_eq!(tree.get(details).unwrap().kind, RegionKind::Tab);
        assert_eq!(tree.get(active).unwrap().kind, RegionKind::Text);
        assert_eq!(tree.get(details).unwrap().parent, tree.get(active).unwrap().parent);
    }
}
