//! Record creation and update flows for Lightning Experience.
//!
//! Every flow starts from a URL (object home, record home or the app
//! landing page) and assumes the session is already logged in. Waits are
//! bounded polls on visible state: a modal disappearing, a URL changing, an
//! output field reappearing.

use super::pages::{
    AppNav, DetailPanelDesktop, ObjectHome, PathAssistant, RecordActionWrapper, RecordHome,
};
use super::record::RecordType;
use crate::config::TestEnvironment;
use crate::document::NOW_FORMAT;
use crate::page_object::PageTree;
use crate::result::FlowResult;
use crate::step::{FlowBuilder, FlowScript};

/// A named, built-in flow
#[derive(Debug, Clone, Copy)]
pub struct ScenarioEntry {
    /// Catalog name
    pub name: &'static str,
    /// One-line summary
    pub summary: &'static str,
    /// Record type the flow works on, if any
    pub record_type: Option<RecordType>,
    /// Builds the flow for an environment
    pub build: fn(&TestEnvironment) -> FlowResult<FlowScript>,
}

/// Every built-in flow
pub const SCENARIOS: &[ScenarioEntry] = &[
    ScenarioEntry {
        name: "account-creation",
        summary: "Create an account from the object home 'New' modal",
        record_type: Some(RecordType::Account),
        build: account_creation,
    },
    ScenarioEntry {
        name: "opportunity-creation",
        summary: "Create an opportunity with close date, stage and account lookup",
        record_type: Some(RecordType::Opportunity),
        build: opportunity_creation,
    },
    ScenarioEntry {
        name: "cancel-account-creation",
        summary: "Fill the new-account form and cancel it",
        record_type: Some(RecordType::Account),
        build: cancel_account_creation,
    },
    ScenarioEntry {
        name: "page-block-inline-edit",
        summary: "Open the new-account form and inline-edit 'Account Name' in the detail panel",
        record_type: Some(RecordType::Account),
        build: page_block_inline_edit,
    },
    ScenarioEntry {
        name: "lead-creation",
        summary: "Open the new-lead form and enter a name",
        record_type: Some(RecordType::Lead),
        build: lead_creation,
    },
    ScenarioEntry {
        name: "edit-account",
        summary: "Rename an existing account through the highlights 'Edit' action",
        record_type: Some(RecordType::Account),
        build: edit_account,
    },
    ScenarioEntry {
        name: "inline-edit-contact",
        summary: "Inline-edit a contact name and check it is unchanged after saving",
        record_type: Some(RecordType::Contact),
        build: inline_edit_contact,
    },
    ScenarioEntry {
        name: "edit-lead",
        summary: "Stamp a lead's company with the current date and time",
        record_type: Some(RecordType::Lead),
        build: edit_lead,
    },
    ScenarioEntry {
        name: "contact-page-title",
        summary: "Check a contact's name on the Details tab, then open News and Edit",
        record_type: Some(RecordType::Contact),
        build: contact_page_title,
    },
    ScenarioEntry {
        name: "lead-status-change",
        summary: "Move a lead along the sales path",
        record_type: Some(RecordType::Lead),
        build: lead_status_change,
    },
    ScenarioEntry {
        name: "lead-list-view",
        summary: "Open the lead list view from the nav bar and select the first row",
        record_type: Some(RecordType::Lead),
        build: lead_list_view,
    },
    ScenarioEntry {
        name: "filter-leads",
        summary: "Open the lead list view and show its filters",
        record_type: Some(RecordType::Lead),
        build: filter_leads,
    },
    ScenarioEntry {
        name: "date-time-editing",
        summary: "Set a date-time field on a lead through the edit modal",
        record_type: Some(RecordType::Lead),
        build: date_time_editing,
    },
];

/// Look up a scenario by name
#[must_use]
pub fn find(name: &str) -> Option<&'static ScenarioEntry> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// Navigate to the object home and open the 'New' record modal
fn open_record_modal(
    mut tree: PageTree,
    name: &str,
    env: &TestEnvironment,
    record_type: RecordType,
) -> (FlowBuilder, RecordActionWrapper) {
    let home = ObjectHome::load(&mut tree);
    let new_button = home.list_view_header(&mut tree).action(&mut tree, "New");
    let modal = RecordActionWrapper::load(&mut tree);
    let flow = FlowScript::builder(name, tree)
        .navigate(record_type.object_home_url(env.app_url()), home.root)
        .click(new_button)
        .load_page(modal.root);
    (flow, modal)
}

fn record_home(env: &TestEnvironment, record_type: RecordType, id: &str) -> String {
    record_type.record_home_url(env.app_url(), id)
}

/// New account named "Utam", saved, landing on its record home
pub fn account_creation(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.record_form(&mut tree);
    let name = form.record_layout(&mut tree).item(&mut tree, 1, 2, 1).text_input(&mut tree);
    let save = form.footer_button(&mut tree, "Save");
    let record_home = RecordHome::load(&mut tree);

    let (flow, modal) = open_record_modal(tree, "account-creation", env, RecordType::Account);
    flow
        .set_text(name, "Utam")
        .click(save)
        .assert_absent(modal.root)
        .load_page(record_home.root)
        .build()
}

/// New opportunity with close date, stage, account lookup and name
pub fn opportunity_creation(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.record_form(&mut tree);
    let layout = form.record_layout(&mut tree);
    let close_date = layout.item(&mut tree, 1, 2, 2).datepicker(&mut tree);
    let stage = layout.item(&mut tree, 1, 4, 2).combobox(&mut tree);
    let account = layout.item(&mut tree, 1, 4, 1).combobox(&mut tree);
    let name = layout.item(&mut tree, 1, 3, 1).text_input(&mut tree);
    let save = form.footer_button(&mut tree, "Save");
    let record_home = RecordHome::load(&mut tree);

    let (flow, modal) =
        open_record_modal(tree, "opportunity-creation", env, RecordType::Opportunity);
    flow
        .set_text(close_date, "01/01/2024")
        .click(stage)
        .select_index(stage, 2)
        .click(account)
        .select_index(account, 1)
        .set_text(name, "Opportunity name")
        .click(save)
        .assert_absent(modal.root)
        .load_page(record_home.root)
        .build()
}

/// Fill name, account number and phone, then cancel
pub fn cancel_account_creation(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.record_form(&mut tree);
    let layout = form.record_layout(&mut tree);
    let name = layout.item(&mut tree, 1, 2, 1).text_input(&mut tree);
    let number = layout.item(&mut tree, 1, 4, 1).text_input(&mut tree);
    let phone = layout.item(&mut tree, 1, 2, 2).text_input(&mut tree);
    let cancel = form.footer_button(&mut tree, "Cancel");

    let (flow, modal) =
        open_record_modal(tree, "cancel-account-creation", env, RecordType::Account);
    flow
        .set_text(name, "Utam Test Account")
        .set_text(number, "132456788")
        .set_text(phone, "9238294")
        .click(cancel)
        .assert_absent(modal.root)
        .build()
}

/// Find the "Account Name" item of the detail panel by label and inline-edit it
pub fn page_block_inline_edit(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.record_form(&mut tree);
    let panel = DetailPanelDesktop::load(&mut tree);
    let pencil = panel
        .record_layout(&mut tree)
        .editable_item_by_name(&mut tree, "Account Name")
        .inline_edit_button(&mut tree);

    let (flow, _) = open_record_modal(tree, "page-block-inline-edit", env, RecordType::Account);
    flow
        .assert_present(form.node)
        .load_page(panel.root)
        .click(pencil)
        .build()
}

/// Open the new-lead form and type a name
pub fn lead_creation(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let name = modal
        .record_form(&mut tree)
        .record_layout(&mut tree)
        .item(&mut tree, 1, 2, 1)
        .text_input(&mut tree);

    let (flow, _) = open_record_modal(tree, "lead-creation", env, RecordType::Lead);
    flow
        .set_text(name, "Utam Test Lead")
        .assert_text(name, "Utam Test Lead")
        .build()
}

/// Open the edit modal from the highlights panel of a record
fn edit_from_highlights(
    mut tree: PageTree,
    name: &str,
    url: String,
) -> (FlowBuilder, RecordActionWrapper) {
    let home = RecordHome::load(&mut tree);
    let edit = home.highlights(&mut tree).action(&mut tree, "Edit");
    let modal = RecordActionWrapper::load(&mut tree);
    let flow = FlowScript::builder(name, tree)
        .navigate(url, home.root)
        .click(edit)
        .load_page(modal.root);
    (flow, modal)
}

/// Rename an existing account to "Utam"
pub fn edit_account(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let id = env.require("account_id", env.account_id.as_ref())?;
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.record_form(&mut tree);
    let name = form.record_layout(&mut tree).item(&mut tree, 1, 2, 1).text_input(&mut tree);
    let save = form.footer_button(&mut tree, "Save");

    let url = record_home(env, RecordType::Account, id);
    let (flow, modal) = edit_from_highlights(tree, "edit-account", url);
    flow
        .set_text(name, "Utam")
        .click(save)
        .assert_absent(modal.root)
        .build()
}

/// Inline-edit the contact name on the Details tab and save it unchanged
pub fn inline_edit_contact(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let id = env.require("contact_id", env.contact_id.as_ref())?;
    let mut tree = PageTree::new();
    let home = RecordHome::load(&mut tree);
    let tabset = home.tabset(&mut tree);
    let active_tab = tabset.active_tab(&mut tree);
    let details = tabset.tab(&mut tree, "Details");
    let form = tabset.detail_panel(&mut tree).record_form(&mut tree);
    let name_item = form.record_layout(&mut tree).item(&mut tree, 1, 2, 1);
    let formatted_name = name_item.formatted_name(&mut tree);
    let pencil = name_item.inline_edit_button(&mut tree);
    let save = form.footer_button(&mut tree, "Save");

    FlowScript::builder("inline-edit-contact", tree)
        .navigate(record_home(env, RecordType::Contact, id), home.root)
        .ensure_active(active_tab, "Details", details)
        .remember(formatted_name, "contact name")
        .click(pencil)
        .click(save)
        .assert_absent(save)
        .assert_present(formatted_name)
        .assert_unchanged(formatted_name, "contact name")
        .build()
}

/// Stamp the lead's company with the current date and time
pub fn edit_lead(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let id = env.require("lead_id", env.lead_id.as_ref())?;
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.record_form(&mut tree);
    let company = form.record_layout(&mut tree).item(&mut tree, 1, 3, 1).text_input(&mut tree);
    let save = form.footer_button(&mut tree, "Save");
    let stamp = chrono::Local::now().format(NOW_FORMAT);

    let url = record_home(env, RecordType::Lead, id);
    let (flow, modal) = edit_from_highlights(tree, "edit-lead", url);
    flow
        .set_text(company, format!("Utam and Co. updated on {stamp}"))
        .click(save)
        .assert_absent(modal.root)
        .build()
}

/// Check the contact name shown on the Details tab, then open News and Edit.
///
/// The expected name comes from the environment's `contact_name` variable.
pub fn contact_page_title(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let id = env.require("contact_id", env.contact_id.as_ref())?;
    let expected = env.require("contact_name", env.extra.get("contact_name"))?;
    let mut tree = PageTree::new();
    let home = RecordHome::load(&mut tree);
    let tabset = home.tabset(&mut tree);
    let active_tab = tabset.active_tab(&mut tree);
    let details = tabset.tab(&mut tree, "Details");
    let news = tabset.tab(&mut tree, "News");
    let name = tabset
        .detail_panel(&mut tree)
        .record_form(&mut tree)
        .record_layout(&mut tree)
        .item(&mut tree, 1, 2, 1)
        .formatted_name(&mut tree);
    let edit = home.highlights(&mut tree).action(&mut tree, "Edit");

    FlowScript::builder("contact-page-title", tree)
        .navigate(record_home(env, RecordType::Contact, id), home.root)
        .ensure_active(active_tab, "Details", details)
        .assert_text(name, expected)
        .click(news)
        .click(edit)
        .build()
}

/// Move the lead to "Open - Not Contacted" and mark the step complete
pub fn lead_status_change(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let id = env.require("lead_id", env.lead_id.as_ref())?;
    let mut tree = PageTree::new();
    let home = RecordHome::load(&mut tree);
    let path = PathAssistant::load(&mut tree);
    let active = path.active_stage(&mut tree);
    let stage = path.stage(&mut tree, "Open - Not Contacted");
    let complete = path.complete_step_button(&mut tree);

    FlowScript::builder("lead-status-change", tree)
        .navigate(record_home(env, RecordType::Lead, id), home.root)
        .load_page(path.root)
        .assert_present(active)
        .click(stage)
        .click(complete)
        .build()
}

/// Open the lead list view from the app nav bar
fn open_lead_list(mut tree: PageTree, name: &str, env: &TestEnvironment) -> (FlowBuilder, ObjectHome) {
    let nav = AppNav::load(&mut tree);
    let lead = nav.nav_item(&mut tree, "Lead");
    let home = ObjectHome::load(&mut tree);
    let flow = FlowScript::builder(name, tree)
        .navigate(env.app_url(), nav.root)
        .click(lead)
        .wait_for_url("Lead")
        .load_page(home.root);
    (flow, home)
}

/// Lead list view: table with header cells and rows, first row selected
pub fn lead_list_view(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let home = ObjectHome::load(&mut tree);
    let table = home.list_view(&mut tree);
    let headers = table.header_cells(&mut tree);
    let rows = table.rows(&mut tree);
    let first_row = table.row_checkbox(&mut tree, 1);

    let (flow, _) = open_lead_list(tree, "lead-list-view", env);
    flow
        .assert_present(table.node)
        .assert_present(headers)
        .assert_present(rows)
        .click(first_row)
        .build()
}

/// Lead list view: read the selected view name and show filters
pub fn filter_leads(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let mut tree = PageTree::new();
    let home = ObjectHome::load(&mut tree);
    let header = home.list_view_header(&mut tree);
    let table = home.list_view(&mut tree);
    let view_name = header.selected_list_view(&mut tree);
    let show_filters = header.icon_button(&mut tree, "Show filters");

    let (flow, _) = open_lead_list(tree, "filter-leads", env);
    flow
        .assert_present(table.node)
        .remember(view_name, "list view")
        .click(show_filters)
        .build()
}

/// Set date and time on a lead date-time field through the edit modal
pub fn date_time_editing(env: &TestEnvironment) -> FlowResult<FlowScript> {
    let id = env.require("lead_id", env.lead_id.as_ref())?;
    let mut tree = PageTree::new();
    let modal = RecordActionWrapper::load(&mut tree);
    let form = modal.detail_panel(&mut tree).record_form(&mut tree);
    let item = form.record_layout(&mut tree).item(&mut tree, 1, 9, 1);
    let date = item.datepicker(&mut tree);
    let time = item.time_input(&mut tree);
    let save = form.footer_button(&mut tree, "Save");

    let url = record_home(env, RecordType::Lead, id);
    let (flow, modal) = edit_from_highlights(tree, "date-time-editing", url);
    flow
        .set_text(date, "12/11/2023")
        .set_text(time, "1:00pm")
        .click(save)
        .assert_absent(modal.root)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::step::Action;

    fn env() -> TestEnvironment {
        TestEnvironment::new("sandbox", "https://org.my.salesforce.com")
            .with_account_id("001A")
            .with_contact_id("003C")
            .with_lead_id("00QL")
            .with_var("contact_name", "Mr. Jane Doe")
    }

    #[test]
    fn test_every_scenario_builds() {
        for entry in SCENARIOS {
            let script = (entry.build)(&env()).unwrap();
            assert_eq!(script.name(), entry.name);
            assert!(!script.is_empty(), "{} has no steps", entry.name);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = SCENARIOS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCENARIOS.len());
    }

    #[test]
    fn test_find() {
        assert!(find("edit-account").is_some());
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_record_scenarios_need_ids() {
        let bare = TestEnvironment::new("bare", "https://org.my.salesforce.com");
        assert!(edit_account(&bare).is_err());
        assert!(inline_edit_contact(&bare).is_err());
        assert!(account_creation(&bare).is_ok());
    }

    #[test]
    fn test_account_creation_shape() {
        let script = account_creation(&env()).unwrap();
        let names: Vec<&str> = script.steps().iter().map(|s| s.action.name()).collect();
        assert_eq!(
            names,
            vec!["navigate", "click", "load_page", "set_text", "click", "assert_absent", "load_page"]
        );
        match &script.steps()[0].action {
            Action::Navigate { url, .. } => {
                assert_eq!(url, "https://org.my.salesforce.com/lightning/o/Account/home");
            }
            other => panic!("unexpected first action: {other:?}"),
        }
    }

    #[test]
    fn test_page_block_inline_edit_targets_item_by_label() {
        let script = page_block_inline_edit(&env()).unwrap();
        let names: Vec<&str> = script.steps().iter().map(|s| s.action.name()).collect();
        assert_eq!(
            names,
            vec!["navigate", "click", "load_page", "assert_present", "load_page", "click"]
        );
        match &script.steps()[5].action {
            Action::Click { target } => {
                let chain = script.tree().chain(*target).to_string();
                assert!(chain.contains("records-record-layout-item:has-text(\"Account Name\")"));
            }
            other => panic!("unexpected last action: {other:?}"),
        }
    }

    #[test]
    fn test_edit_lead_stamps_company() {
        let script = edit_lead(&env()).unwrap();
        let stamped = script.steps().iter().any(|s| {
            matches!(&s.action, Action::SetText { text, .. } if text.starts_with("Utam and Co. updated on "))
        });
        assert!(stamped);
    }

    #[test]
    fn test_inline_edit_remembers_before_comparing() {
        let script = inline_edit_contact(&env()).unwrap();
        let names: Vec<&str> = script.steps().iter().map(|s| s.action.name()).collect();
        let remember = names.iter().position(|n| *n == "remember").unwrap();
        let unchanged = names.iter().position(|n| *n == "assert_unchanged").unwrap();
        assert!(remember < unchanged);
    }
}
