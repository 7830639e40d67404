//! Salesforce Lightning page objects and built-in flows.
//!
//! - [`record`]: record types and Lightning URLs
//! - [`pages`]: typed views over page-object trees (record home, record
//!   action modal, record form/layout/item, detail panel, tabset, list
//!   view, app nav, path assistant)
//! - [`scenarios`]: record creation and update flows, looked up by name

pub mod pages;
pub mod record;
pub mod scenarios;

pub use pages::{
    AppNav, BaseRecordForm, DetailPanel, DetailPanelDesktop, HighlightsPanel, ListViewHeader, ListViewTable,
    ObjectHome, PathAssistant, RecordActionWrapper, RecordHome, RecordLayout, RecordLayoutItem,
    Tabset,
};
pub use record::RecordType;
pub use scenarios::{find as find_scenario, ScenarioEntry, SCENARIOS};
