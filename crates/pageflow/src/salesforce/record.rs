//! Salesforce record types and their Lightning URLs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::FlowError;

/// Standard objects the flows work with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Account
    Account,
    /// Contact
    Contact,
    /// Lead
    Lead,
    /// Opportunity
    Opportunity,
    /// Case
    Case,
}

impl RecordType {
    /// All record types
    pub const ALL: [Self; 5] = [
        Self::Account,
        Self::Contact,
        Self::Lead,
        Self::Opportunity,
        Self::Case,
    ];

    /// API name of the object
    #[must_use]
    pub const fn object_name(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Contact => "Contact",
            Self::Lead => "Lead",
            Self::Opportunity => "Opportunity",
            Self::Case => "Case",
        }
    }

    /// Entity profile name some page layouts are keyed by
    #[must_use]
    pub const fn entity(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Contact => "contact",
            Self::Lead => "lead",
            Self::Opportunity => "opportunity",
            Self::Case => "case",
        }
    }

    /// Object home (list views), e.g. `{base}/lightning/o/Account/home`
    #[must_use]
    pub fn object_home_url(self, base: &str) -> String {
        format!("{}/lightning/o/{}/home", base.trim_end_matches('/'), self.object_name())
    }

    /// Record home of one record, e.g. `{base}/lightning/r/Account/001.../view`
    #[must_use]
    pub fn record_home_url(self, base: &str, record_id: &str) -> String {
        format!(
            "{}/lightning/r/{}/{}/view",
            base.trim_end_matches('/'),
            self.object_name(),
            record_id
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.object_name())
    }
}

impl FromStr for RecordType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.object_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FlowError::config(format!("unknown record type '{s}'")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_object_home_url() {
        assert_eq!(
            RecordType::Account.object_home_url("https://org.lightning.force.com/"),
            "https://org.lightning.force.com/lightning/o/Account/home"
        );
    }

    #[test]
    fn test_record_home_url() {
        assert_eq!(
            RecordType::Lead.record_home_url("https://org.lightning.force.com", "00Q1"),
            "https://org.lightning.force.com/lightning/r/Lead/00Q1/view"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("opportunity".parse::<RecordType>().unwrap(), RecordType::Opportunity);
        assert!("Widget".parse::<RecordType>().is_err());
        assert_eq!(RecordType::Case.entity(), "case");
        assert_eq!(RecordType::Contact.to_string(), "Contact");
    }
}
