//! Session and environment configuration.

use crate::result::{FlowError, FlowResult};
use crate::wait::{
    WaitOptions, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable overriding [`TestEnvironment::base_url`]
pub const ENV_BASE_URL: &str = "PAGEFLOW_BASE_URL";
/// Environment variable overriding [`TestEnvironment::redirect_url`]
pub const ENV_REDIRECT_URL: &str = "PAGEFLOW_REDIRECT_URL";
/// Environment variable overriding [`TestEnvironment::account_id`]
pub const ENV_ACCOUNT_ID: &str = "PAGEFLOW_ACCOUNT_ID";
/// Environment variable overriding [`TestEnvironment::contact_id`]
pub const ENV_CONTACT_ID: &str = "PAGEFLOW_CONTACT_ID";
/// Environment variable overriding [`TestEnvironment::lead_id`]
pub const ENV_LEAD_ID: &str = "PAGEFLOW_LEAD_ID";

/// Configuration for opening a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Run the browser without a window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable override
    pub chromium_path: Option<String>,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Bound for a page root to become resolvable after navigation
    pub navigation_timeout_ms: u64,
    /// Bound for element resolution and absence waits
    pub element_timeout_ms: u64,
    /// Polling interval for bounded waits
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
            sandbox: true,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            element_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium executable path
    #[must_use]
    pub fn chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (required in some containers)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the page-load bound
    #[must_use]
    pub const fn navigation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    /// Set the element bound
    #[must_use]
    pub const fn element_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.element_timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Wait options for element resolution
    #[must_use]
    pub const fn element_wait(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.element_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Wait options for page loads
    #[must_use]
    pub const fn navigation_wait(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.navigation_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Reject configurations no runtime can honor
    pub fn validate(&self) -> FlowResult<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(FlowError::config("viewport dimensions must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(FlowError::config("poll interval must be non-zero"));
        }
        Ok(())
    }
}

/// Named, read-only configuration of the system under test
///
/// Loaded from YAML or JSON; the record identifiers feed `${account_id}`,
/// `${contact_id}` and `${lead_id}` placeholders in flow documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEnvironment {
    /// Environment name (e.g. "sandbox")
    #[serde(default)]
    pub name: String,
    /// Application base URL
    pub base_url: String,
    /// URL the application lands on after login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Existing account record id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Existing contact record id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    /// Existing lead record id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    /// Additional interpolation variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl TestEnvironment {
    /// Environment with only a base URL
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the account id
    #[must_use]
    pub fn with_account_id(mut self, id: impl Into<String>) -> Self {
        self.account_id = Some(id.into());
        self
    }

    /// Set the contact id
    #[must_use]
    pub fn with_contact_id(mut self, id: impl Into<String>) -> Self {
        self.contact_id = Some(id.into());
        self
    }

    /// Set the lead id
    #[must_use]
    pub fn with_lead_id(mut self, id: impl Into<String>) -> Self {
        self.lead_id = Some(id.into());
        self
    }

    /// Add an extra variable
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.extra.insert(key.into(), value.into());
        self
    }

    /// Parse from YAML (JSON is a YAML subset)
    pub fn from_yaml(content: &str) -> FlowResult<Self> {
        let env: Self = serde_yaml_ng::from_str(content)?;
        env.validate()?;
        Ok(env)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let env: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml_ng::from_str(&content)?,
        };
        env.validate()?;
        Ok(env)
    }

    /// Apply `PAGEFLOW_*` overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `PAGEFLOW_*` overrides from an arbitrary lookup
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(url) = lookup(ENV_REDIRECT_URL) {
            self.redirect_url = Some(url);
        }
        if let Some(id) = lookup(ENV_ACCOUNT_ID) {
            self.account_id = Some(id);
        }
        if let Some(id) = lookup(ENV_CONTACT_ID) {
            self.contact_id = Some(id);
        }
        if let Some(id) = lookup(ENV_LEAD_ID) {
            self.lead_id = Some(id);
        }
        self
    }

    /// Check that the base URL is usable
    pub fn validate(&self) -> FlowResult<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(FlowError::config("environment has no base_url"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FlowError::config(format!(
                "base_url must be an http(s) URL, got '{url}'"
            )));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// URL the application is served from after login (redirect URL, else base URL)
    #[must_use]
    pub fn app_url(&self) -> &str {
        self.redirect_url
            .as_deref()
            .map_or_else(|| self.base(), |url| url.trim_end_matches('/'))
    }

    /// Require a record identifier, naming it in the error
    pub fn require<'a>(&'a self, name: &str, value: Option<&'a String>) -> FlowResult<&'a str> {
        value
            .map(String::as_str)
            .ok_or_else(|| FlowError::config(format!("environment '{}' has no {name}", self.name)))
    }

    /// Interpolation variables
    #[must_use]
    pub fn vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.extra.clone();
        let _ = vars.insert("base_url".into(), self.base().to_string());
        let _ = vars.insert("env".into(), self.name.clone());
        let optional = [
            ("redirect_url", &self.redirect_url),
            ("account_id", &self.account_id),
            ("contact_id", &self.contact_id),
            ("lead_id", &self.lead_id),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                let _ = vars.insert(key.to_string(), value.clone());
            }
        }
        vars
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod session_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SessionConfig::default();
            assert!(config.headless);
            assert!(config.sandbox);
            assert_eq!(config.navigation_timeout_ms, DEFAULT_NAVIGATION_TIMEOUT_MS);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_builder() {
            let config = SessionConfig::new()
                .headless(false)
                .viewport(800, 600)
                .no_sandbox()
                .navigation_timeout_ms(500)
                .element_timeout_ms(200)
                .poll_interval_ms(10)
                .chromium_path("/usr/bin/chromium");
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.navigation_wait().timeout_ms, 500);
            assert_eq!(config.element_wait().timeout_ms, 200);
            assert_eq!(config.element_wait().poll_interval_ms, 10);
            assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        }

        #[test]
        fn test_validate_rejects_zero_poll() {
            assert!(SessionConfig::new().poll_interval_ms(0).validate().is_err());
            assert!(SessionConfig::new().viewport(0, 10).validate().is_err());
        }
    }

    mod environment_tests {
        use super::*;

        const YAML: &str = r"
name: sandbox
base_url: https://example.my.salesforce.com/
account_id: 001xx0000000001
extra:
  owner: Jane
";

        #[test]
        fn test_from_yaml() {
            let env = TestEnvironment::from_yaml(YAML).unwrap();
            assert_eq!(env.name, "sandbox");
            assert_eq!(env.base(), "https://example.my.salesforce.com");
            assert_eq!(env.app_url(), "https://example.my.salesforce.com");
            assert_eq!(env.account_id.as_deref(), Some("001xx0000000001"));
            assert_eq!(env.contact_id, None);
        }

        #[test]
        fn test_from_json_file() {
            let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
            write!(file, r#"{{"name":"qa","base_url":"https://qa.example.com"}}"#).unwrap();
            let env = TestEnvironment::from_file(file.path()).unwrap();
            assert_eq!(env.name, "qa");
        }

        #[test]
        fn test_missing_base_url_rejected() {
            let err = TestEnvironment::from_yaml("name: x\nbase_url: ''\n").unwrap_err();
            assert!(matches!(err, FlowError::Config { .. }));
            let err = TestEnvironment::from_yaml("base_url: ftp://x\n").unwrap_err();
            assert!(err.to_string().contains("http"));
        }

        #[test]
        fn test_overrides() {
            let overrides: HashMap<&str, &str> = [
                (ENV_BASE_URL, "https://override.example.com"),
                (ENV_LEAD_ID, "00Qxx"),
                (ENV_CONTACT_ID, "  "),
            ]
            .into_iter()
            .collect();
            let env = TestEnvironment::from_yaml(YAML)
                .unwrap()
                .with_overrides(|k| overrides.get(k).map(|v| (*v).to_string()));
            assert_eq!(env.base_url, "https://override.example.com");
            assert_eq!(env.lead_id.as_deref(), Some("00Qxx"));
            assert_eq!(env.contact_id, None);
            assert_eq!(env.account_id.as_deref(), Some("001xx0000000001"));
        }

        #[test]
        fn test_vars() {
            let env = TestEnvironment::from_yaml(YAML).unwrap();
            let vars = env.vars();
            assert_eq!(vars["base_url"], "https://example.my.salesforce.com");
            assert_eq!(vars["account_id"], "001xx0000000001");
            assert_eq!(vars["owner"], "Jane");
            assert_eq!(vars["env"], "sandbox");
            assert!(!vars.contains_key("lead_id"));
        }

        #[test]
        fn test_app_url_prefers_redirect() {
            let mut env = TestEnvironment::new("x", "https://x.my.salesforce.com/");
            assert_eq!(env.app_url(), "https://x.my.salesforce.com");
            env.redirect_url = Some("https://x.lightning.force.com/".into());
            assert_eq!(env.app_url(), "https://x.lightning.force.com");
        }

        #[test]
        fn test_require() {
            let env = TestEnvironment::new("x", "https://x.test").with_lead_id("00Q1");
            assert_eq!(env.require("lead_id", env.lead_id.as_ref()).unwrap(), "00Q1");
            let err = env.require("account_id", env.account_id.as_ref()).unwrap_err();
            assert!(err.to_string().contains("account_id"));
        }
    }
}
