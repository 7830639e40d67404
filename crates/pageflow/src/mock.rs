//! Scripted in-memory runtime.
//!
//! [`MockLauncher`] starts [`MockRuntime`]s over a scripted site: a list of
//! routes, each with the elements present after loading a matching URL.
//! Elements are keyed by the trailing part of a locator chain's display form
//! (`"records-form-footer button:has-text(\"Save\")"` matches any chain
//! ending that way); the longest matching key wins. Every runtime call is
//! appended to a call log shared with the launcher, so tests can assert on
//! the exact sequence of interactions.

use crate::config::SessionConfig;
use crate::locator::LocatorChain;
use crate::result::{FlowError, FlowResult};
use crate::runtime::{ElementHandle, Launcher, PageRuntime, Resolution};
use crate::wait::{WaitOptions, Waiter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One recorded runtime interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// A runtime was launched
    Launch,
    /// URL load
    Load(String),
    /// Resolution request for a chain
    Resolve(String),
    /// Click on a chain
    Click(String),
    /// Text entry
    SetText {
        /// Target chain
        target: String,
        /// Text entered
        text: String,
    },
    /// Option selection
    SelectIndex {
        /// Target chain
        target: String,
        /// 1-based option index
        index: usize,
    },
    /// Text read
    Text(String),
    /// Element count
    Count(String),
    /// Absence wait
    WaitForAbsence(String),
    /// URL wait
    WaitForUrl(String),
    /// Browser shut down
    Quit,
}

impl MockCall {
    /// Whether this call changes page state
    #[must_use]
    pub const fn is_interaction(&self) -> bool {
        matches!(
            self,
            Self::Load(_) | Self::Click(_) | Self::SetText { .. } | Self::SelectIndex { .. }
        )
    }
}

/// Side effect of clicking a mock element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEffect {
    /// Hide the element with this key
    Remove(String),
    /// Show the element with this key (adding it if unknown)
    Show(String),
    /// Change the text of the element with this key
    SetText {
        /// Element key
        key: String,
        /// New text
        text: String,
    },
    /// Load another URL
    Navigate(String),
}

/// A scripted element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Visible text or input value
    pub text: String,
    /// Whether the element is attached
    pub present: bool,
    /// How many elements the key matches while present
    pub count: usize,
    /// Resolution polls before the element shows up
    pub appear_after_polls: u32,
    /// Effects applied on click
    pub on_click: Vec<MockEffect>,
    /// Last selected option
    pub selected: Option<usize>,
    polls: u32,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            present: true,
            count: 1,
            appear_after_polls: 0,
            on_click: Vec::new(),
            selected: None,
            polls: 0,
        }
    }
}

impl MockElement {
    /// Present element with no text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Present element with text
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Element that is not attached yet
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            present: false,
            ..Self::default()
        }
    }

    /// Set match count
    #[must_use]
    pub const fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Appear only after `polls` resolution checks
    #[must_use]
    pub const fn appear_after(mut self, polls: u32) -> Self {
        self.appear_after_polls = polls;
        self
    }

    /// Add a click effect
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    fn visible(&self) -> bool {
        self.present && self.polls >= self.appear_after_polls
    }
}

/// Elements present after loading URLs containing `fragment`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockRoute {
    /// URL fragment this route answers
    pub fragment: String,
    /// Keyed elements
    pub elements: Vec<(String, MockElement)>,
    /// Time a load of this route takes
    pub load_ms: u64,
}

impl MockRoute {
    /// Empty route
    #[must_use]
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            elements: Vec::new(),
            load_ms: 0,
        }
    }

    /// Make loads of this route take `load_ms`
    #[must_use]
    pub const fn slow_load(mut self, load_ms: u64) -> Self {
        self.load_ms = load_ms;
        self
    }

    /// Add an element
    #[must_use]
    pub fn element(mut self, key: impl Into<String>, element: MockElement) -> Self {
        self.elements.push((key.into(), element));
        self
    }
}

/// A scripted site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockSite {
    routes: Vec<MockRoute>,
}

impl MockSite {
    /// Site with no routes; every URL is unreachable
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route
    #[must_use]
    pub fn route(mut self, route: MockRoute) -> Self {
        self.routes.push(route);
        self
    }

    fn route_for(&self, url: &str) -> Option<&MockRoute> {
        self.routes.iter().find(|r| url.contains(&r.fragment))
    }

    fn page_for(&self, url: &str) -> Vec<(String, MockElement)> {
        self.route_for(url)
            .map(|r| r.elements.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct MockLog {
    calls: Vec<MockCall>,
    quits: usize,
    launches: usize,
}

/// Launches [`MockRuntime`]s and keeps their shared call log
#[derive(Debug, Clone)]
pub struct MockLauncher {
    site: MockSite,
    log: Arc<Mutex<MockLog>>,
    failure: Option<String>,
}

impl MockLauncher {
    /// Launcher over a scripted site
    #[must_use]
    pub fn new(site: MockSite) -> Self {
        Self {
            site,
            log: Arc::new(Mutex::new(MockLog::default())),
            failure: None,
        }
    }

    /// Launcher whose browser never starts
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(MockSite::new())
        }
    }

    /// All calls recorded so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.log).calls.clone()
    }

    /// Recorded calls that change page state
    #[must_use]
    pub fn interactions(&self) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(MockCall::is_interaction)
            .collect()
    }

    /// How many times a runtime was quit
    #[must_use]
    pub fn quit_count(&self) -> usize {
        lock(&self.log).quits
    }

    /// How many runtimes were launched
    #[must_use]
    pub fn launch_count(&self) -> usize {
        lock(&self.log).launches
    }
}

impl Launcher for MockLauncher {
    fn launch(&self, config: &SessionConfig) -> FlowResult<Box<dyn PageRuntime>> {
        if let Some(message) = &self.failure {
            return Err(FlowError::SessionStart {
                message: message.clone(),
            });
        }
        config.validate()?;
        {
            let mut log = lock(&self.log);
            log.launches += 1;
            log.calls.push(MockCall::Launch);
        }
        Ok(Box::new(MockRuntime {
            site: self.site.clone(),
            log: Arc::clone(&self.log),
            url: String::from("about:blank"),
            dom: Vec::new(),
            next_id: 0,
            navigation_timeout_ms: config.navigation_timeout_ms,
            quit: false,
        }))
    }
}

/// In-memory runtime over a [`MockSite`]
#[derive(Debug)]
pub struct MockRuntime {
    site: MockSite,
    log: Arc<Mutex<MockLog>>,
    url: String,
    dom: Vec<(String, MockElement)>,
    next_id: u64,
    navigation_timeout_ms: u64,
    quit: bool,
}

fn lock(log: &Mutex<MockLog>) -> MutexGuard<'_, MockLog> {
    log.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl MockRuntime {
    fn record(&self, call: MockCall) {
        lock(&self.log).calls.push(call);
    }

    fn ensure_running(&self) -> FlowResult<()> {
        if self.quit {
            return Err(FlowError::runtime("browser has quit"));
        }
        Ok(())
    }

    fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
        self.dom = self.site.page_for(url);
    }

    fn position(&self, target: &str) -> Option<usize> {
        self.dom
            .iter()
            .enumerate()
            .filter(|(_, (key, _))| target.ends_with(key.as_str()))
            .max_by_key(|(_, (key, _))| key.len())
            .map(|(i, _)| i)
    }

    fn position_of_key(&self, key: &str) -> Option<usize> {
        self.dom.iter().position(|(k, _)| k == key)
    }

    fn attached(&self, element: &ElementHandle) -> FlowResult<usize> {
        let target = element.chain.to_string();
        self.position(&target)
            .filter(|&i| self.dom[i].1.visible())
            .ok_or_else(|| FlowError::runtime(format!("element {element} is detached")))
    }

    fn visible(&self, target: &str) -> bool {
        self.position(target).is_some_and(|i| self.dom[i].1.visible())
    }

    fn apply(&mut self, effect: MockEffect) {
        match effect {
            MockEffect::Remove(key) => {
                if let Some(i) = self.position_of_key(&key) {
                    self.dom[i].1.present = false;
                }
            }
            MockEffect::Show(key) => match self.position_of_key(&key) {
                Some(i) => self.dom[i].1.present = true,
                None => self.dom.push((key, MockElement::new())),
            },
            MockEffect::SetText { key, text } => {
                if let Some(i) = self.position_of_key(&key) {
                    self.dom[i].1.text = text;
                }
            }
            MockEffect::Navigate(url) => self.navigate(&url),
        }
    }
}

impl PageRuntime for MockRuntime {
    fn load(&mut self, url: &str) -> FlowResult<()> {
        self.ensure_running()?;
        self.record(MockCall::Load(url.to_string()));
        let load_ms = self.site.route_for(url).map_or(0, |r| r.load_ms);
        if load_ms > self.navigation_timeout_ms {
            std::thread::sleep(Duration::from_millis(self.navigation_timeout_ms));
            return Err(FlowError::PageLoadTimeout {
                page: url.to_string(),
                elapsed_ms: self.navigation_timeout_ms,
                timeout_ms: self.navigation_timeout_ms,
            });
        }
        if load_ms > 0 {
            std::thread::sleep(Duration::from_millis(load_ms));
        }
        self.navigate(url);
        Ok(())
    }

    fn current_url(&mut self) -> FlowResult<String> {
        self.ensure_running()?;
        Ok(self.url.clone())
    }

    fn resolve(&mut self, chain: &LocatorChain, wait: WaitOptions) -> FlowResult<Resolution> {
        self.ensure_running()?;
        let target = chain.to_string();
        self.record(MockCall::Resolve(target.clone()));

        let outcome = Waiter::new(wait).until(|| {
            let Some(i) = self.position(&target) else {
                return Ok(None);
            };
            let element = &mut self.dom[i].1;
            element.polls = element.polls.saturating_add(1);
            Ok(element.visible().then_some(()))
        })?;

        if outcome.is_ready() {
            self.next_id += 1;
            Ok(Resolution::Resolved(ElementHandle::new(
                format!("mock-{}", self.next_id),
                chain.clone(),
            )))
        } else {
            Ok(Resolution::Absent {
                elapsed_ms: outcome.elapsed().as_millis() as u64,
            })
        }
    }

    fn is_present(&mut self, chain: &LocatorChain) -> FlowResult<bool> {
        self.ensure_running()?;
        Ok(self.visible(&chain.to_string()))
    }

    fn wait_for_absence(&mut self, chain: &LocatorChain, wait: WaitOptions) -> FlowResult<bool> {
        self.ensure_running()?;
        let target = chain.to_string();
        self.record(MockCall::WaitForAbsence(target.clone()));
        Waiter::new(wait).until_true(|| Ok(!self.visible(&target)))
    }

    fn wait_for_url(&mut self, fragment: &str, wait: WaitOptions) -> FlowResult<bool> {
        self.ensure_running()?;
        self.record(MockCall::WaitForUrl(fragment.to_string()));
        Waiter::new(wait).until_true(|| Ok(self.url.contains(fragment)))
    }

    fn click(&mut self, element: &ElementHandle) -> FlowResult<()> {
        self.ensure_running()?;
        let i = self.attached(element)?;
        self.record(MockCall::Click(element.chain.to_string()));
        let effects = self.dom[i].1.on_click.clone();
        for effect in effects {
            self.apply(effect);
        }
        Ok(())
    }

    fn set_text(&mut self, element: &ElementHandle, text: &str) -> FlowResult<()> {
        self.ensure_running()?;
        let i = self.attached(element)?;
        self.record(MockCall::SetText {
            target: element.chain.to_string(),
            text: text.to_string(),
        });
        self.dom[i].1.text = text.to_string();
        Ok(())
    }

    fn select_index(&mut self, element: &ElementHandle, index: usize) -> FlowResult<()> {
        self.ensure_running()?;
        let i = self.attached(element)?;
        self.record(MockCall::SelectIndex {
            target: element.chain.to_string(),
            index,
        });
        self.dom[i].1.selected = Some(index);
        Ok(())
    }

    fn text(&mut self, element: &ElementHandle) -> FlowResult<String> {
        self.ensure_running()?;
        let i = self.attached(element)?;
        self.record(MockCall::Text(element.chain.to_string()));
        Ok(self.dom[i].1.text.clone())
    }

    fn count(&mut self, chain: &LocatorChain) -> FlowResult<usize> {
        self.ensure_running()?;
        let target = chain.to_string();
        self.record(MockCall::Count(target.clone()));
        Ok(self
            .position(&target)
            .map_or(0, |i| {
                let element = &self.dom[i].1;
                if element.visible() {
                    element.count
                } else {
                    0
                }
            }))
    }

    fn quit(&mut self) -> FlowResult<()> {
        self.ensure_running()?;
        self.quit = true;
        let mut log = lock(&self.log);
        log.quits += 1;
        log.calls.push(MockCall::Quit);
        Ok(())
    }
}
