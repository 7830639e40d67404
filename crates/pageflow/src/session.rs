//! Browser sessions.
//!
//! A [`Session`] owns one page runtime from `open` to `close`. It also keeps
//! the resolution cache: page-object nodes resolve lazily on first access
//! and stay resolved until the session navigates or the node is observed
//! absent.

use crate::config::SessionConfig;
use crate::page_object::{NodeId, PageTree};
use crate::result::{FlowError, FlowResult};
use crate::runtime::{ElementHandle, Launcher, PageRuntime, Resolution};
use crate::wait::WaitOptions;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Runtime is live
    Open,
    /// Runtime has been shut down
    Closed,
}

/// One browser instance, exclusively owned by the flow using it
pub struct Session {
    id: Uuid,
    runtime: Option<Box<dyn PageRuntime>>,
    config: SessionConfig,
    base_url: Option<String>,
    cache: HashMap<(Uuid, NodeId), ElementHandle>,
    state: SessionState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("base_url", &self.base_url)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Session {
    /// Launch a browser and open a session on it
    pub fn open(config: SessionConfig, launcher: &dyn Launcher) -> FlowResult<Self> {
        config.validate()?;
        let runtime = launcher.launch(&config)?;
        let session = Self {
            id: Uuid::new_v4(),
            runtime: Some(runtime),
            config,
            base_url: None,
            cache: HashMap::new(),
            state: SessionState::Open,
        };
        tracing::info!(session = %session.id, "session opened");
        Ok(session)
    }

    /// Set the base URL relative paths are joined to
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is still open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Configuration the session was opened with
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Base URL, if set
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Shut the runtime down.
    ///
    /// The runtime's quit runs once per session; closing an already closed
    /// session does nothing and succeeds.
    pub fn close(&mut self) -> FlowResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.cache.clear();
        let result = match self.runtime.take() {
            Some(mut runtime) => runtime.quit(),
            None => Ok(()),
        };
        match &result {
            Ok(()) => tracing::info!(session = %self.id, "session closed"),
            Err(e) => tracing::warn!(session = %self.id, error = %e, "session quit failed"),
        }
        result
    }

    /// Mutable access to the runtime
    pub fn runtime_mut(&mut self) -> FlowResult<&mut dyn PageRuntime> {
        match self.runtime.as_mut() {
            Some(runtime) if self.state == SessionState::Open => {
                let runtime: &mut dyn PageRuntime = &mut **runtime;
                Ok(runtime)
            }
            _ => Err(FlowError::SessionClosed),
        }
    }

    /// Expand a relative path against the base URL
    #[must_use]
    pub fn absolute_url(&self, url: &str) -> String {
        if url.contains("://") || url.starts_with("about:") {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }

    /// Load a URL; every cached resolution is dropped
    pub fn load(&mut self, url: &str) -> FlowResult<()> {
        let url = self.absolute_url(url);
        self.invalidate();
        tracing::debug!(session = %self.id, %url, "loading");
        self.runtime_mut()?.load(&url)
    }

    /// Current page URL
    pub fn current_url(&mut self) -> FlowResult<String> {
        self.runtime_mut()?.current_url()
    }

    /// Drop every cached resolution
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Drop the cached resolution of `node` and everything below it
    pub fn invalidate_node(&mut self, tree: &PageTree, node: NodeId) {
        for id in tree.subtree(node) {
            let _ = self.cache.remove(&(tree.id(), id));
        }
    }

    /// Whether `node` currently has a cached resolution
    #[must_use]
    pub fn is_cached(&self, tree: &PageTree, node: NodeId) -> bool {
        self.cache.contains_key(&(tree.id(), node))
    }

    /// Resolve a node using the element bound
    pub fn resolve(&mut self, tree: &PageTree, node: NodeId) -> FlowResult<ElementHandle> {
        let wait = self.config.element_wait();
        self.resolve_within(tree, node, wait)
    }

    /// Resolve a node, polling within `wait` on a cache miss
    pub fn resolve_within(
        &mut self,
        tree: &PageTree,
        node: NodeId,
        wait: WaitOptions,
    ) -> FlowResult<ElementHandle> {
        let _ = tree.get(node)?;
        if let Some(handle) = self.cache.get(&(tree.id(), node)) {
            return Ok(handle.clone());
        }

        let chain = tree.chain(node);
        tracing::debug!(target_node = %tree.path(node), locator = %chain, "resolving");
        match self.runtime_mut()?.resolve(&chain, wait)? {
            Resolution::Resolved(handle) => {
                let _ = self.cache.insert((tree.id(), node), handle.clone());
                Ok(handle)
            }
            Resolution::Absent { elapsed_ms } => {
                tracing::debug!(target_node = %tree.path(node), elapsed_ms, "not resolved");
                self.invalidate_node(tree, node);
                Err(FlowError::ElementResolution {
                    target: tree.path(node),
                    locator: chain.to_string(),
                })
            }
        }
    }

    /// Resolve `node` again from the page, ignoring any cached handle.
    ///
    /// Cached resolutions of `node` and its descendants are dropped first,
    /// so the runtime always polls within `wait`.
    pub fn refresh(
        &mut self,
        tree: &PageTree,
        node: NodeId,
        wait: WaitOptions,
    ) -> FlowResult<ElementHandle> {
        let _ = tree.get(node)?;
        self.invalidate_node(tree, node);
        self.resolve_within(tree, node, wait)
    }

    /// Whether `node` is on the page right now
    pub fn is_present(&mut self, tree: &PageTree, node: NodeId) -> FlowResult<bool> {
        let _ = tree.get(node)?;
        let present = self.runtime_mut()?.is_present(&tree.chain(node))?;
        if !present {
            self.invalidate_node(tree, node);
        }
        Ok(present)
    }

    /// Wait for `node` to disappear; `false` if it is still there at the bound
    pub fn wait_for_absence(&mut self, tree: &PageTree, node: NodeId) -> FlowResult<bool> {
        let _ = tree.get(node)?;
        let wait = self.config.element_wait();
        let gone = self.runtime_mut()?.wait_for_absence(&tree.chain(node), wait)?;
        if gone {
            self.invalidate_node(tree, node);
        }
        Ok(gone)
    }

    /// Wait for the URL to contain `fragment`, using the navigation bound
    pub fn wait_for_url(&mut self, fragment: &str) -> FlowResult<bool> {
        let wait = self.config.navigation_wait();
        let reached = self.runtime_mut()?.wait_for_url(fragment, wait)?;
        if reached {
            self.invalidate();
        }
        Ok(reached)
    }

    /// Number of elements `node`'s chain matches
    pub fn count(&mut self, tree: &PageTree, node: NodeId) -> FlowResult<usize> {
        let _ = tree.get(node)?;
        self.runtime_mut()?.count(&tree.chain(node))
    }

    /// Resolve `node` and read its text
    pub fn text(&mut self, tree: &PageTree, node: NodeId) -> FlowResult<String> {
        let handle = self.resolve(tree, node)?;
        self.runtime_mut()?.text(&handle)
    }

    /// Resolve `node` and click it
    pub fn click(&mut self, tree: &PageTree, node: NodeId) -> FlowResult<()> {
        let handle = self.resolve(tree, node)?;
        self.runtime_mut()?.click(&handle)
    }

    /// Resolve `node` and replace its value
    pub fn set_text(&mut self, tree: &PageTree, node: NodeId, text: &str) -> FlowResult<()> {
        let handle = self.resolve(tree, node)?;
        self.runtime_mut()?.set_text(&handle, text)
    }

    /// Resolve `node` and pick the option at `index` (1-based)
    pub fn select_index(&mut self, tree: &PageTree, node: NodeId, index: usize) -> FlowResult<()> {
        let handle = self.resolve(tree, node)?;
        self.runtime_mut()?.select_index(&handle, index)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_open() {
            tracing::debug!(session = %self.id, "closing session on drop");
            let _ = self.close();
        }
    }
}

/// Open a session, run `body`, and close the session on every exit path.
///
/// The body's error wins over a teardown error; a teardown error is only
/// returned when the body succeeded.
pub fn with_session<T, F>(config: SessionConfig, launcher: &dyn Launcher, body: F) -> FlowResult<T>
where
    F: FnOnce(&mut Session) -> FlowResult<T>,
{
    let mut session = Session::open(config, launcher)?;
    let result = body(&mut session);
    let closed = session.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::mock::{MockCall, MockEffect, MockElement, MockLauncher, MockRoute, MockSite};
    use crate::page_object::RegionKind;

    fn config() -> SessionConfig {
        SessionConfig::new()
            .element_timeout_ms(30)
            .navigation_timeout_ms(30)
            .poll_interval_ms(1)
    }

    fn launcher() -> MockLauncher {
        MockLauncher::new(
            MockSite::new().route(
                MockRoute::new("/home")
                    .element("main", MockElement::new())
                    .element("main >> dialog", MockElement::new())
                    .element("main >> dialog >> button", MockElement::with_text("Close")
                        .on_click(MockEffect::Remove("main >> dialog".into()))),
            ),
        )
    }

    fn tree() -> (PageTree, NodeId, NodeId, NodeId) {
        let mut tree = PageTree::new();
        let root = tree.root("Home", Locator::new("main"));
        let dialog = tree.child(root, "dialog", Locator::new("dialog"), RegionKind::Container);
        let button = tree.child(dialog, "close", Locator::new("button"), RegionKind::Button);
        (tree, root, dialog, button)
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_open_and_close() {
            let launcher = launcher();
            let mut session = Session::open(config(), &launcher).unwrap();
            assert!(session.is_open());
            session.close().unwrap();
            assert_eq!(session.state(), SessionState::Closed);
            assert_eq!(launcher.quit_count(), 1);
        }

        #[test]
        fn test_double_close_is_noop() {
            let launcher = launcher();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.close().unwrap();
            session.close().unwrap();
            drop(session);
            assert_eq!(launcher.quit_count(), 1);
        }

        #[test]
        fn test_drop_closes() {
            let launcher = launcher();
            {
                let _session = Session::open(config(), &launcher).unwrap();
            }
            assert_eq!(launcher.quit_count(), 1);
        }

        #[test]
        fn test_closed_session_rejects_operations() {
            let launcher = launcher();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.close().unwrap();
            assert!(matches!(session.load("https://x.test/home"), Err(FlowError::SessionClosed)));
        }

        #[test]
        fn test_launch_failure() {
            let launcher = MockLauncher::failing("boom");
            let err = Session::open(config(), &launcher).unwrap_err();
            assert!(matches!(err, FlowError::SessionStart { .. }));
        }

        #[test]
        fn test_with_session_closes_on_error() {
            let launcher = launcher();
            let result: FlowResult<()> =
                with_session(config(), &launcher, |_| Err(FlowError::runtime("step blew up")));
            assert!(result.is_err());
            assert_eq!(launcher.quit_count(), 1);
        }
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_resolution_is_cached() {
            let launcher = launcher();
            let (tree, _, dialog, _) = tree();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.load("https://x.test/home").unwrap();
            let a = session.resolve(&tree, dialog).unwrap();
            let b = session.resolve(&tree, dialog).unwrap();
            assert_eq!(a, b);
            let resolves = launcher
                .calls()
                .iter()
                .filter(|c| matches!(c, MockCall::Resolve(_)))
                .count();
            assert_eq!(resolves, 1);
        }

        #[test]
        fn test_navigation_invalidates_cache() {
            let launcher = launcher();
            let (tree, _, dialog, _) = tree();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.load("https://x.test/home").unwrap();
            let _ = session.resolve(&tree, dialog).unwrap();
            assert!(session.is_cached(&tree, dialog));
            session.load("https://x.test/home").unwrap();
            assert!(!session.is_cached(&tree, dialog));
        }

        #[test]
        fn test_absence_invalidates_subtree() {
            let launcher = launcher();
            let (tree, _, dialog, button) = tree();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.load("https://x.test/home").unwrap();
            let _ = session.resolve(&tree, dialog).unwrap();
            session.click(&tree, button).unwrap();
            assert!(session.wait_for_absence(&tree, dialog).unwrap());
            assert!(!session.is_cached(&tree, dialog));
            assert!(!session.is_cached(&tree, button));
        }

        #[test]
        fn test_refresh_skips_cached_handle() {
            let launcher = launcher();
            let (tree, _, dialog, button) = tree();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.load("https://x.test/home").unwrap();
            let _ = session.resolve(&tree, dialog).unwrap();
            session.click(&tree, button).unwrap();

            // still cached, but gone from the page
            assert!(session.is_cached(&tree, dialog));
            let wait = session.config().element_wait();
            let err = session.refresh(&tree, dialog, wait).unwrap_err();
            assert!(matches!(err, FlowError::ElementResolution { .. }));
            assert!(!session.is_cached(&tree, dialog));
        }

        #[test]
        fn test_unresolvable_node() {
            let launcher = launcher();
            let (tree, _, dialog, _) = tree();
            let mut session = Session::open(config(), &launcher).unwrap();
            session.load("https://x.test/elsewhere").unwrap();
            let err = session.resolve(&tree, dialog).unwrap_err();
            match err {
                FlowError::ElementResolution { target, locator } => {
                    assert_eq!(target, "Home > dialog");
                    assert_eq!(locator, "main >> dialog");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_absolute_url() {
            let launcher = launcher();
            let session = Session::open(config(), &launcher)
                .unwrap()
                .with_base_url("https://x.test/");
            assert_eq!(session.absolute_url("/home"), "https://x.test/home");
            assert_eq!(session.absolute_url("https://y.test"), "https://y.test");
        }
    }
}
