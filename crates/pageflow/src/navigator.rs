//! Navigation to typed page roots.

use crate::page_object::{NodeId, PageTree};
use crate::result::{FlowError, FlowResult};
use crate::runtime::ElementHandle;
use crate::session::Session;
use crate::wait::WaitOptions;
use std::time::Instant;

/// Handle to a loaded page root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    /// Root node in the page tree
    pub node: NodeId,
    /// Page name
    pub page: String,
    /// Resolved root element
    pub element: ElementHandle,
}

/// Loads URLs and waits for page roots
#[derive(Debug, Clone, Copy, Default)]
pub struct Navigator;

impl Navigator {
    /// Load `url` and wait for `root` to become resolvable.
    ///
    /// One attempt. The load and the root lookup share the session's
    /// navigation timeout; running out during either is a
    /// [`FlowError::PageLoadTimeout`] naming the expected page.
    pub fn goto(
        session: &mut Session,
        tree: &PageTree,
        url: &str,
        root: NodeId,
    ) -> FlowResult<PageRef> {
        let page = tree.get(root)?.name.clone();
        let wait = session.config().navigation_wait();
        let start = Instant::now();
        tracing::info!(%url, page = %tree.path(root), "navigating");

        match session.load(url) {
            Ok(()) => {}
            Err(FlowError::PageLoadTimeout { elapsed_ms, .. }) => {
                return Err(FlowError::PageLoadTimeout {
                    page,
                    elapsed_ms,
                    timeout_ms: wait.timeout_ms,
                });
            }
            Err(e) => return Err(e),
        }

        let remaining = wait.timeout_ms.saturating_sub(millis(start));
        Self::wait_for_root(session, tree, root, wait.with_timeout(remaining), start)
    }

    /// Treat the currently loaded page as `root`, without navigating.
    ///
    /// The root is looked up again even if it was resolved before, so a page
    /// that has been replaced since is not mistaken for the current one.
    pub fn from(session: &mut Session, tree: &PageTree, root: NodeId) -> FlowResult<PageRef> {
        let wait = session.config().navigation_wait();
        Self::wait_for_root(session, tree, root, wait, Instant::now())
    }

    fn wait_for_root(
        session: &mut Session,
        tree: &PageTree,
        root: NodeId,
        wait: WaitOptions,
        start: Instant,
    ) -> FlowResult<PageRef> {
        let page = tree.get(root)?.name.clone();
        let timeout_ms = session.config().navigation_timeout_ms;

        match session.refresh(tree, root, wait) {
            Ok(element) => {
                let elapsed_ms = millis(start);
                tracing::debug!(%page, elapsed_ms, "page loaded");
                Ok(PageRef {
                    node: root,
                    page,
                    element,
                })
            }
            Err(FlowError::ElementResolution { .. }) => Err(FlowError::PageLoadTimeout {
                page,
                elapsed_ms: millis(start),
                timeout_ms,
            }),
            Err(e) => Err(e),
        }
    }
}

fn millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
