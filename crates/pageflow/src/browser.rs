//! Chromium page runtime over CDP.
//!
//! The runtime owns a current-thread tokio runtime and blocks on every CDP
//! call, so sessions stay synchronous. Element lookup runs in the page: a
//! small resolver walks the locator chain from `document`, piercing open
//! shadow roots, and keeps matched elements in `window.__pageflow` keyed by
//! handle id. A handle whose element was detached by a re-render is looked
//! up again from its chain before the operation runs.

use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime as TokioRuntime;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::locator::{Locator, LocatorChain, Selector};
use crate::result::{FlowError, FlowResult};
use crate::runtime::{ElementHandle, Launcher, PageRuntime, Resolution};
use crate::wait::{WaitOptions, Waiter};

/// In-page helpers, evaluated ahead of every script body
const RESOLVER_JS: &str = r#"
const pf = window.__pageflow || (window.__pageflow = { els: {} });
const scopesOf = (node) => (node.shadowRoot ? [node, node.shadowRoot] : [node]);
const deep = (node, css) => {
  const out = [];
  const walk = (root) => {
    root.querySelectorAll(css).forEach((e) => out.push(e));
    root.querySelectorAll('*').forEach((e) => { if (e.shadowRoot) walk(e.shadowRoot); });
  };
  scopesOf(node).forEach(walk);
  return out;
};
const textOf = (e) => (e.innerText || e.textContent || '').trim();
const byXPath = (node, xpath) => {
  const res = document.evaluate(xpath, node, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
  const out = [];
  for (let i = 0; i < res.snapshotLength; i++) out.push(res.snapshotItem(i));
  return out;
};
const matchStep = (node, step) => {
  if (step.xpath !== undefined) return byXPath(node, step.xpath);
  const found = deep(node, step.css);
  if (step.text === undefined) return found;
  if (step.exact) {
    const exact = found.filter((e) => textOf(e) === step.text);
    return exact.filter((e) => !exact.some((o) => o !== e && e.contains(o)));
  }
  return found.filter((e) => textOf(e).includes(step.text));
};
const find = (chain) => {
  let scopes = [document];
  for (const step of chain) {
    let next = [];
    scopes.forEach((s) => { next = next.concat(matchStep(s, step)); });
    if (step.nth !== undefined) next = next.length > step.nth ? [next[step.nth]] : [];
    scopes = next;
    if (scopes.length === 0) return [];
  }
  return scopes;
};
const visible = (e) => e.isConnected && e.getClientRects().length > 0;
const attached = (id, chain) => {
  const known = pf.els[id];
  if (known && visible(known)) return known;
  const el = find(chain).find(visible);
  if (!el) throw new Error('element ' + id + ' is detached');
  pf.els[id] = el;
  return el;
};
"#;

/// One locator step as the in-page resolver reads it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct StepSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    exact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    nth: Option<usize>,
}

impl From<&Locator> for StepSpec {
    fn from(locator: &Locator) -> Self {
        let mut spec = Self {
            css: None,
            xpath: None,
            text: None,
            exact: false,
            nth: locator.nth,
        };
        match &locator.selector {
            Selector::Css(css) => spec.css = Some(css.clone()),
            Selector::XPath(xpath) => spec.xpath = Some(xpath.clone()),
            Selector::Text(text) => {
                spec.css = Some("*".to_string());
                spec.text = Some(text.clone());
                spec.exact = true;
            }
            Selector::TestId(id) => spec.css = Some(format!("[data-testid=\"{id}\"]")),
            Selector::CssWithText { css, text } => {
                spec.css = Some(css.clone());
                spec.text = Some(text.clone());
            }
        }
        spec
    }
}

fn chain_json(chain: &LocatorChain) -> FlowResult<String> {
    let steps: Vec<StepSpec> = chain.steps().iter().map(StepSpec::from).collect();
    Ok(serde_json::to_string(&steps)?)
}

/// Wrap `body` (a JS expression) so it runs after the resolver helpers
fn script(body: &str) -> String {
    format!("(() => {{ {RESOLVER_JS}\nreturn ({body}); }})()")
}

fn element_script(element: &ElementHandle, action: &str) -> FlowResult<String> {
    let id = serde_json::to_string(&element.id)?;
    let chain = chain_json(&element.chain)?;
    Ok(script(&format!(
        "(() => {{ const el = attached({id}, {chain}); {action} }})()"
    )))
}

fn runtime_error(e: impl std::fmt::Display) -> FlowError {
    FlowError::runtime(e.to_string())
}

fn start_error(e: impl std::fmt::Display) -> FlowError {
    FlowError::SessionStart {
        message: e.to_string(),
    }
}

/// Launches headless (or headed) Chromium
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    /// Create a launcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Launcher for ChromiumLauncher {
    fn launch(&self, config: &SessionConfig) -> FlowResult<Box<dyn PageRuntime>> {
        Ok(Box::new(ChromiumRuntime::launch(config)?))
    }
}

/// A Chromium browser with one page, driven over CDP
#[derive(Debug)]
pub struct ChromiumRuntime {
    rt: TokioRuntime,
    browser: Option<CdpBrowser>,
    page: CdpPage,
    handler: JoinHandle<()>,
    next_id: u64,
    navigation_timeout_ms: u64,
}

impl ChromiumRuntime {
    /// Launch Chromium and open a blank page
    pub fn launch(config: &SessionConfig) -> FlowResult<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(start_error)?;

        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms));
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(start_error)?;

        let (browser, page, handler) = rt.block_on(async {
            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(start_error)?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser.new_page("about:blank").await.map_err(start_error)?;
            Ok::<_, FlowError>((browser, page, handler))
        })?;

        tracing::info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "chromium launched"
        );

        Ok(Self {
            rt,
            browser: Some(browser),
            page,
            handler,
            next_id: 0,
            navigation_timeout_ms: config.navigation_timeout_ms,
        })
    }

    fn ensure_running(&self) -> FlowResult<()> {
        if self.browser.is_none() {
            return Err(FlowError::runtime("browser has quit"));
        }
        Ok(())
    }

    fn eval(&self, expression: String) -> FlowResult<Value> {
        self.ensure_running()?;
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .build()
            .map_err(runtime_error)?;
        let page = &self.page;
        self.rt.block_on(async {
            let result = page.evaluate_expression(params).await.map_err(runtime_error)?;
            result.into_value::<Value>().map_err(runtime_error)
        })
    }

    fn eval_bool(&self, expression: String) -> FlowResult<bool> {
        Ok(self.eval(expression)?.as_bool().unwrap_or(false))
    }

    fn on_element(&self, element: &ElementHandle, action: &str) -> FlowResult<Value> {
        tracing::debug!(element = %element, "cdp element call");
        self.eval(element_script(element, action)?)
    }
}

impl PageRuntime for ChromiumRuntime {
    fn load(&mut self, url: &str) -> FlowResult<()> {
        self.ensure_running()?;
        tracing::debug!(url, "navigating");
        let timeout_ms = self.navigation_timeout_ms;
        let start = Instant::now();
        let page = &self.page;
        let outcome = self.rt.block_on(async {
            tokio::time::timeout(Duration::from_millis(timeout_ms), page.goto(url)).await
        });
        match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(CdpError::Timeout)) | Err(_) => Err(FlowError::PageLoadTimeout {
                page: url.to_string(),
                elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                timeout_ms,
            }),
            Ok(Err(e)) => Err(FlowError::runtime(format!("navigation to {url} failed: {e}"))),
        }
    }

    fn current_url(&mut self) -> FlowResult<String> {
        self.ensure_running()?;
        let page = &self.page;
        let url = self
            .rt
            .block_on(async { page.url().await.map_err(runtime_error) })?;
        Ok(url.unwrap_or_default())
    }

    fn resolve(&mut self, chain: &LocatorChain, wait: WaitOptions) -> FlowResult<Resolution> {
        let chain_js = chain_json(chain)?;
        let id = format!("pf-{}", self.next_id + 1);
        let id_js = serde_json::to_string(&id)?;
        let check = script(&format!(
            "(() => {{ const el = find({chain_js}).find(visible); \
             if (!el) return false; pf.els[{id_js}] = el; return true; }})()"
        ));

        let outcome = Waiter::new(wait).until(|| Ok(self.eval_bool(check.clone())?.then_some(())))?;
        if outcome.is_ready() {
            self.next_id += 1;
            Ok(Resolution::Resolved(ElementHandle::new(id, chain.clone())))
        } else {
            Ok(Resolution::Absent {
                elapsed_ms: outcome.elapsed().as_millis() as u64,
            })
        }
    }

    fn is_present(&mut self, chain: &LocatorChain) -> FlowResult<bool> {
        let chain_js = chain_json(chain)?;
        self.eval_bool(script(&format!("find({chain_js}).some(visible)")))
    }

    fn wait_for_absence(&mut self, chain: &LocatorChain, wait: WaitOptions) -> FlowResult<bool> {
        let expression = script(&format!("!find({}).some(visible)", chain_json(chain)?));
        Waiter::new(wait).until_true(|| self.eval_bool(expression.clone()))
    }

    fn wait_for_url(&mut self, fragment: &str, wait: WaitOptions) -> FlowResult<bool> {
        Waiter::new(wait).until_true(|| Ok(self.current_url()?.contains(fragment)))
    }

    fn click(&mut self, element: &ElementHandle) -> FlowResult<()> {
        self.on_element(
            element,
            "el.scrollIntoView({ block: 'center' }); el.click(); return true;",
        )?;
        Ok(())
    }

    fn set_text(&mut self, element: &ElementHandle, text: &str) -> FlowResult<()> {
        let text = serde_json::to_string(text)?;
        self.on_element(
            element,
            &format!(
                "const input = (el.matches('input, textarea') ? el : deep(el, 'input, textarea')[0]) || el; \
                 input.focus(); \
                 if ('value' in input) {{ \
                   const proto = Object.getPrototypeOf(input); \
                   const setter = Object.getOwnPropertyDescriptor(proto, 'value'); \
                   if (setter && setter.set) setter.set.call(input, {text}); else input.value = {text}; \
                 }} else {{ input.textContent = {text}; }} \
                 input.dispatchEvent(new Event('input', {{ bubbles: true, composed: true }})); \
                 input.dispatchEvent(new Event('change', {{ bubbles: true, composed: true }})); \
                 input.blur(); return true;"
            ),
        )?;
        Ok(())
    }

    fn select_index(&mut self, element: &ElementHandle, index: usize) -> FlowResult<()> {
        if index == 0 {
            return Err(FlowError::invalid_script("option indexes start at 1"));
        }
        let selected = self.on_element(
            element,
            &format!(
                "const at = {index} - 1; \
                 if (el.tagName === 'SELECT') {{ \
                   if (at >= el.options.length) return false; \
                   el.selectedIndex = at; \
                   el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; \
                 }} \
                 el.click(); \
                 const options = deep(document, '[role=\"option\"]').filter(visible); \
                 if (at >= options.length) return false; \
                 options[at].click(); return true;"
            ),
        )?;
        if selected.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(FlowError::runtime(format!(
                "{element} has no option at index {index}"
            )))
        }
    }

    fn text(&mut self, element: &ElementHandle) -> FlowResult<String> {
        let value = self.on_element(
            element,
            "return el.matches('input, textarea, select') ? String(el.value) : textOf(el);",
        )?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn count(&mut self, chain: &LocatorChain) -> FlowResult<usize> {
        let chain_js = chain_json(chain)?;
        let value = self.eval(script(&format!("find({chain_js}).length")))?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    fn quit(&mut self) -> FlowResult<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let result = self.rt.block_on(async {
            browser.close().await.map_err(runtime_error)?;
            let _ = browser.wait().await;
            Ok::<_, FlowError>(())
        });
        self.handler.abort();
        tracing::info!("chromium closed");
        result
    }
}

impl Drop for ChromiumRuntime {
    fn drop(&mut self) {
        if self.browser.is_some() {
            let _ = self.quit();
        }
    }
}
