//! Runners.
//!
//! A [`Runtime`] wires one [`Bridge`] to the interop layer, the resource
//! loader, the visual tree and the animator, and boots the surface: startup
//! scripts first, then startup stylesheets. [`launch_headless`] builds one on
//! the recording bridge; on wasm32 the `web` module exports `start` for the
//! browser.

#[cfg(target_arch = "wasm32")]
pub mod web;
mod tests;

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, anyhow, bail};
use serde::Deserialize;
use trellis_core::{PropertyBag, Size};
use trellis_interop::{
    Bridge, CallFlags, DEFAULT_BATCH_LIMIT, HeadlessBridge, Interop, InteropContext, JsRef,
    RenderSurface, ResourceLoader, ScriptSurface,
};
use trellis_ui::{Animator, NodeId, VisualTree};

/// Startup configuration, usually handed over as JSON by the page.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeOptions {
    /// Calls kept for error diagnostics.
    pub ledger_capacity: usize,
    /// Queued asynchronous calls that force a flush.
    pub batch_limit: usize,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    /// Element the root is mounted under; `document.body` when unset.
    pub host_element_id: Option<String>,
    /// `env_logger` filter syntax natively, a plain level on the web.
    pub log_level: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            ledger_capacity: 8192,
            batch_limit: DEFAULT_BATCH_LIMIT,
            scripts: Vec::new(),
            styles: Vec::new(),
            host_element_id: None,
            log_level: "info".to_string(),
        }
    }
}

impl RuntimeOptions {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let options: Self = serde_json::from_str(json).context("invalid runtime options")?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ledger_capacity == 0 {
            bail!("ledgerCapacity must be at least 1");
        }
        if self.batch_limit == 0 {
            bail!("batchLimit must be at least 1");
        }
        Ok(())
    }
}

/// Installs the process logger. Later calls are ignored.
pub fn init_logging(level: &str) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::new()
            .parse_filters(level)
            .format_timestamp_millis()
            .try_init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        let level = level.parse().unwrap_or(log::Level::Info);
        let _ = console_log::init_with_level(level);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootState {
    Idle,
    LoadingScripts,
    LoadingStyles,
    Ready,
    Failed,
}

pub struct Runtime<B: Bridge> {
    options: RuntimeOptions,
    interop: Interop<B>,
    loader: ResourceLoader<B>,
    tree: VisualTree<ScriptSurface<B>>,
    animator: Animator<ScriptSurface<B>, PropertyBag>,
    properties: PropertyBag,
    state: Rc<Cell<BootState>>,
    host: Option<JsRef>,
    root: Option<NodeId>,
}

impl<B: Bridge> Runtime<B> {
    pub fn new(bridge: B, options: RuntimeOptions) -> Self {
        let ctx = Rc::new(InteropContext::new(options.ledger_capacity));
        let interop = Interop::with_batch_limit(bridge, ctx, options.batch_limit);
        let surface = ScriptSurface::new(interop.clone());
        let properties = PropertyBag::new();
        Self {
            loader: ResourceLoader::new(interop.clone()),
            tree: VisualTree::new(surface.clone()),
            animator: Animator::new(surface, properties.clone()),
            interop,
            properties,
            options,
            state: Rc::new(Cell::new(BootState::Idle)),
            host: None,
            root: None,
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn interop(&self) -> &Interop<B> {
        &self.interop
    }

    pub fn loader(&self) -> &ResourceLoader<B> {
        &self.loader
    }

    pub fn tree(&self) -> &VisualTree<ScriptSurface<B>> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut VisualTree<ScriptSurface<B>> {
        &mut self.tree
    }

    pub fn animator(&self) -> &Animator<ScriptSurface<B>, PropertyBag> {
        &self.animator
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn state(&self) -> BootState {
        self.state.get()
    }

    /// Loads the startup scripts in order, then the startup styles.
    /// `on_ready` fires once both are in; a failed script stops the boot.
    pub fn boot(&self, on_ready: impl Fn() + 'static) {
        log::info!(
            "booting with {} script(s) and {} stylesheet(s)",
            self.options.scripts.len(),
            self.options.styles.len()
        );
        self.state.set(BootState::LoadingScripts);

        let weak = self.interop.downgrade();
        let state = self.state.clone();
        let failed = self.state.clone();
        let styles = self.options.styles.clone();
        let on_ready: Rc<dyn Fn()> = Rc::new(on_ready);
        self.loader.load_scripts(
            self.options.scripts.clone(),
            move || {
                let Some(interop) = weak.upgrade() else {
                    return;
                };
                state.set(BootState::LoadingStyles);
                let state = state.clone();
                let on_ready = on_ready.clone();
                ResourceLoader::new(interop).load_styles(styles.clone(), move || {
                    state.set(BootState::Ready);
                    log::info!("runtime ready");
                    on_ready();
                });
            },
            move || {
                log::error!("startup scripts failed to load");
                failed.set(BootState::Failed);
            },
        );
    }

    /// Element the root is mounted under, looked up once.
    pub fn host(&mut self) -> anyhow::Result<JsRef> {
        if let Some(host) = self.host {
            return Ok(host);
        }
        let host = match &self.options.host_element_id {
            Some(id) => self
                .tree
                .surface()
                .element_by_id(id)?
                .ok_or_else(|| anyhow!("host element #{id} not found"))?,
            None => self
                .interop
                .execute("document.body", &[], CallFlags::SYNC)?
                .as_js_ref()
                .ok_or_else(|| anyhow!("document has no body"))?,
        };
        self.host = Some(host);
        Ok(host)
    }

    pub fn mount(&mut self, root: NodeId) -> anyhow::Result<()> {
        let host = self.host()?;
        self.tree.attach_root(root, &host)?;
        self.root = Some(root);
        log::debug!("mounted {root:?} under {host}");
        Ok(())
    }

    /// Lays the mounted root out in `viewport`. False when nothing changed.
    pub fn render(&mut self, viewport: Size) -> anyhow::Result<bool> {
        let Some(root) = self.root else {
            return Ok(false);
        };
        Ok(self.tree.update_layout(root, viewport)?)
    }

    /// The surface was reloaded: bootstrap again on the next call. Loaded
    /// resources and references are kept.
    pub fn reload(&mut self) {
        self.interop.context().reload();
        self.host = None;
        self.state.set(BootState::Idle);
    }
}

/// Boots a runtime on the recording bridge.
pub fn launch_headless(options: RuntimeOptions) -> anyhow::Result<Runtime<HeadlessBridge>> {
    options.validate()?;
    init_logging(&options.log_level);
    let runtime = Runtime::new(HeadlessBridge::new(), options);
    runtime.boot(|| {});
    Ok(runtime)
}
