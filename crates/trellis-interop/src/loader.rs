use std::cell::Cell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::{Arg, Bridge, CallbackId, Interop, Value};

type Done = Rc<dyn Fn()>;

const SCRIPT_TEMPLATE: &str = r#"(function (url, onLoad, onError) {
  var s = document.createElement('script');
  s.type = 'application/javascript';
  s.async = false;
  s.onload = function () { onLoad(url); };
  s.onerror = function () { onError(url); };
  s.src = url;
  document.head.appendChild(s);
})($0, $1, $2)"#;

// A stylesheet has no reliable load event; an <img> pointed at the same url
// always errors once the resource has been fetched.
const STYLE_TEMPLATE: &str = r#"(function (url, done) {
  var link = document.createElement('link');
  link.rel = 'stylesheet';
  link.type = 'text/css';
  link.href = url;
  document.head.appendChild(link);
  var img = document.createElement('img');
  img.onerror = function () { done(url); };
  img.src = url;
})($0, $1)"#;

struct Waiter {
    on_success: Done,
    on_failure: Done,
}

struct Pending {
    waiters: Vec<Waiter>,
    proxies: Option<(CallbackId, CallbackId)>,
}

/// Per-url script state, kept in the [`InteropContext`](crate::InteropContext).
#[derive(Default)]
pub struct LoadState {
    loaded: HashSet<String>,
    pending: HashMap<String, Pending>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    NotStarted,
    /// In flight, with this many waiters.
    Pending(usize),
    Loaded,
}

/// Strips the app-package scheme and surrounding whitespace so that
/// different spellings of one resource share a state.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url
        .strip_prefix("ms-appx:///")
        .or_else(|| url.strip_prefix("ms-appx:/"))
        .unwrap_or(url);
    url.to_string()
}

/// Deduplicated script and stylesheet loading.
pub struct ResourceLoader<B: Bridge> {
    interop: Interop<B>,
}

impl<B: Bridge> Clone for ResourceLoader<B> {
    fn clone(&self) -> Self {
        Self {
            interop: self.interop.clone(),
        }
    }
}

impl<B: Bridge> ResourceLoader<B> {
    pub fn new(interop: Interop<B>) -> Self {
        Self { interop }
    }

    pub fn status(&self, url: &str) -> LoadStatus {
        let url = normalize_url(url);
        let state = self.interop.context().resources.borrow();
        if state.loaded.contains(&url) {
            LoadStatus::Loaded
        } else if let Some(p) = state.pending.get(&url) {
            LoadStatus::Pending(p.waiters.len())
        } else {
            LoadStatus::NotStarted
        }
    }

    /// Loads a script once. Callers arriving while it is in flight are
    /// queued; callers arriving after it loaded are answered immediately.
    pub fn load_script(
        &self,
        url: &str,
        on_success: impl Fn() + 'static,
        on_failure: impl Fn() + 'static,
    ) {
        let url = normalize_url(url);
        let ctx = self.interop.context().clone();
        let waiter = Waiter {
            on_success: Rc::new(on_success),
            on_failure: Rc::new(on_failure),
        };

        {
            let mut state = ctx.resources.borrow_mut();
            if state.loaded.contains(&url) {
                drop(state);
                (waiter.on_success)();
                return;
            }
            if let Some(p) = state.pending.get_mut(&url) {
                log::debug!("{url} already loading, {} waiter(s) ahead", p.waiters.len());
                p.waiters.push(waiter);
                return;
            }
            state.pending.insert(
                url.clone(),
                Pending {
                    waiters: vec![waiter],
                    proxies: None,
                },
            );
        }

        let on_load = self.completion_proxy(&url, true);
        let on_error = self.completion_proxy(&url, false);
        if let Some(p) = ctx.resources.borrow_mut().pending.get_mut(&url) {
            p.proxies = Some((on_load, on_error));
        }

        log::debug!("loading script {url}");
        if let Err(e) = self.interop.execute_void(
            SCRIPT_TEMPLATE,
            &[Arg::from(&url), Arg::Proxy(on_load), Arg::Proxy(on_error)],
        ) {
            log::warn!("could not issue load of {url}: {e}");
            self.on_script_load_failure(&url);
        }
    }

    pub fn on_script_load_success(&self, url: &str) {
        self.complete(url, true);
    }

    pub fn on_script_load_failure(&self, url: &str) {
        self.complete(url, false);
    }

    /// Loads `urls` one after the other. The first failure abandons the rest
    /// and fires `on_error` once.
    pub fn load_scripts<I, S>(
        &self,
        urls: I,
        on_completed: impl Fn() + 'static,
        on_error: impl Fn() + 'static,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: VecDeque<String> = urls.into_iter().map(Into::into).collect();
        let fired = Cell::new(false);
        let on_error: Done = Rc::new(move || {
            if !fired.replace(true) {
                on_error()
            }
        });
        self.next_script(queue, Rc::new(on_completed), on_error);
    }

    fn next_script(&self, mut queue: VecDeque<String>, on_completed: Done, on_error: Done) {
        let Some(url) = queue.pop_front() else {
            on_completed();
            return;
        };
        let weak = self.interop.downgrade();
        let failed = on_error.clone();
        let at = url.clone();
        self.load_script(
            &url,
            move || {
                if let Some(interop) = weak.upgrade() {
                    ResourceLoader::new(interop).next_script(
                        queue.clone(),
                        on_completed.clone(),
                        on_error.clone(),
                    );
                }
            },
            move || {
                log::warn!("script batch abandoned at {at}");
                failed()
            },
        );
    }

    /// Adds a stylesheet; `on_done` fires once it was fetched or failed.
    pub fn load_style(&self, url: &str, on_done: impl Fn() + 'static) {
        let url = normalize_url(url);
        let weak = self.interop.downgrade();
        let id = Rc::new(Cell::new(0));
        let own_id = id.clone();
        let proxy = self.interop.context().callbacks.register(Rc::new(move |_: &[Value]| {
            if let Some(interop) = weak.upgrade() {
                if !interop.release_callback(own_id.get()) {
                    return;
                }
            }
            on_done()
        }));
        id.set(proxy);

        log::debug!("loading stylesheet {url}");
        if let Err(e) = self
            .interop
            .execute_void(STYLE_TEMPLATE, &[Arg::from(&url), Arg::Proxy(proxy)])
        {
            log::warn!("could not issue load of {url}: {e}");
        }
    }

    /// Loads stylesheets one after the other, then fires `on_completed`.
    pub fn load_styles<I, S>(&self, urls: I, on_completed: impl Fn() + 'static)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: VecDeque<String> = urls.into_iter().map(Into::into).collect();
        self.next_style(queue, Rc::new(on_completed));
    }

    fn next_style(&self, mut queue: VecDeque<String>, on_completed: Done) {
        let Some(url) = queue.pop_front() else {
            on_completed();
            return;
        };
        let weak = self.interop.downgrade();
        self.load_style(&url, move || {
            if let Some(interop) = weak.upgrade() {
                ResourceLoader::new(interop).next_style(queue.clone(), on_completed.clone());
            }
        });
    }

    /// Forgets every loaded and pending url.
    pub fn reset(&self) {
        let mut state = self.interop.context().resources.borrow_mut();
        for (_, p) in state.pending.drain() {
            if let Some((ok, err)) = p.proxies {
                self.interop.release_callback(ok);
                self.interop.release_callback(err);
            }
        }
        state.loaded.clear();
    }

    fn completion_proxy(&self, url: &str, success: bool) -> CallbackId {
        let weak = self.interop.downgrade();
        let url = url.to_string();
        self.interop
            .context()
            .callbacks
            .register(Rc::new(move |_: &[Value]| {
                if let Some(interop) = weak.upgrade() {
                    ResourceLoader::new(interop).complete(&url, success);
                }
            }))
    }

    fn complete(&self, url: &str, success: bool) {
        let url = normalize_url(url);
        let ctx = self.interop.context().clone();

        let proxies = match ctx.resources.borrow_mut().pending.get_mut(&url) {
            Some(p) => p.proxies.take(),
            None => {
                log::warn!("load event for {url}, which is not loading");
                return;
            }
        };
        if let Some((ok, err)) = proxies {
            ctx.callbacks.release(ok);
            ctx.callbacks.release(err);
        }

        if success {
            log::debug!("script {url} loaded");
        } else {
            log::warn!("script {url} failed to load");
        }

        // Waiters may register more waiters for the same url while firing.
        loop {
            let waiters = match ctx.resources.borrow_mut().pending.get_mut(&url) {
                Some(p) if !p.waiters.is_empty() => std::mem::take(&mut p.waiters),
                _ => break,
            };
            for w in waiters {
                if success {
                    (w.on_success)()
                } else {
                    (w.on_failure)()
                }
            }
        }

        let mut state = ctx.resources.borrow_mut();
        if state.pending.remove(&url).is_some() && success {
            state.loaded.insert(url);
        }
    }
}
