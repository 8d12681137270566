//! Browser runner (wasm32). Calls are evaluated by the page's own `eval`.
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use trellis_interop::{
    BOOTSTRAP_JS, Bridge, BridgeFault, BridgeValue, CallIndex, CallbackId, HostHooks, RefId,
    Submission,
};

use crate::{Runtime, RuntimeOptions, init_logging};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = eval, catch)]
    fn js_eval(source: &str) -> Result<JsValue, JsValue>;
}

#[wasm_bindgen(inline_js = "
export function set_host(report, invoke) { window.trellisHost = { reportError: report, invoke: invoke }; }
export function bind_ref(id, handle) { window.trellis.refs[id] = handle; }
")]
extern "C" {
    fn set_host(report: &Closure<dyn Fn(String, f64)>, invoke: &Closure<dyn Fn(f64, JsValue)>);
    fn bind_ref(id: f64, handle: &JsValue);
}

type HostClosures = (Closure<dyn Fn(String, f64)>, Closure<dyn Fn(f64, JsValue)>);

/// [`Bridge`] over the hosting page.
#[derive(Default)]
pub struct WebBridge {
    // Kept alive for as long as the page may call back.
    host: RefCell<Option<HostClosures>>,
}

fn to_bridge_value(v: JsValue) -> BridgeValue<JsValue> {
    if v.is_undefined() {
        BridgeValue::Undefined
    } else if v.is_null() {
        BridgeValue::Null
    } else if let Some(b) = v.as_bool() {
        BridgeValue::Bool(b)
    } else if let Some(n) = v.as_f64() {
        BridgeValue::Number(n)
    } else if let Some(s) = v.as_string() {
        BridgeValue::String(s)
    } else {
        BridgeValue::Object(v)
    }
}

fn describe(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

impl Bridge for WebBridge {
    type Handle = JsValue;

    fn install(&self, hooks: Rc<dyn HostHooks<JsValue>>) {
        if let Err(e) = js_eval(BOOTSTRAP_JS) {
            log::error!("bootstrap failed: {}", describe(&e));
            return;
        }
        let report_hooks = hooks.clone();
        let report = Closure::<dyn Fn(String, f64)>::new(move |message: String, index: f64| {
            report_hooks.report_error(&message, index as CallIndex);
        });
        let invoke = Closure::<dyn Fn(f64, JsValue)>::new(move |id: f64, arg: JsValue| {
            let args = if arg.is_undefined() {
                Vec::new()
            } else {
                vec![to_bridge_value(arg)]
            };
            hooks.invoke_callback(id as CallbackId, args);
        });
        set_host(&report, &invoke);
        *self.host.borrow_mut() = Some((report, invoke));
    }

    fn eval(&self, call: &Submission, _no_impact: bool) -> Result<BridgeValue<JsValue>, BridgeFault> {
        // Batches are evaluated in one go, so there is nothing to disturb.
        js_eval(&call.wrapped)
            .map(to_bridge_value)
            .map_err(|e| BridgeFault::new(describe(&e)))
    }

    fn eval_batch(&self, calls: &[Submission]) {
        let source = calls
            .iter()
            .map(|c| c.wrapped.as_str())
            .collect::<Vec<_>>()
            .join(";\n");
        if let Err(e) = js_eval(&source) {
            log::error!("batch of {} call(s) failed: {}", calls.len(), describe(&e));
        }
    }

    fn bind_handle(&self, id: RefId, handle: &JsValue) {
        bind_ref(id as f64, handle);
    }
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime<WebBridge>>> = const { RefCell::new(None) };
}

/// Entry point for the page: `start(JSON.stringify(options))`.
#[wasm_bindgen]
pub fn start(options_json: &str) -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let options =
        RuntimeOptions::from_json(options_json).map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
    init_logging(&options.log_level);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    if let Ok(href) = window.location().href() {
        log::info!("starting on {href}");
    }

    let runtime = Runtime::new(WebBridge::default(), options);
    runtime.boot(|| log::debug!("startup resources loaded"));
    RUNTIME.with(|r| *r.borrow_mut() = Some(runtime));
    Ok(())
}

/// Called by the page after a reload of the surface.
#[wasm_bindgen]
pub fn reload() {
    RUNTIME.with(|r| {
        if let Some(runtime) = r.borrow_mut().as_mut() {
            runtime.reload();
            runtime.boot(|| log::debug!("startup resources reloaded"));
        }
    });
}
