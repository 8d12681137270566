use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use smallvec::SmallVec;
use trellis_core::{Error, Result};

use crate::bridge::wrap;
use crate::loader::LoadState;
use crate::{
    Arg, Bridge, BridgeValue, CallIndex, CallLedger, CallbackId, CallbackRegistry, HostHooks,
    JsRef, ReferenceTable, Submission, Value, encode_number, encode_string,
};

bitflags! {
    /// How a call is submitted. No flags means synchronous.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CallFlags: u8 {
        /// Queue into the pending batch and return immediately.
        const ASYNC = 1;
        /// Synchronous, but leave the pending batch alone.
        const NO_IMPACT = 1 << 1;
    }
}

impl CallFlags {
    pub const SYNC: CallFlags = CallFlags::empty();

    fn validate(self) -> Result<()> {
        if self.contains(CallFlags::ASYNC | CallFlags::NO_IMPACT) {
            return Err(Error::InvalidCallMode(
                "a no-impact call cannot also run asynchronously",
            ));
        }
        Ok(())
    }
}

/// Process-scoped tables shared by every interop component.
///
/// Created once at startup and passed explicitly; a reload only resets the
/// initialization flag.
pub struct InteropContext<H> {
    pub refs: ReferenceTable<H>,
    pub ledger: CallLedger,
    pub callbacks: CallbackRegistry,
    pub(crate) resources: RefCell<LoadState>,
    initialized: Cell<bool>,
}

impl<H: Clone> InteropContext<H> {
    pub fn new(ledger_capacity: usize) -> Self {
        Self {
            refs: ReferenceTable::new(),
            ledger: CallLedger::with_capacity(ledger_capacity),
            callbacks: CallbackRegistry::default(),
            resources: RefCell::new(LoadState::default()),
            initialized: Cell::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// The surface was reloaded: bootstrap again on the next call.
    pub fn reload(&self) {
        log::debug!("interop reload requested");
        self.initialized.set(false);
    }
}

impl<H: Clone> Default for InteropContext<H> {
    fn default() -> Self {
        Self::new(8192)
    }
}

pub const DEFAULT_BATCH_LIMIT: usize = 512;

/// Call marshaller. Cheap to clone; clones share the bridge and tables.
pub struct Interop<B: Bridge>(Rc<Inner<B>>);

struct Inner<B: Bridge> {
    bridge: B,
    ctx: Rc<InteropContext<B::Handle>>,
    batch: RefCell<Vec<Submission>>,
    batch_limit: usize,
}

impl<B: Bridge> Clone for Interop<B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

pub struct WeakInterop<B: Bridge>(Weak<Inner<B>>);

impl<B: Bridge> Clone for WeakInterop<B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<B: Bridge> WeakInterop<B> {
    pub fn upgrade(&self) -> Option<Interop<B>> {
        self.0.upgrade().map(Interop)
    }
}

impl<B: Bridge> Interop<B> {
    pub fn new(bridge: B, ctx: Rc<InteropContext<B::Handle>>) -> Self {
        Self::with_batch_limit(bridge, ctx, DEFAULT_BATCH_LIMIT)
    }

    pub fn with_batch_limit(
        bridge: B,
        ctx: Rc<InteropContext<B::Handle>>,
        batch_limit: usize,
    ) -> Self {
        Self(Rc::new(Inner {
            bridge,
            ctx,
            batch: RefCell::new(Vec::new()),
            batch_limit: batch_limit.max(1),
        }))
    }

    pub fn bridge(&self) -> &B {
        &self.0.bridge
    }

    pub fn context(&self) -> &Rc<InteropContext<B::Handle>> {
        &self.0.ctx
    }

    pub fn downgrade(&self) -> WeakInterop<B> {
        WeakInterop(Rc::downgrade(&self.0))
    }

    /// Number of asynchronous calls waiting for the next flush.
    pub fn pending_batch(&self) -> usize {
        self.0.batch.borrow().len()
    }

    pub fn ensure_initialized(&self) {
        if self.0.ctx.initialized.replace(true) {
            return;
        }
        log::debug!("installing surface bootstrap");
        let hooks: Rc<dyn HostHooks<B::Handle>> = Rc::new(Hooks {
            interop: self.downgrade(),
        });
        self.0.bridge.install(hooks);
    }

    /// Marshals `template` with `args` and submits it according to `flags`.
    ///
    /// Asynchronous calls return `Value::Undefined`. A synchronous call that
    /// throws on the surface is reported through [`Interop::report_error`]
    /// and also yields `Value::Undefined`.
    pub fn execute(&self, template: &str, args: &[Arg], flags: CallFlags) -> Result<Value> {
        flags.validate()?;
        self.ensure_initialized();

        let ctx = &self.0.ctx;
        let mut callbacks = SmallVec::new();
        let encoded: Vec<String> = args.iter().map(|a| self.encode(a, &mut callbacks)).collect();
        let source = substitute(template, &encoded);
        let index = ctx.ledger.record(source.clone());

        if flags.contains(CallFlags::ASYNC) {
            log::debug!("queue #{index}: {source}");
            let wrapped = wrap(None, &source, index);
            let full = {
                let mut batch = self.0.batch.borrow_mut();
                batch.push(Submission {
                    index,
                    ref_id: None,
                    source,
                    wrapped,
                    callbacks,
                });
                batch.len() >= self.0.batch_limit
            };
            if full {
                self.flush();
            }
            return Ok(Value::Undefined);
        }

        let no_impact = flags.contains(CallFlags::NO_IMPACT);
        if !no_impact {
            self.flush();
        }

        let ref_id = ctx.refs.reserve();
        let call = Submission {
            index,
            ref_id: Some(ref_id),
            wrapped: wrap(Some(ref_id), &source, index),
            source,
            callbacks,
        };
        log::debug!("eval #{index}: {}", call.source);
        match self.0.bridge.eval(&call, no_impact) {
            Ok(v) => {
                ctx.ledger.clear(index);
                Ok(self.decode(v, Some(ref_id)))
            }
            Err(fault) => {
                self.report_error(&fault.message, index);
                Ok(Value::Undefined)
            }
        }
    }

    pub fn execute_void(&self, template: &str, args: &[Arg]) -> Result<()> {
        self.execute(template, args, CallFlags::SYNC).map(drop)
    }

    pub fn execute_async(&self, template: &str, args: &[Arg]) -> Result<()> {
        self.execute(template, args, CallFlags::ASYNC).map(drop)
    }

    /// Synchronous call read back as text; nullish results become `""`.
    pub fn execute_string(&self, template: &str, args: &[Arg]) -> Result<String> {
        Ok(match self.execute(template, args, CallFlags::SYNC)? {
            Value::String(s) => s,
            Value::Number(n) => encode_number(n),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn execute_f64(&self, template: &str, args: &[Arg]) -> Result<f64> {
        let v = self.execute(template, args, CallFlags::SYNC)?;
        v.as_f64()
            .ok_or_else(|| Error::Bridge(format!("expected a number, got {v:?}")))
    }

    pub fn execute_bool(&self, template: &str, args: &[Arg]) -> Result<bool> {
        let v = self.execute(template, args, CallFlags::SYNC)?;
        v.as_bool()
            .ok_or_else(|| Error::Bridge(format!("expected a boolean, got {v:?}")))
    }

    /// Submits the pending asynchronous batch, in order.
    pub fn flush(&self) {
        let batch = std::mem::take(&mut *self.0.batch.borrow_mut());
        if batch.is_empty() {
            return;
        }
        log::debug!("flushing {} queued call(s)", batch.len());
        self.0.bridge.eval_batch(&batch);
    }

    /// Pairs a surface-side failure with the source recorded at `index`,
    /// logs the diagnostic and returns it.
    pub fn report_error(&self, message: &str, index: CallIndex) -> String {
        let source = self
            .0
            .ctx
            .ledger
            .source(index)
            .unwrap_or_else(|| format!("<call #{index} no longer recorded>"));
        let diagnostic = format!(
            "Error in the following javascript code:\n\n{source}\n\n----- Error: -----\n\n{message}\n"
        );
        log::error!("{diagnostic}");
        diagnostic
    }

    /// Dispatches a surface-side proxy invocation. Object arguments become
    /// fresh references.
    pub fn invoke_callback(&self, id: CallbackId, args: Vec<BridgeValue<B::Handle>>) {
        let Some(cb) = self.0.ctx.callbacks.get(id) else {
            log::warn!("callback {id} invoked after release");
            return;
        };
        let values: Vec<Value> = args.into_iter().map(|v| self.decode(v, None)).collect();
        cb(&values);
    }

    pub fn release_callback(&self, id: CallbackId) -> bool {
        self.0.ctx.callbacks.release(id)
    }

    pub fn resolve(&self, r: JsRef) -> Option<B::Handle> {
        self.0.ctx.refs.resolve(r)
    }

    /// New reference for a handle the surface has not stored yet.
    fn allocate(&self, handle: B::Handle) -> JsRef {
        let r = self.0.ctx.refs.allocate(handle.clone());
        self.0.bridge.bind_handle(r.id(), &handle);
        r
    }

    fn encode(&self, arg: &Arg, callbacks: &mut SmallVec<[CallbackId; 2]>) -> String {
        match arg {
            Arg::Null => "null".to_string(),
            Arg::Bool(b) => b.to_string(),
            Arg::Number(n) => encode_number(*n),
            Arg::Int(n) => n.to_string(),
            Arg::Str(s) => encode_string(s),
            Arg::Ref(r) => r.token(),
            Arg::Callback(cb) => {
                let id = self.0.ctx.callbacks.register(cb.clone());
                callbacks.push(id);
                CallbackRegistry::token(id)
            }
            Arg::Proxy(id) => {
                callbacks.push(*id);
                CallbackRegistry::token(*id)
            }
            Arg::Array(items) => {
                let items: Vec<String> = items.iter().map(|a| self.encode(a, callbacks)).collect();
                format!("[{}]", items.join(", "))
            }
            Arg::Object(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", encode_string(k), self.encode(v, callbacks)))
                    .collect();
                format!("{{{}}}", fields.join(", "))
            }
            Arg::Raw(expr) => expr.clone(),
        }
    }

    fn decode(&self, v: BridgeValue<B::Handle>, reserved: Option<crate::RefId>) -> Value {
        match v {
            BridgeValue::Undefined => Value::Undefined,
            BridgeValue::Null => Value::Null,
            BridgeValue::Bool(b) => Value::Bool(b),
            BridgeValue::Number(n) => Value::Number(n),
            BridgeValue::String(s) => Value::String(s),
            BridgeValue::Object(h) => {
                let bound = match reserved {
                    Some(id) => self.0.ctx.refs.bind(id, h.clone()).map_err(|e| {
                        log::warn!("{e}; allocating a fresh reference");
                    }),
                    None => Err(()),
                };
                Value::Ref(bound.unwrap_or_else(|()| self.allocate(h)))
            }
        }
    }
}

struct Hooks<B: Bridge> {
    interop: WeakInterop<B>,
}

impl<B: Bridge> HostHooks<B::Handle> for Hooks<B> {
    fn report_error(&self, message: &str, index: CallIndex) {
        if let Some(interop) = self.interop.upgrade() {
            interop.report_error(message, index);
        }
    }

    fn invoke_callback(&self, id: CallbackId, args: Vec<BridgeValue<B::Handle>>) {
        if let Some(interop) = self.interop.upgrade() {
            interop.invoke_callback(id, args);
        }
    }
}

/// Replaces `$N` placeholders with `args[N]`.
///
/// Indices are handled from the highest down and every replaced span is
/// claimed, so `$1` can never match inside `$10`. Inserted text is not
/// scanned again.
pub fn substitute(template: &str, args: &[String]) -> String {
    let mut claimed: Vec<(usize, usize, usize)> = Vec::new();
    for i in (0..args.len()).rev() {
        let needle = format!("${i}");
        for (start, _) in template.match_indices(&needle) {
            let end = start + needle.len();
            if claimed.iter().any(|&(s, e, _)| start < e && s < end) {
                continue;
            }
            claimed.push((start, end, i));
        }
    }
    claimed.sort_unstable_by_key(|&(s, _, _)| s);

    let mut out = String::with_capacity(template.len());
    let mut at = 0;
    for (start, end, i) in claimed {
        out.push_str(&template[at..start]);
        out.push_str(&args[i]);
        at = end;
    }
    out.push_str(&template[at..]);
    out
}
