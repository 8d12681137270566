use std::rc::Rc;

use smallvec::SmallVec;

use crate::{BridgeValue, CallIndex, CallbackId, RefId};

/// Surface-side runtime every wrapped call depends on.
///
/// `callSafe` evaluates a call, stores a handle-like result under the
/// reserved reference id, and routes an exception back through
/// `trellisHost.reportError` together with the call's ledger index.
pub const BOOTSTRAP_JS: &str = r#"(function (t) {
  t.refs = t.refs || {};
  t.proxies = t.proxies || {};
  t.callback = function (id) {
    var p = t.proxies[id];
    if (!p) {
      p = function (arg) { return window.trellisHost.invoke(id, arg); };
      t.proxies[id] = p;
    }
    return p;
  };
  t.callSafe = function (refId, src, index) {
    try {
      var result = eval(src);
      var kind = typeof result;
      if (refId !== null && result !== null && (kind === 'object' || kind === 'function')) {
        t.refs[refId] = result;
      }
      return result;
    } catch (e) {
      window.trellisHost.reportError(String(e), index);
    }
  };
})(window.trellis = window.trellis || {});"#;

/// A marshalled call on its way to the surface.
#[derive(Clone, Debug)]
pub struct Submission {
    pub index: CallIndex,
    /// Reserved for the result of a synchronous call.
    pub ref_id: Option<RefId>,
    /// Template with every placeholder substituted.
    pub source: String,
    /// `source` wrapped in `trellis.callSafe(...)`.
    pub wrapped: String,
    pub callbacks: SmallVec<[CallbackId; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeFault {
    pub message: String,
}

impl BridgeFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Entry points the surface calls back into.
pub trait HostHooks<H> {
    fn report_error(&self, message: &str, index: CallIndex);
    fn invoke_callback(&self, id: CallbackId, args: Vec<BridgeValue<H>>);
}

/// Backend that actually evaluates calls. One per process, picked at startup.
pub trait Bridge: 'static {
    /// Opaque handle to a surface object.
    type Handle: Clone + 'static;

    /// Runs [`BOOTSTRAP_JS`] (or an equivalent) and wires the host hooks.
    /// Called again after a reload.
    fn install(&self, hooks: Rc<dyn HostHooks<Self::Handle>>);

    /// Evaluates one call and blocks for its result.
    ///
    /// `no_impact` calls must not disturb batches the surface may still be
    /// processing.
    fn eval(
        &self,
        call: &Submission,
        no_impact: bool,
    ) -> Result<BridgeValue<Self::Handle>, BridgeFault>;

    /// Evaluates queued asynchronous calls, in order. Failures come back
    /// through [`HostHooks::report_error`].
    fn eval_batch(&self, calls: &[Submission]);

    /// Stores `handle` as `trellis.refs[id]` on the surface. Used for handles
    /// that reach the host without a reserved id, such as proxy arguments.
    fn bind_handle(&self, id: RefId, handle: &Self::Handle);
}

pub(crate) fn wrap(ref_id: Option<RefId>, source: &str, index: CallIndex) -> String {
    let ref_id = match ref_id {
        Some(id) => id.to_string(),
        None => "null".to_string(),
    };
    format!(
        "trellis.callSafe({ref_id}, {}, {index})",
        crate::encode_string(source)
    )
}
