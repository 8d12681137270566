//! # Interop
//!
//! Everything that crosses the boundary to the rendering surface goes
//! through here.
//!
//! - [`Interop`] marshals a template with `$N` placeholders and its
//!   arguments into one call, records it in the [`CallLedger`], and submits
//!   it synchronously, batched ([`CallFlags::ASYNC`]) or without disturbing
//!   the pending batch ([`CallFlags::NO_IMPACT`]).
//! - Surface objects are only ever referred to by ID ([`JsRef`], backed by
//!   the [`ReferenceTable`]); host closures by callback ID.
//! - [`ResourceLoader`] loads scripts and stylesheets once per url.
//! - [`RenderSurface`] is the narrow capability layout and animation code
//!   uses; [`ScriptSurface`] implements it over any [`Bridge`].
//! - [`HeadlessBridge`] records calls instead of evaluating them.
//!
//! ```rust
//! use std::rc::Rc;
//! use trellis_interop::*;
//!
//! let interop = Interop::new(HeadlessBridge::new(), Rc::new(InteropContext::default()));
//! interop.execute_void("foo($0,$1)", &["null-like".into(), 10.into()]).unwrap();
//! assert_eq!(interop.bridge().sources(), vec![r#"foo("null-like",10)"#]);
//! ```

pub mod bridge;
pub mod callback;
pub mod headless;
pub mod ledger;
pub mod loader;
pub mod marshal;
pub mod refs;
pub mod surface;
pub mod value;
mod tests;

pub use bridge::{BOOTSTRAP_JS, Bridge, BridgeFault, HostHooks, Submission};
pub use callback::{Callback, CallbackId, CallbackRegistry};
pub use headless::{HeadlessBridge, ScriptRecord, SubmitMode};
pub use ledger::{CallIndex, CallLedger};
pub use loader::{LoadStatus, ResourceLoader, normalize_url};
pub use marshal::{
    CallFlags, DEFAULT_BATCH_LIMIT, Interop, InteropContext, WeakInterop, substitute,
};
pub use refs::{JsRef, RefId, ReferenceTable};
pub use surface::{
    AnimatedProperty, CssValue, NativeAnimation, RenderSurface, ScriptSurface, parse_natural_size,
};
pub use value::{Arg, BridgeValue, Value, encode_number, encode_string};
