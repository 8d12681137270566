//! # Core types
//!
//! Everything the interop, layout and animation layers share:
//!
//! - `Size` and `Rect` in device-independent pixels (`f64`).
//! - `Color` and `AnimationValue`, the values animations write.
//! - `Easing`, with the descriptor the surface's native animator understands.
//! - `PropertyStore`, the get/set + change-notification capability the
//!   animation engine consumes, and `PropertyBag`, an in-memory store.
//! - `Dispose`, a run-once cleanup handle (event unbinding and the like).
//! - `Error`, the crate-wide error type.
//!
//! ```rust
//! use trellis_core::*;
//!
//! let bag = PropertyBag::new();
//! bag.set(1, "Opacity", AnimationValue::Double(0.5));
//! assert_eq!(bag.get(1, "Opacity"), Some(AnimationValue::Double(0.5)));
//! ```

pub mod animation;
pub mod color;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod prelude;
pub mod property;

pub use animation::*;
pub use color::*;
pub use effects::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use property::*;
