pub use crate::animation::{AnimationValue, Easing, EasingDescriptor};
pub use crate::color::Color;
pub use crate::effects::Dispose;
pub use crate::error::{Error, Result};
pub use crate::geometry::{Rect, Size, px};
pub use crate::property::{PropertyBag, PropertyStore, TargetKey};
