use std::fmt;

use crate::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Spring {
        damping: f32,
        stiffness: f32,
    },
}

impl Easing {
    /// Easing as understood by the surface's native animation primitive.
    ///
    /// Named curves become a string, springs become a `[tension, friction]`
    /// pair literal.
    pub fn descriptor(&self) -> EasingDescriptor {
        match self {
            Easing::Linear => EasingDescriptor::Named("linear"),
            Easing::EaseIn => EasingDescriptor::Named("easeInQuad"),
            Easing::EaseOut => EasingDescriptor::Named("easeOutQuad"),
            Easing::EaseInOut => EasingDescriptor::Named("easeInOutQuad"),
            Easing::Spring { damping, stiffness } => EasingDescriptor::Spring {
                tension: *stiffness as f64,
                friction: *damping as f64,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EasingDescriptor {
    Named(&'static str),
    Spring { tension: f64, friction: f64 },
}

/// Value carried by a key frame and written to the property store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationValue {
    Double(f64),
    Color(Color),
}

impl AnimationValue {
    /// Distance between two values of the same kind; mixed kinds are 0.
    pub fn distance(&self, other: &AnimationValue) -> f64 {
        match (self, other) {
            (AnimationValue::Double(a), AnimationValue::Double(b)) => (a - b).abs(),
            (AnimationValue::Color(a), AnimationValue::Color(b)) => a.distance(*b),
            _ => 0.0,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnimationValue::Double(v) => Some(*v),
            AnimationValue::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AnimationValue::Color(c) => Some(*c),
            AnimationValue::Double(_) => None,
        }
    }
}

impl From<f64> for AnimationValue {
    fn from(v: f64) -> Self {
        AnimationValue::Double(v)
    }
}

impl From<Color> for AnimationValue {
    fn from(c: Color) -> Self {
        AnimationValue::Color(c)
    }
}

impl fmt::Display for AnimationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationValue::Double(v) => write!(f, "{v}"),
            AnimationValue::Color(c) => write!(f, "{}", c.to_css_hex()),
        }
    }
}
