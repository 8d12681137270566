#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };
    pub const INFINITE: Size = Size {
        width: f64::INFINITY,
        height: f64::INFINITY,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }

    /// Negative or NaN dimensions become zero; infinities are kept.
    pub fn clamp_non_negative(self) -> Self {
        fn fix(v: f64) -> f64 {
            if v.is_nan() || v < 0.0 { 0.0 } else { v }
        }
        Self {
            width: fix(self.width),
            height: fix(self.height),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: size.width,
            h: size.height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }
}

/// Formats a length the way the surface expects it: invariant decimal, `px` suffix.
pub fn px(v: f64) -> String {
    format!("{}px", v)
}
