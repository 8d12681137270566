use trellis_core::Size;

/// How content is scaled to fill its layout slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stretch {
    /// Natural size.
    None,
    /// Fills the slot, aspect ratio is lost.
    Fill,
    /// Largest size that fits while keeping the aspect ratio.
    #[default]
    Uniform,
    /// Smallest size that covers the slot while keeping the aspect ratio.
    UniformToFill,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StretchDirection {
    /// Only scale up.
    UpOnly,
    /// Only scale down.
    DownOnly,
    #[default]
    Both,
}

impl Stretch {
    /// `(objectFit, objectPosition)` styles that render this mode.
    pub fn object_fit(self) -> (&'static str, &'static str) {
        match self {
            Stretch::None => ("none", "left top"),
            Stretch::Fill => ("fill", "center center"),
            Stretch::Uniform => ("contain", "center center"),
            Stretch::UniformToFill => ("cover", "left top"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactor {
    pub const ONE: ScaleFactor = ScaleFactor { x: 1.0, y: 1.0 };

    pub fn apply(self, size: Size) -> Size {
        Size::new(size.width * self.x, size.height * self.y)
    }
}

/// Scale to apply to `natural` so it sits in `available` under `stretch`.
///
/// An unbounded axis takes the other axis' factor; with both unbounded the
/// content keeps its natural size. A zero natural dimension scales by 0.
pub fn compute_scale_factor(
    available: Size,
    natural: Size,
    stretch: Stretch,
    direction: StretchDirection,
) -> ScaleFactor {
    let bounded_w = available.width.is_finite();
    let bounded_h = available.height.is_finite();

    if stretch == Stretch::None || (!bounded_w && !bounded_h) {
        return ScaleFactor::ONE;
    }

    let ratio = |avail: f64, nat: f64| if nat == 0.0 { 0.0 } else { avail / nat };
    let mut x = ratio(available.width, natural.width);
    let mut y = ratio(available.height, natural.height);

    if !bounded_w {
        x = y;
    } else if !bounded_h {
        y = x;
    } else {
        match stretch {
            Stretch::Uniform => {
                let m = x.min(y);
                x = m;
                y = m;
            }
            Stretch::UniformToFill => {
                let m = x.max(y);
                x = m;
                y = m;
            }
            Stretch::Fill | Stretch::None => {}
        }
    }

    match direction {
        StretchDirection::UpOnly => {
            x = x.max(1.0);
            y = y.max(1.0);
        }
        StretchDirection::DownOnly => {
            x = x.min(1.0);
            y = y.min(1.0);
        }
        StretchDirection::Both => {}
    }

    ScaleFactor { x, y }
}
