use std::collections::HashMap;

use smallvec::{SmallVec, smallvec};
use trellis_core::{AnimationValue, px};
use trellis_interop::CssValue;

/// A style property that mirrors an animated property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssEquivalent {
    pub name: &'static str,
    /// Lengths are written with a `px` suffix.
    pub px: bool,
}

impl CssEquivalent {
    pub const fn number(name: &'static str) -> Self {
        Self { name, px: false }
    }

    pub const fn length(name: &'static str) -> Self {
        Self { name, px: true }
    }

    /// Colors become `#rrggbb`, except on `...Alpha` properties which take the
    /// alpha channel as a fraction.
    pub fn to_css(&self, value: AnimationValue) -> CssValue {
        match value {
            AnimationValue::Double(v) if self.px => CssValue::Text(px(v)),
            AnimationValue::Double(v) => CssValue::Number(v),
            AnimationValue::Color(c) if self.name.ends_with("Alpha") => {
                CssValue::Number(c.alpha_fraction())
            }
            AnimationValue::Color(c) => CssValue::Text(c.to_css_hex()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CssEquivalence {
    #[default]
    NoEquivalent,
    Single(CssEquivalent),
    Multiple(Vec<CssEquivalent>),
}

impl CssEquivalence {
    pub fn targets(&self) -> SmallVec<[&CssEquivalent; 2]> {
        match self {
            CssEquivalence::NoEquivalent => SmallVec::new(),
            CssEquivalence::Single(e) => smallvec![e],
            CssEquivalence::Multiple(list) => list.iter().collect(),
        }
    }
}

/// How an animated property maps onto the surface's styles.
pub trait PropertyMetadata {
    fn css_equivalence(&self, property: &str) -> CssEquivalence;
}

#[derive(Clone, Debug)]
pub struct MetadataTable {
    entries: HashMap<String, CssEquivalence>,
}

impl MetadataTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Properties every framework element animates natively.
    pub fn standard() -> Self {
        Self::empty()
            .with("Opacity", CssEquivalence::Single(CssEquivalent::number("opacity")))
            .with("Width", CssEquivalence::Single(CssEquivalent::length("width")))
            .with("Height", CssEquivalence::Single(CssEquivalent::length("height")))
            .with("Canvas.Left", CssEquivalence::Single(CssEquivalent::length("left")))
            .with("Canvas.Top", CssEquivalence::Single(CssEquivalent::length("top")))
            .with(
                "Background",
                CssEquivalence::Multiple(vec![
                    CssEquivalent::number("backgroundColor"),
                    CssEquivalent::number("backgroundColorAlpha"),
                ]),
            )
            .with(
                "Foreground",
                CssEquivalence::Multiple(vec![
                    CssEquivalent::number("color"),
                    CssEquivalent::number("colorAlpha"),
                ]),
            )
    }

    pub fn with(mut self, property: impl Into<String>, equivalence: CssEquivalence) -> Self {
        self.entries.insert(property.into(), equivalence);
        self
    }
}

impl Default for MetadataTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PropertyMetadata for MetadataTable {
    fn css_equivalence(&self, property: &str) -> CssEquivalence {
        self.entries.get(property).cloned().unwrap_or_default()
    }
}
