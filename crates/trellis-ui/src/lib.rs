//! Visual tree, layout and animation.
//!
//! Layout is the usual two passes. `measure(node, available)` produces a
//! desired size bottom-up, `arrange(node, rect)` hands every node its final
//! slot top-down. Nodes live in a [`VisualTree`] arena and render through a
//! [`RenderSurface`](trellis_interop::RenderSurface).
//!
//! Animations are runs of resolved key frames, one per (target, property),
//! driven by an [`Animator`]. A frame goes to the surface's native animator
//! when the property has a style equivalent and the target is rendered;
//! otherwise it is applied at once. Completions carry their run id, so a
//! completion from a superseded run does nothing.

pub mod animator;
pub mod image;
pub mod keyframes;
pub mod metadata;
pub mod stack;
pub mod stretch;
pub mod tree;

pub use animator::{
    AnimationTarget, Animator, DoubleAnimation, KeyFrameAnimation, RunId, RunInfo, RunOutcome,
    Timeline,
};
pub use image::{Image, ImageEvents};
pub use keyframes::{KeyFrame, KeyTime, ResolvedFrame, resolve_key_frames, total_duration};
pub use metadata::{CssEquivalence, CssEquivalent, MetadataTable, PropertyMetadata};
pub use stack::{Orientation, StackPanel};
pub use stretch::{ScaleFactor, Stretch, StretchDirection, compute_scale_factor};
pub use tree::{FlowDirection, Node, NodeId, NodeKind, VisualTree};
