use std::cell::Cell;
use std::rc::Rc;

use slotmap::{Key, SlotMap, new_key_type};
use smallvec::SmallVec;
use trellis_core::{Dispose, Error, Rect, Result, Size, px};
use trellis_interop::{JsRef, RenderSurface};

use crate::{AnimationTarget, Image, Orientation, StackPanel};

new_key_type! {
    pub struct NodeId;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    StackPanel(StackPanel),
    Image(Image),
    /// Leaf with an explicit size.
    Fixed(Size),
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::StackPanel(_) => "StackPanel",
            NodeKind::Image(_) => "Image",
            NodeKind::Fixed(_) => "Fixed",
            NodeKind::Line { .. } => "Line",
        }
    }

    /// Desired size of kinds that do not depend on the surface.
    fn leaf_size(&self) -> Option<Size> {
        match self {
            NodeKind::Fixed(size) => Some(*size),
            NodeKind::Line { x1, y1, x2, y2 } => {
                Some(Size::new(x1.max(*x2).max(0.0), y1.max(*y2).max(0.0)))
            }
            NodeKind::StackPanel(_) | NodeKind::Image(_) => None,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            NodeKind::StackPanel(_) | NodeKind::Fixed(_) => "div",
            NodeKind::Image(_) => "img",
            NodeKind::Line { .. } => "svg",
        }
    }
}

pub struct Node {
    pub kind: NodeKind,
    pub flow: FlowDirection,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    /// Result of the last measure.
    pub desired: Size,
    /// Slot from the last arrange, relative to the parent.
    pub rect: Rect,
    measured_with: Option<Size>,
    /// Outermost element of the node.
    pub(crate) element: Option<JsRef>,
    /// Where child wrappers go (panels only).
    container: Option<JsRef>,
    pub(crate) events: Vec<Dispose>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            flow: FlowDirection::default(),
            parent: None,
            children: SmallVec::new(),
            desired: Size::ZERO,
            rect: Rect::default(),
            measured_with: None,
            element: None,
            container: None,
            events: Vec::new(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.element.is_some()
    }

    pub fn element(&self) -> Option<JsRef> {
        self.element
    }
}

/// Arena of visual nodes plus the surface they render to.
pub struct VisualTree<S: RenderSurface> {
    pub(crate) surface: S,
    nodes: SlotMap<NodeId, Node>,
    pub(crate) dirty: Rc<Cell<bool>>,
}

impl<S: RenderSurface> VisualTree<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            nodes: SlotMap::with_key(),
            dirty: Rc::new(Cell::new(true)),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        self.invalidate();
        self.nodes.insert(Node::new(kind))
    }

    pub fn stack(&mut self, orientation: Orientation) -> NodeId {
        self.add(NodeKind::StackPanel(StackPanel::new(orientation)))
    }

    pub fn image(&mut self, source: impl Into<String>) -> NodeId {
        self.add(NodeKind::Image(Image::new(source)))
    }

    pub fn fixed(&mut self, size: Size) -> NodeId {
        self.add(NodeKind::Fixed(size))
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> NodeId {
        self.add(NodeKind::Line { x1, y1, x2, y2 })
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::UnknownNode)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::UnknownNode)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn desired_size(&self, id: NodeId) -> Result<Size> {
        Ok(self.node(id)?.desired)
    }

    pub fn rect(&self, id: NodeId) -> Result<Rect> {
        Ok(self.node(id)?.rect)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    /// What the animation engine needs to drive a property of `id`.
    pub fn animation_target(&self, id: NodeId) -> Result<AnimationTarget> {
        Ok(AnimationTarget {
            key: id.data().as_ffi(),
            element: self.node(id)?.element,
        })
    }

    /// Appends `child` to the panel `parent`, building its elements when the
    /// panel is already on the surface.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let orientation = match &self.node(parent)?.kind {
            NodeKind::StackPanel(panel) => panel.orientation,
            other => {
                return Err(Error::Unsupported(format!(
                    "{} cannot host children",
                    other.name()
                )));
            }
        };
        if self.node(child)?.parent.is_some() {
            return Err(Error::Unsupported("node already has a parent".into()));
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);

        if let Some(container) = self.node(parent)?.container {
            let wrapper = self.child_wrapper(orientation, &container)?;
            self.attach(child, &wrapper)?;
        }
        self.invalidate();
        Ok(())
    }

    pub fn set_orientation(&mut self, id: NodeId, orientation: Orientation) -> Result<()> {
        let NodeKind::StackPanel(panel) = &mut self.node_mut(id)?.kind else {
            return Err(Error::UnknownNode);
        };
        if let Some(rendered) = panel.rendered
            && rendered != orientation
        {
            return Err(Error::Unsupported(
                "changing the orientation of a StackPanel that is already rendered".into(),
            ));
        }
        panel.orientation = orientation;
        self.invalidate();
        Ok(())
    }

    pub fn set_flow_direction(&mut self, id: NodeId, flow: FlowDirection) -> Result<()> {
        self.node_mut(id)?.flow = flow;
        self.invalidate();
        Ok(())
    }

    /// Builds the elements of `root` and its subtree under `host`.
    pub fn attach_root(&mut self, root: NodeId, host: &JsRef) -> Result<()> {
        self.attach(root, host)?;
        self.invalidate();
        Ok(())
    }

    fn attach(&mut self, id: NodeId, parent: &JsRef) -> Result<()> {
        if self.node(id)?.is_attached() {
            return Ok(());
        }
        let kind = self.node(id)?.kind.clone();
        match kind {
            NodeKind::StackPanel(panel) => {
                let (outer, container) = self.attach_stack(id, parent)?;
                let node = self.node_mut(id)?;
                node.element = Some(outer);
                node.container = Some(container);
                let children = node.children.to_vec();
                for child in children {
                    let wrapper = self.child_wrapper(panel.orientation, &container)?;
                    self.attach(child, &wrapper)?;
                }
            }
            NodeKind::Image(_) => {
                let el = self.attach_image(id, parent)?;
                self.node_mut(id)?.element = Some(el);
            }
            other => {
                let el = self.surface.create_element(other.tag(), Some(parent))?;
                self.node_mut(id)?.element = Some(el);
            }
        }
        log::trace!("attached {id:?}");
        Ok(())
    }

    /// Unbinds surface events of `id` and its subtree. Elements stay.
    pub fn release_events(&mut self, id: NodeId) -> Result<()> {
        let (events, children) = {
            let node = self.node_mut(id)?;
            (std::mem::take(&mut node.events), node.children.to_vec())
        };
        for e in events {
            e.run();
        }
        for child in children {
            self.release_events(child)?;
        }
        Ok(())
    }

    pub fn measure(&mut self, id: NodeId, available: Size) -> Result<Size> {
        let available = available.clamp_non_negative();
        let (name, is_stack, leaf) = {
            let kind = &self.node(id)?.kind;
            (kind.name(), matches!(kind, NodeKind::StackPanel(_)), kind.leaf_size())
        };
        let desired = match leaf {
            Some(size) => size,
            None if is_stack => self.measure_stack(id, available)?,
            None => self.measure_image(id, available)?,
        };
        if !desired.is_finite() {
            return Err(Error::NonFiniteDesiredSize {
                node: name,
                width: desired.width,
                height: desired.height,
            });
        }
        let desired = desired.clamp_non_negative();
        let node = self.node_mut(id)?;
        node.desired = desired;
        node.measured_with = Some(available);
        Ok(desired)
    }

    pub fn arrange(&mut self, id: NodeId, rect: Rect) -> Result<Size> {
        if self.node(id)?.measured_with.is_none() {
            self.measure(id, rect.size())?;
        }
        let size = rect.size().clamp_non_negative();
        let (is_stack, is_image) = {
            let kind = &self.node(id)?.kind;
            (
                matches!(kind, NodeKind::StackPanel(_)),
                matches!(kind, NodeKind::Image(_)),
            )
        };
        let actual = if is_stack {
            self.arrange_stack(id, size)?
        } else if is_image {
            self.measure_image(id, size)?
        } else {
            size
        };

        let node = self.node_mut(id)?;
        node.rect = rect;
        if let Some(el) = node.element {
            self.surface.set_style(&el, "width", &px(rect.w))?;
            self.surface.set_style(&el, "height", &px(rect.h))?;
        }
        Ok(actual)
    }

    /// Runs both passes over `root` if anything changed since the last run.
    pub fn update_layout(&mut self, root: NodeId, viewport: Size) -> Result<bool> {
        if !self.dirty.get() {
            return Ok(false);
        }
        self.dirty.set(false);
        let passes = self
            .measure(root, viewport)
            .and_then(|_| self.arrange(root, Rect::from_size(viewport)));
        if let Err(e) = passes {
            // Retried on the next run.
            self.dirty.set(true);
            return Err(e);
        }
        self.surface.flush();
        Ok(true)
    }
}
