use trellis_core::{Rect, Result, Size};
use trellis_interop::{JsRef, RenderSurface};

use crate::{FlowDirection, NodeId, NodeKind, VisualTree};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl Orientation {
    /// `(main, cross)` lengths of `size`.
    pub fn split(self, size: Size) -> (f64, f64) {
        match self {
            Orientation::Horizontal => (size.width, size.height),
            Orientation::Vertical => (size.height, size.width),
        }
    }

    pub fn join(self, main: f64, cross: f64) -> Size {
        match self {
            Orientation::Horizontal => Size::new(main, cross),
            Orientation::Vertical => Size::new(cross, main),
        }
    }

    fn rect(self, main_start: f64, main: f64, cross: f64) -> Rect {
        match self {
            Orientation::Horizontal => Rect::new(main_start, 0.0, main, cross),
            Orientation::Vertical => Rect::new(0.0, main_start, cross, main),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StackPanel {
    pub orientation: Orientation,
    /// Orientation the surface elements were built for, once attached.
    pub(crate) rendered: Option<Orientation>,
}

impl StackPanel {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            rendered: None,
        }
    }
}

impl<S: RenderSurface> VisualTree<S> {
    fn stack_of(&self, id: NodeId) -> Result<(Orientation, Vec<NodeId>)> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::StackPanel(panel) => Ok((panel.orientation, node.children.to_vec())),
            _ => Err(trellis_core::Error::UnknownNode),
        }
    }

    /// Children get unbounded main length and the panel's cross length.
    pub(crate) fn measure_stack(&mut self, id: NodeId, available: Size) -> Result<Size> {
        let (orientation, children) = self.stack_of(id)?;
        let (_, available_cross) = orientation.split(available);
        let slot = orientation.join(f64::INFINITY, available_cross);

        let mut main = 0.0;
        let mut cross: f64 = 0.0;
        for child in children {
            let desired = self.measure(child, slot)?;
            let (m, c) = orientation.split(desired);
            main += m;
            cross = cross.max(c);
        }
        Ok(orientation.join(main, cross))
    }

    pub(crate) fn arrange_stack(&mut self, id: NodeId, final_size: Size) -> Result<Size> {
        let (orientation, children) = self.stack_of(id)?;
        let flow = self.node(id)?.flow;
        let (final_main, panel_cross) = orientation.split(final_size);

        // The cross length is fixed now; children may size differently.
        let slot = orientation.join(f64::INFINITY, panel_cross);
        let mut panel_main = 0.0;
        for &child in &children {
            let (m, _) = orientation.split(self.measure(child, slot)?);
            panel_main += m;
        }

        let mut consumed = 0.0;
        for child in children {
            let (child_main, _) = orientation.split(self.node(child)?.desired);
            let start = match flow {
                FlowDirection::LeftToRight => consumed,
                FlowDirection::RightToLeft => panel_main - consumed - child_main,
            };
            self.arrange(child, orientation.rect(start, child_main, panel_cross))?;
            consumed += child_main;
        }

        Ok(orientation.join(final_main, panel_cross))
    }

    /// Builds the panel's elements under `parent`; returns `(outer, container)`.
    pub(crate) fn attach_stack(
        &mut self,
        id: NodeId,
        parent: &JsRef,
    ) -> Result<(JsRef, JsRef)> {
        let (orientation, _) = self.stack_of(id)?;
        let outer = self.surface.create_element("div", Some(parent))?;
        let container = match orientation {
            Orientation::Horizontal => {
                self.surface.set_style(&outer, "display", "table")?;
                let inner = self.surface.create_element("div", Some(&outer))?;
                self.surface.set_style(&inner, "display", "table")?;
                self.surface.set_style(&inner, "height", "100%")?;
                inner
            }
            Orientation::Vertical => outer,
        };
        if let NodeKind::StackPanel(panel) = &mut self.node_mut(id)?.kind {
            panel.rendered = Some(orientation);
        }
        Ok((outer, container))
    }

    /// Cell that hosts one child of an attached panel.
    pub(crate) fn child_wrapper(&self, orientation: Orientation, container: &JsRef) -> Result<JsRef> {
        let wrapper = self.surface.create_element("div", Some(container))?;
        match orientation {
            Orientation::Horizontal => {
                self.surface.set_style(&wrapper, "position", "relative")?;
                self.surface.set_style(&wrapper, "display", "table-cell")?;
                self.surface.set_style(&wrapper, "height", "100%")?;
                self.surface.set_style(&wrapper, "verticalAlign", "middle")?;
            }
            Orientation::Vertical => {
                self.surface.set_style(&wrapper, "width", "100%")?;
            }
        }
        Ok(wrapper)
    }
}
