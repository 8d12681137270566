use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use trellis_core::{Result, Size};
use trellis_interop::{JsRef, RenderSurface};

use crate::{NodeId, NodeKind, Stretch, StretchDirection, VisualTree, compute_scale_factor};

#[derive(Clone, Debug, Default)]
pub struct Image {
    pub source: Option<String>,
    pub stretch: Stretch,
    pub stretch_direction: StretchDirection,
    pub events: ImageEvents,
}

type ImageHandler = Rc<dyn Fn()>;

#[derive(Default)]
struct ImageHandlers {
    opened: Vec<ImageHandler>,
    failed: Vec<ImageHandler>,
}

/// Listeners for the outcome of an image load. Clones share the lists, so
/// handlers added after the element exists still fire.
#[derive(Clone, Default)]
pub struct ImageEvents(Rc<RefCell<ImageHandlers>>);

impl ImageEvents {
    pub fn on_opened(&self, handler: impl Fn() + 'static) {
        self.0.borrow_mut().opened.push(Rc::new(handler));
    }

    pub fn on_failed(&self, handler: impl Fn() + 'static) {
        self.0.borrow_mut().failed.push(Rc::new(handler));
    }

    fn opened(&self) {
        let handlers = self.0.borrow().opened.clone();
        for h in handlers {
            h();
        }
    }

    fn failed(&self) {
        let handlers = self.0.borrow().failed.clone();
        for h in handlers {
            h();
        }
    }
}

impl fmt::Debug for ImageEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0.borrow();
        f.debug_struct("ImageEvents")
            .field("opened", &h.opened.len())
            .field("failed", &h.failed.len())
            .finish()
    }
}

impl Image {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }
}

impl<S: RenderSurface> VisualTree<S> {
    fn image_of(&self, id: NodeId) -> Result<(Image, Option<JsRef>)> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Image(img) => Ok((img.clone(), node.element)),
            _ => Err(trellis_core::Error::UnknownNode),
        }
    }

    /// Natural size scaled into `input`. Used for both passes.
    pub(crate) fn measure_image(&mut self, id: NodeId, input: Size) -> Result<Size> {
        let (image, element) = self.image_of(id)?;
        if image.source.is_none() {
            return Ok(Size::ZERO);
        }
        let Some(element) = element else {
            log::debug!("image {id:?} measured before it has an element");
            return Ok(Size::ZERO);
        };
        let natural = self.surface.natural_size(&element)?;
        let scale = compute_scale_factor(input, natural, image.stretch, image.stretch_direction);
        Ok(scale.apply(natural))
    }

    fn image_events(&self, id: NodeId) -> Result<ImageEvents> {
        Ok(self.image_of(id)?.0.events)
    }

    /// `handler` runs each time the source finished loading.
    pub fn on_image_opened(&self, id: NodeId, handler: impl Fn() + 'static) -> Result<()> {
        self.image_events(id)?.on_opened(handler);
        Ok(())
    }

    /// `handler` runs each time the source could not be loaded or decoded.
    pub fn on_image_failed(&self, id: NodeId, handler: impl Fn() + 'static) -> Result<()> {
        self.image_events(id)?.on_failed(handler);
        Ok(())
    }

    pub(crate) fn attach_image(&mut self, id: NodeId, parent: &JsRef) -> Result<JsRef> {
        let (image, _) = self.image_of(id)?;
        let el = self.surface.create_element("img", Some(parent))?;
        if let Some(src) = &image.source {
            self.surface.set_attribute(&el, "src", src)?;
        }
        self.write_stretch(&el, image.stretch)?;

        // The natural size is only known once the bitmap arrived.
        let dirty = self.dirty.clone();
        let events = image.events.clone();
        let on_load = self.surface.bind_event(
            &el,
            "load",
            Rc::new(move || {
                dirty.set(true);
                events.opened();
            }),
        )?;
        let events = image.events;
        let on_error = self
            .surface
            .bind_event(&el, "error", Rc::new(move || events.failed()))?;
        self.node_mut(id)?.events.extend([on_load, on_error]);
        Ok(el)
    }

    pub fn set_stretch(&mut self, id: NodeId, stretch: Stretch) -> Result<()> {
        let element = {
            let node = self.node_mut(id)?;
            let NodeKind::Image(img) = &mut node.kind else {
                return Err(trellis_core::Error::UnknownNode);
            };
            img.stretch = stretch;
            node.element
        };
        if let Some(el) = element {
            self.write_stretch(&el, stretch)?;
        }
        self.invalidate();
        Ok(())
    }

    pub fn set_stretch_direction(&mut self, id: NodeId, direction: StretchDirection) -> Result<()> {
        let NodeKind::Image(img) = &mut self.node_mut(id)?.kind else {
            return Err(trellis_core::Error::UnknownNode);
        };
        img.stretch_direction = direction;
        self.invalidate();
        Ok(())
    }

    pub fn set_source(&mut self, id: NodeId, source: Option<String>) -> Result<()> {
        let element = {
            let node = self.node_mut(id)?;
            let NodeKind::Image(img) = &mut node.kind else {
                return Err(trellis_core::Error::UnknownNode);
            };
            img.source = source.clone();
            node.element
        };
        if let Some(el) = element {
            self.surface
                .set_attribute(&el, "src", source.as_deref().unwrap_or(""))?;
        }
        self.invalidate();
        Ok(())
    }

    fn write_stretch(&self, el: &JsRef, stretch: Stretch) -> Result<()> {
        let (fit, position) = stretch.object_fit();
        self.surface.set_style(el, "objectFit", fit)?;
        self.surface.set_style(el, "objectPosition", position)
    }
}
