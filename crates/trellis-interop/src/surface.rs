use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::{Dispose, EasingDescriptor, Error, Result, Size};

use crate::{Arg, Bridge, CallFlags, Interop, JsRef, Value, encode_number};

/// A value written to a style property by a native animation.
#[derive(Clone, Debug, PartialEq)]
pub enum CssValue {
    Number(f64),
    Text(String),
}

impl CssValue {
    fn to_arg(&self) -> Arg {
        match self {
            CssValue::Number(n) => Arg::Number(*n),
            CssValue::Text(s) => Arg::Str(s.clone()),
        }
    }
}

impl std::fmt::Display for CssValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CssValue::Number(n) => write!(f, "{}", encode_number(*n)),
            CssValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedProperty {
    pub name: String,
    pub to: CssValue,
    /// Start value to force-feed; the surface's current value otherwise.
    pub from: Option<CssValue>,
}

/// One request to the surface's native animator.
pub struct NativeAnimation {
    pub element: JsRef,
    /// Milliseconds.
    pub duration: f64,
    pub easing: EasingDescriptor,
    /// Queue name; stopping the group halts everything queued under it.
    pub group: String,
    pub properties: Vec<AnimatedProperty>,
    pub on_complete: Option<Box<dyn FnOnce()>>,
}

/// The capability the layout and animation engines draw on.
pub trait RenderSurface {
    /// Creates an element, appended to `parent` when given.
    fn create_element(&self, tag: &str, parent: Option<&JsRef>) -> Result<JsRef>;
    fn element_by_id(&self, id: &str) -> Result<Option<JsRef>>;
    fn append_child(&self, parent: &JsRef, child: &JsRef) -> Result<()>;
    fn set_style(&self, element: &JsRef, name: &str, value: &str) -> Result<()>;
    fn set_attribute(&self, element: &JsRef, name: &str, value: &str) -> Result<()>;
    /// Intrinsic size of the element's content, by synchronous round-trip.
    fn natural_size(&self, element: &JsRef) -> Result<Size>;
    /// `handler` runs on every `event`; disposing unbinds it.
    fn bind_event(&self, element: &JsRef, event: &str, handler: Rc<dyn Fn()>) -> Result<Dispose>;
    fn run_animation(&self, animation: NativeAnimation) -> Result<()>;
    fn stop_animation(&self, element: &JsRef, group: &str) -> Result<()>;
    /// Pushes out anything the surface has queued.
    fn flush(&self);
}

const CREATE_ELEMENT: &str = "(function (tag, parent) { var el = document.createElement(tag); if (parent) { parent.appendChild(el); } return el; })($0, $1)";
const ELEMENT_BY_ID: &str = "document.getElementById($0)";
const APPEND_CHILD: &str = "$0.appendChild($1);";
const SET_STYLE: &str = "$0.style[$1] = $2;";
const SET_ATTRIBUTE: &str = "$0.setAttribute($1, $2);";
const NATURAL_SIZE: &str =
    "(function (img) { return img.naturalWidth + '|' + img.naturalHeight; })($0)";
const ADD_LISTENER: &str = "$0.addEventListener($1, $2);";
const REMOVE_LISTENER: &str = "$0.removeEventListener($1, $2);";
const RUN_ANIMATION: &str = "Velocity($0, $1, { duration: $2, easing: $3, queue: $4, complete: $5 }); Velocity.Utilities.dequeue($0, $4);";
const STOP_ANIMATION: &str = "Velocity($0, \"stop\", $1);";

/// [`RenderSurface`] that drives a DOM through marshalled calls.
pub struct ScriptSurface<B: Bridge> {
    interop: Interop<B>,
}

impl<B: Bridge> Clone for ScriptSurface<B> {
    fn clone(&self) -> Self {
        Self {
            interop: self.interop.clone(),
        }
    }
}

impl<B: Bridge> ScriptSurface<B> {
    pub fn new(interop: Interop<B>) -> Self {
        Self { interop }
    }

    pub fn interop(&self) -> &Interop<B> {
        &self.interop
    }
}

impl<B: Bridge> RenderSurface for ScriptSurface<B> {
    fn create_element(&self, tag: &str, parent: Option<&JsRef>) -> Result<JsRef> {
        let v = self.interop.execute(
            CREATE_ELEMENT,
            &[Arg::from(tag), Arg::from(parent.copied())],
            CallFlags::SYNC,
        )?;
        v.as_js_ref()
            .ok_or_else(|| Error::Bridge(format!("createElement({tag}) returned {v:?}")))
    }

    fn element_by_id(&self, id: &str) -> Result<Option<JsRef>> {
        let v = self
            .interop
            .execute(ELEMENT_BY_ID, &[Arg::from(id)], CallFlags::SYNC)?;
        Ok(v.as_js_ref())
    }

    fn append_child(&self, parent: &JsRef, child: &JsRef) -> Result<()> {
        self.interop
            .execute_async(APPEND_CHILD, &[parent.into(), child.into()])
    }

    fn set_style(&self, element: &JsRef, name: &str, value: &str) -> Result<()> {
        self.interop
            .execute_async(SET_STYLE, &[element.into(), name.into(), value.into()])
    }

    fn set_attribute(&self, element: &JsRef, name: &str, value: &str) -> Result<()> {
        self.interop
            .execute_async(SET_ATTRIBUTE, &[element.into(), name.into(), value.into()])
    }

    fn natural_size(&self, element: &JsRef) -> Result<Size> {
        let reply = self.interop.execute_string(NATURAL_SIZE, &[element.into()])?;
        Ok(parse_natural_size(&reply))
    }

    fn bind_event(&self, element: &JsRef, event: &str, handler: Rc<dyn Fn()>) -> Result<Dispose> {
        let proxy = self
            .interop
            .context()
            .callbacks
            .register(Rc::new(move |_: &[Value]| handler()));
        self.interop.execute_async(
            ADD_LISTENER,
            &[element.into(), event.into(), Arg::Proxy(proxy)],
        )?;

        let weak = self.interop.downgrade();
        let element = *element;
        let event = event.to_string();
        Ok(Dispose::new(move || {
            let Some(interop) = weak.upgrade() else {
                return;
            };
            if let Err(e) = interop.execute_async(
                REMOVE_LISTENER,
                &[element.into(), event.as_str().into(), Arg::Proxy(proxy)],
            ) {
                log::warn!("unbinding {event} on {element}: {e}");
            }
            interop.release_callback(proxy);
        }))
    }

    fn run_animation(&self, animation: NativeAnimation) -> Result<()> {
        let NativeAnimation {
            element,
            duration,
            easing,
            group,
            properties,
            on_complete,
        } = animation;

        let props = Arg::Object(
            properties
                .iter()
                .map(|p| {
                    let value = match &p.from {
                        Some(from) => Arg::Array(vec![p.to.to_arg(), from.to_arg()]),
                        None => p.to.to_arg(),
                    };
                    (p.name.clone(), value)
                })
                .collect(),
        );
        let easing = match easing {
            EasingDescriptor::Named(name) => Arg::from(name),
            EasingDescriptor::Spring { tension, friction } => {
                Arg::Array(vec![tension.into(), friction.into()])
            }
        };
        let complete = match on_complete {
            Some(f) => Arg::Proxy(self.once_proxy(f)),
            None => Arg::Null,
        };

        self.interop.execute_async(
            RUN_ANIMATION,
            &[
                element.into(),
                props,
                duration.into(),
                easing,
                group.into(),
                complete,
            ],
        )
    }

    fn stop_animation(&self, element: &JsRef, group: &str) -> Result<()> {
        self.interop
            .execute_async(STOP_ANIMATION, &[element.into(), group.into()])
    }

    fn flush(&self) {
        self.interop.flush();
    }
}

impl<B: Bridge> ScriptSurface<B> {
    /// Proxy that runs `f` on its first invocation and then unregisters.
    fn once_proxy(&self, f: Box<dyn FnOnce()>) -> crate::CallbackId {
        let slot = RefCell::new(Some(f));
        let id = Rc::new(Cell::new(0));
        let own_id = id.clone();
        let weak = self.interop.downgrade();
        let proxy = self
            .interop
            .context()
            .callbacks
            .register(Rc::new(move |_: &[Value]| {
                let f = slot.borrow_mut().take();
                if let Some(interop) = weak.upgrade() {
                    interop.release_callback(own_id.get());
                }
                if let Some(f) = f {
                    f()
                }
            }));
        id.set(proxy);
        proxy
    }
}

/// Parses `"<width>|<height>"`; anything unreadable counts as zero.
pub fn parse_natural_size(reply: &str) -> Size {
    let Some((w, h)) = reply.split_once('|') else {
        return Size::ZERO;
    };
    let read = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
    Size::new(read(w), read(h))
}
