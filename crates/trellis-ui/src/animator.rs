use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use trellis_core::{AnimationValue, Easing, PropertyStore, Result, TargetKey};
use trellis_interop::{AnimatedProperty, JsRef, NativeAnimation, RenderSurface};

use crate::{
    KeyFrame, MetadataTable, PropertyMetadata, ResolvedFrame, resolve_key_frames, total_duration,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    /// Queue name of the run's native animations.
    pub fn group_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Owner of an animated property and, when rendered, its element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTarget {
    pub key: TargetKey,
    pub element: Option<JsRef>,
}

impl AnimationTarget {
    pub fn detached(key: TargetKey) -> Self {
        Self { key, element: None }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoubleAnimation {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub duration: Duration,
    pub easing: Easing,
}

impl DoubleAnimation {
    pub fn to(value: f64, duration: Duration) -> Self {
        Self {
            from: None,
            to: Some(value),
            duration,
            easing: Easing::Linear,
        }
    }

    pub fn starting_from(mut self, value: f64) -> Self {
        self.from = Some(value);
        self
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyFrameAnimation {
    pub frames: Vec<KeyFrame>,
    /// Overrides the natural duration for percent and trailing key times.
    pub duration: Option<Duration>,
}

impl KeyFrameAnimation {
    pub fn new(frames: Vec<KeyFrame>) -> Self {
        Self {
            frames,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Timeline {
    Double(DoubleAnimation),
    KeyFrames(KeyFrameAnimation),
}

impl From<DoubleAnimation> for Timeline {
    fn from(a: DoubleAnimation) -> Self {
        Timeline::Double(a)
    }
}

impl From<KeyFrameAnimation> for Timeline {
    fn from(a: KeyFrameAnimation) -> Self {
        Timeline::KeyFrames(a)
    }
}

impl Timeline {
    pub fn natural_duration(&self) -> Duration {
        match self {
            Timeline::Double(a) => a.duration,
            Timeline::KeyFrames(a) => resolve_key_frames(&a.frames, a.duration)
                .last()
                .map(|f| f.at)
                .unwrap_or_else(|| total_duration(&a.frames, a.duration)),
        }
    }

    /// Start value to force-feed, and the frames in applied order.
    fn plan(&self) -> (Option<AnimationValue>, Vec<ResolvedFrame>) {
        match self {
            Timeline::Double(a) => {
                let Some(to) = a.to else {
                    return (None, Vec::new());
                };
                let frame = ResolvedFrame {
                    at: a.duration,
                    duration: a.duration,
                    value: AnimationValue::Double(to),
                    easing: a.easing,
                };
                (a.from.map(AnimationValue::Double), vec![frame])
            }
            Timeline::KeyFrames(a) => (None, resolve_key_frames(&a.frames, a.duration)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunInfo {
    pub id: RunId,
    /// Frames already applied.
    pub applied: usize,
    pub frames: usize,
}

type Finished = Box<dyn FnOnce(RunOutcome)>;
type Slot = (TargetKey, String);

/// How `apply_frame` dealt with the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Applied {
    /// Issued to the surface; its completion hook moves the run on.
    Native,
    /// Nothing to animate on the surface; the frame is due at once.
    Immediate,
    /// The run is no longer current.
    Gone,
}

struct Run {
    id: RunId,
    target: AnimationTarget,
    frames: Vec<ResolvedFrame>,
    from: Option<AnimationValue>,
    applied: usize,
    on_finished: Option<Finished>,
}

/// Drives key-frame runs, at most one per (target, property).
pub struct Animator<S, P>(Rc<Inner<S, P>>);

struct Inner<S, P> {
    surface: S,
    store: P,
    metadata: Rc<dyn PropertyMetadata>,
    next_run: Cell<u64>,
    runs: RefCell<HashMap<Slot, Run>>,
}

impl<S, P> Clone for Animator<S, P> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S, P> Animator<S, P>
where
    S: RenderSurface + 'static,
    P: PropertyStore + 'static,
{
    pub fn new(surface: S, store: P) -> Self {
        Self::with_metadata(surface, store, Rc::new(MetadataTable::standard()))
    }

    pub fn with_metadata(surface: S, store: P, metadata: Rc<dyn PropertyMetadata>) -> Self {
        Self(Rc::new(Inner {
            surface,
            store,
            metadata,
            next_run: Cell::new(0),
            runs: RefCell::new(HashMap::new()),
        }))
    }

    pub fn surface(&self) -> &S {
        &self.0.surface
    }

    pub fn store(&self) -> &P {
        &self.0.store
    }

    pub fn current(&self, target: TargetKey, property: &str) -> Option<RunInfo> {
        self.0
            .runs
            .borrow()
            .get(&(target, property.to_string()))
            .map(|run| RunInfo {
                id: run.id,
                applied: run.applied,
                frames: run.frames.len(),
            })
    }

    pub fn begin(
        &self,
        target: AnimationTarget,
        property: &str,
        timeline: impl Into<Timeline>,
    ) -> Result<Option<RunId>> {
        self.begin_with(target, property, timeline, |_| {})
    }

    /// Starts a run, superseding the one on the same (target, property).
    ///
    /// `on_finished` fires once when the run completes or is stopped. A
    /// superseded run never finishes and writes nothing more. Returns `None`
    /// when the timeline has nothing to animate.
    pub fn begin_with(
        &self,
        target: AnimationTarget,
        property: &str,
        timeline: impl Into<Timeline>,
        on_finished: impl FnOnce(RunOutcome) + 'static,
    ) -> Result<Option<RunId>> {
        let (from, frames) = timeline.into().plan();
        if frames.is_empty() {
            log::debug!("nothing to animate on {property} of target {}", target.key);
            return Ok(None);
        }

        let slot: Slot = (target.key, property.to_string());
        let superseded = self.0.runs.borrow_mut().remove(&slot);
        if let Some(old) = superseded {
            log::debug!("{} superseded on {property}", old.id);
            self.halt_native(&old);
        }

        let id = RunId(self.0.next_run.get() + 1);
        self.0.next_run.set(id.0);
        log::debug!(
            "{id} animates {property} of target {} over {} frame(s)",
            target.key,
            frames.len()
        );
        self.0.runs.borrow_mut().insert(
            slot.clone(),
            Run {
                id,
                target,
                frames,
                from,
                applied: 0,
                on_finished: Some(Box::new(on_finished)),
            },
        );

        self.advance(&slot, id)?;
        Ok(Some(id))
    }

    /// Cancels the run on (target, property): no more frames are applied,
    /// its native animations are halted and the last key frame is written
    /// once. Returns false when nothing was running.
    pub fn stop(&self, target: TargetKey, property: &str) -> bool {
        let slot: Slot = (target, property.to_string());
        let Some(mut run) = self.0.runs.borrow_mut().remove(&slot) else {
            return false;
        };
        self.halt_native(&run);
        if let Some(last) = run.frames.last() {
            self.0.store.set(target, property, last.value);
        }
        log::debug!("{} cancelled on {property}", run.id);
        if let Some(f) = run.on_finished.take() {
            f(RunOutcome::Cancelled);
        }
        true
    }

    fn halt_native(&self, run: &Run) {
        let Some(el) = run.target.element else {
            return;
        };
        if let Err(e) = self.0.surface.stop_animation(&el, &run.id.group_name()) {
            log::warn!("could not stop {}: {e}", run.id);
        }
        self.0.surface.flush();
    }

    /// Applies frames of `id` until one runs natively or the run ends. A run
    /// whose frame fails to start is dropped without finishing.
    fn advance(&self, slot: &Slot, id: RunId) -> Result<()> {
        loop {
            let applied = match self.apply_frame(slot, id) {
                Ok(applied) => applied,
                Err(e) => {
                    self.discard(slot, id);
                    return Err(e);
                }
            };
            if applied != Applied::Immediate || !self.frame_completed(slot, id) {
                return Ok(());
            }
        }
    }

    fn discard(&self, slot: &Slot, id: RunId) {
        let removed = {
            let mut runs = self.0.runs.borrow_mut();
            if runs.get(slot).is_some_and(|r| r.id == id) {
                runs.remove(slot)
            } else {
                None
            }
        };
        if let Some(run) = removed {
            log::debug!("{} dropped after a failed frame", run.id);
            self.halt_native(&run);
        }
    }

    fn apply_frame(&self, slot: &Slot, id: RunId) -> Result<Applied> {
        let (frame, from, target) = {
            let runs = self.0.runs.borrow();
            let Some(run) = runs.get(slot).filter(|r| r.id == id) else {
                return Ok(Applied::Gone);
            };
            let from = if run.applied == 0 { run.from } else { None };
            (run.frames[run.applied].clone(), from, run.target)
        };

        let equivalence = self.0.metadata.css_equivalence(&slot.1);
        let natives = equivalence.targets();
        let Some(element) = target.element.filter(|_| !natives.is_empty()) else {
            return Ok(Applied::Immediate);
        };

        let group = id.group_name();
        for (i, css) in natives.iter().enumerate() {
            // Only the first equivalent reports back.
            let on_complete = if i == 0 {
                Some(self.completion(slot.clone(), id))
            } else {
                None
            };
            self.0.surface.run_animation(NativeAnimation {
                element,
                duration: frame.duration.as_nanos() as f64 / 1e6,
                easing: frame.easing.descriptor(),
                group: group.clone(),
                properties: vec![AnimatedProperty {
                    name: css.name.to_string(),
                    to: css.to_css(frame.value),
                    from: from.map(|v| css.to_css(v)),
                }],
                on_complete,
            })?;
        }
        self.0.surface.flush();
        Ok(Applied::Native)
    }

    fn completion(&self, slot: Slot, id: RunId) -> Box<dyn FnOnce()> {
        let weak: Weak<Inner<S, P>> = Rc::downgrade(&self.0);
        Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let animator = Animator(inner);
            if animator.frame_completed(&slot, id)
                && let Err(e) = animator.advance(&slot, id)
            {
                log::warn!("{id} could not apply its next frame: {e}");
            }
        })
    }

    /// Writes the current frame of `id` and moves past it. True when more
    /// frames follow.
    fn frame_completed(&self, slot: &Slot, id: RunId) -> bool {
        let (value, done) = {
            let mut runs = self.0.runs.borrow_mut();
            let Some(run) = runs.get_mut(slot) else {
                log::trace!("{id} completed a frame after it stopped");
                return false;
            };
            if run.id != id {
                log::trace!("stale completion from {id}, {} is current", run.id);
                return false;
            }
            let value = run.frames[run.applied].value;
            run.applied += 1;
            (value, run.applied >= run.frames.len())
        };

        self.0.store.set(slot.0, &slot.1, value);

        if !done {
            return true;
        }

        let finished = {
            let mut runs = self.0.runs.borrow_mut();
            if runs.get(slot).is_some_and(|r| r.id == id) {
                runs.remove(slot).and_then(|r| r.on_finished)
            } else {
                None
            }
        };
        log::debug!("{id} completed");
        if let Some(f) = finished {
            f(RunOutcome::Completed);
        }
        false
    }
}
