use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::AnimationValue;

/// Identifies the object that owns a property (a visual node, a brush, ...).
pub type TargetKey = u64;
pub type SubId = usize;

/// Property storage as seen by the animation engine: get/set with change
/// notification. The real dependency-property system lives outside the core.
pub trait PropertyStore {
    fn get(&self, target: TargetKey, property: &str) -> Option<AnimationValue>;
    fn set(&self, target: TargetKey, property: &str, value: AnimationValue);
}

type Subscriber = Rc<dyn Fn(TargetKey, &str, &AnimationValue)>;

/// In-memory [`PropertyStore`] with change subscribers.
#[derive(Clone, Default)]
pub struct PropertyBag(Rc<Inner>);

#[derive(Default)]
struct Inner {
    values: RefCell<HashMap<(TargetKey, String), AnimationValue>>,
    subs: RefCell<Vec<Subscriber>>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, f: impl Fn(TargetKey, &str, &AnimationValue) + 'static) -> SubId {
        let mut subs = self.0.subs.borrow_mut();
        subs.push(Rc::new(f));
        subs.len() - 1
    }
}

impl PropertyStore for PropertyBag {
    fn get(&self, target: TargetKey, property: &str) -> Option<AnimationValue> {
        self.0
            .values
            .borrow()
            .get(&(target, property.to_string()))
            .copied()
    }

    fn set(&self, target: TargetKey, property: &str, value: AnimationValue) {
        self.0
            .values
            .borrow_mut()
            .insert((target, property.to_string()), value);
        // Subscribers may write back into the bag.
        let subs: Vec<Subscriber> = self.0.subs.borrow().clone();
        for s in subs {
            s(target, property, &value);
        }
    }
}
