use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::Value;

pub type CallbackId = u64;
pub type Callback = Rc<dyn Fn(&[Value])>;

/// Host closures the surface can call back into, addressed by ID.
#[derive(Default)]
pub struct CallbackRegistry {
    next: Cell<CallbackId>,
    map: RefCell<HashMap<CallbackId, Callback>>,
}

impl CallbackRegistry {
    pub fn register(&self, cb: Callback) -> CallbackId {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.map.borrow_mut().insert(id, cb);
        id
    }

    pub fn get(&self, id: CallbackId) -> Option<Callback> {
        self.map.borrow().get(&id).cloned()
    }

    pub fn release(&self, id: CallbackId) -> bool {
        self.map.borrow_mut().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expression that yields the surface-side proxy function for `id`.
    pub fn token(id: CallbackId) -> String {
        format!("trellis.callback({id})")
    }
}
