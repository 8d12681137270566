use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use trellis_core::{Error, Result};

pub type RefId = u64;

/// ID-backed reference to an object living on the surface side.
///
/// Only the ID ever appears in serialized calls; see [`JsRef::token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsRef(RefId);

impl JsRef {
    pub fn id(&self) -> RefId {
        self.0
    }

    /// Expression that yields the referenced object on the surface.
    pub fn token(&self) -> String {
        format!("trellis.refs[{}]", self.0)
    }
}

impl fmt::Display for JsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps reference IDs to live surface handles.
///
/// IDs are handed out monotonically and never reused or released; a handle
/// bound once stays resolvable for the lifetime of the table.
pub struct ReferenceTable<H> {
    next: AtomicU64,
    slots: RwLock<HashMap<RefId, H>>,
}

impl<H: Clone> Default for ReferenceTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> ReferenceTable<H> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Hands out an ID before its handle exists, so it can be embedded in the
    /// call that produces the handle.
    pub fn reserve(&self) -> RefId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn bind(&self, id: RefId, handle: H) -> Result<JsRef> {
        if id == 0 || id >= self.next.load(Ordering::Relaxed) {
            return Err(Error::UnknownReference(id));
        }
        self.slots.write().insert(id, handle);
        Ok(JsRef(id))
    }

    pub fn allocate(&self, handle: H) -> JsRef {
        let mut slots = self.slots.write();
        let id = self.reserve();
        slots.insert(id, handle);
        JsRef(id)
    }

    pub fn resolve(&self, r: JsRef) -> Option<H> {
        self.slots.read().get(&r.0).cloned()
    }

    /// Number of bound handles.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
