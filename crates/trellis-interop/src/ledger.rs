use parking_lot::Mutex;

pub type CallIndex = usize;

/// Source text of submitted calls, indexed by the number the surface echoes
/// back when a call throws.
///
/// Slots are cleared but never removed, so an index stays valid forever.
pub struct CallLedger {
    items: Mutex<Vec<Option<String>>>,
}

impl CallLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn record(&self, source: impl Into<String>) -> CallIndex {
        let mut items = self.items.lock();
        items.push(Some(source.into()));
        items.len() - 1
    }

    pub fn clear(&self, index: CallIndex) {
        if let Some(slot) = self.items.lock().get_mut(index) {
            *slot = None;
        }
    }

    pub fn source(&self, index: CallIndex) -> Option<String> {
        self.items.lock().get(index).cloned().flatten()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CallLedger {
    fn default() -> Self {
        Self::with_capacity(8192)
    }
}
