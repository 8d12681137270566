//! In-process bridge for native builds and tests.
//!
//! Nothing is evaluated. Every submission is recorded, synchronous calls are
//! answered by responders, and the surface's asynchronous behaviour (faults,
//! animation completions, proxy invocations) is triggered explicitly.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::{
    Bridge, BridgeFault, BridgeValue, CallIndex, CallbackId, HostHooks, RefId, Submission,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitMode {
    Sync,
    SyncNoImpact,
    Batched,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptRecord {
    pub index: CallIndex,
    pub source: String,
    pub wrapped: String,
    pub mode: SubmitMode,
    pub callbacks: Vec<CallbackId>,
}

type Reply = Result<BridgeValue<u64>, String>;
type Responder = Box<dyn Fn(&str) -> Option<Reply>>;

#[derive(Default)]
pub struct HeadlessBridge {
    records: RefCell<Vec<ScriptRecord>>,
    responders: RefCell<Vec<Responder>>,
    failures: RefCell<Vec<(String, String)>>,
    faults: RefCell<Vec<(CallIndex, String)>>,
    completed: RefCell<HashSet<usize>>,
    hooks: RefCell<Option<Rc<dyn HostHooks<u64>>>>,
    bound: RefCell<Vec<(RefId, u64)>>,
    next_handle: Cell<u64>,
    installs: Cell<usize>,
}

impl HeadlessBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers synchronous calls whose source `f` recognizes. Responders are
    /// asked in registration order.
    pub fn respond(&self, f: impl Fn(&str) -> Option<Reply> + 'static) {
        self.responders.borrow_mut().push(Box::new(f));
    }

    /// Every call whose source contains `needle` throws `message`.
    pub fn fail_when(&self, needle: impl Into<String>, message: impl Into<String>) {
        self.failures
            .borrow_mut()
            .push((needle.into(), message.into()));
    }

    /// Reports faults raised by batched calls. Returns how many were reported.
    pub fn deliver_faults(&self) -> usize {
        let faults = std::mem::take(&mut *self.faults.borrow_mut());
        let Some(hooks) = self.hooks() else {
            return 0;
        };
        for (index, message) in &faults {
            hooks.report_error(message, *index);
        }
        faults.len()
    }

    /// Fires the completion hook of every native animation issued so far
    /// that has not completed yet, oldest first. Animations started by those
    /// hooks wait for the next call.
    pub fn complete_animations(&self) -> usize {
        let due: Vec<CallbackId> = {
            let records = self.records.borrow();
            let mut completed = self.completed.borrow_mut();
            records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.source.starts_with("Velocity(") && !r.source.contains("\"stop\""))
                .filter(|(i, _)| completed.insert(*i))
                .filter_map(|(_, r)| r.callbacks.first().copied())
                .collect()
        };
        let Some(hooks) = self.hooks() else {
            return 0;
        };
        for id in &due {
            hooks.invoke_callback(*id, Vec::new());
        }
        due.len()
    }

    /// Calls a proxy the way the surface would.
    pub fn invoke(&self, id: CallbackId, args: Vec<BridgeValue<u64>>) {
        if let Some(hooks) = self.hooks() {
            hooks.invoke_callback(id, args);
        }
    }

    pub fn records(&self) -> Vec<ScriptRecord> {
        self.records.borrow().clone()
    }

    pub fn sources(&self) -> Vec<String> {
        self.records.borrow().iter().map(|r| r.source.clone()).collect()
    }

    pub fn clear_records(&self) {
        self.records.borrow_mut().clear();
        self.completed.borrow_mut().clear();
    }

    /// Handles stored under host-chosen ids, in binding order.
    pub fn bound_handles(&self) -> Vec<(RefId, u64)> {
        self.bound.borrow().clone()
    }

    /// How many times the bootstrap was installed.
    pub fn installs(&self) -> usize {
        self.installs.get()
    }

    fn hooks(&self) -> Option<Rc<dyn HostHooks<u64>>> {
        self.hooks.borrow().clone()
    }

    fn record(&self, call: &Submission, mode: SubmitMode) {
        self.records.borrow_mut().push(ScriptRecord {
            index: call.index,
            source: call.source.clone(),
            wrapped: call.wrapped.clone(),
            mode,
            callbacks: call.callbacks.to_vec(),
        });
    }

    fn failure_for(&self, source: &str) -> Option<String> {
        self.failures
            .borrow()
            .iter()
            .find(|(needle, _)| source.contains(needle.as_str()))
            .map(|(_, message)| message.clone())
    }

    fn new_handle(&self) -> BridgeValue<u64> {
        let h = self.next_handle.get() + 1;
        self.next_handle.set(h);
        BridgeValue::Object(h)
    }
}

impl Bridge for HeadlessBridge {
    type Handle = u64;

    fn install(&self, hooks: Rc<dyn HostHooks<u64>>) {
        self.installs.set(self.installs.get() + 1);
        *self.hooks.borrow_mut() = Some(hooks);
    }

    fn eval(&self, call: &Submission, no_impact: bool) -> Result<BridgeValue<u64>, BridgeFault> {
        let mode = if no_impact {
            SubmitMode::SyncNoImpact
        } else {
            SubmitMode::Sync
        };
        self.record(call, mode);

        if let Some(message) = self.failure_for(&call.source) {
            return Err(BridgeFault::new(message));
        }
        let reply = self
            .responders
            .borrow()
            .iter()
            .find_map(|r| r(&call.source));
        match reply {
            Some(Ok(v)) => Ok(v),
            Some(Err(message)) => Err(BridgeFault::new(message)),
            None if call.source.contains("document.createElement(")
                || call.source.contains("document.getElementById(") =>
            {
                Ok(self.new_handle())
            }
            None => Ok(BridgeValue::Undefined),
        }
    }

    fn eval_batch(&self, calls: &[Submission]) {
        for call in calls {
            self.record(call, SubmitMode::Batched);
            if let Some(message) = self.failure_for(&call.source) {
                self.faults.borrow_mut().push((call.index, message));
            }
        }
    }

    fn bind_handle(&self, id: RefId, handle: &u64) {
        self.bound.borrow_mut().push((id, *handle));
    }
}
