use crate::value::ObjectRef;
use gc_arena::{Collect, Collection, Finalization, Gc};
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
};
use tracing::{debug, trace};

/// Index into the heap's strong root table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RootHandle(usize);

pub struct HeapManager<'gc> {
    pub finalization_queue: RefCell<Vec<ObjectRef<'gc>>>,
    pub pending_finalization: RefCell<Vec<ObjectRef<'gc>>>,
    pub processing_finalizer: Cell<bool>,
    roots: RefCell<Vec<Option<ObjectRef<'gc>>>>,
}

impl<'gc> HeapManager<'gc> {
    pub fn new() -> Self {
        Self {
            finalization_queue: RefCell::new(Vec::new()),
            pending_finalization: RefCell::new(Vec::new()),
            processing_finalizer: Cell::new(false),
            roots: RefCell::new(Vec::new()),
        }
    }

    /// Pin an object as a strong root. Freed slots are reused.
    pub fn root(&self, obj: ObjectRef<'gc>) -> RootHandle {
        let mut roots = self.roots.borrow_mut();
        let index = if let Some(i) = roots.iter().position(|r| r.is_none()) {
            roots[i] = Some(obj);
            i
        } else {
            roots.push(Some(obj));
            roots.len() - 1
        };
        trace!(index, "allocated root handle");
        RootHandle(index)
    }

    pub fn unroot(&self, handle: RootHandle) {
        let mut roots = self.roots.borrow_mut();
        if handle.0 < roots.len() {
            roots[handle.0] = None;
        }
    }

    /// Resolve a root handle; freed handles resolve to the null reference.
    pub fn get_root(&self, handle: RootHandle) -> ObjectRef<'gc> {
        match self.roots.borrow().get(handle.0) {
            Some(Some(obj)) => *obj,
            _ => ObjectRef::null(),
        }
    }

    /// Post-marking pass over the finalization queue.
    ///
    /// Suppressed entries leave the queue without running. Dead entries move
    /// to the pending list and are resurrected, together with everything
    /// they reach, so their finalizer can still touch their own slots.
    pub fn finalize_check(&self, fc: &Finalization<'gc>) {
        let mut queue = self.finalization_queue.borrow_mut();
        if queue.is_empty() {
            return;
        }

        let mut resurrected = HashSet::new();
        let mut to_finalize = Vec::new();
        let mut i = 0;
        while i < queue.len() {
            let obj = queue[i];
            let ptr = obj.0.expect("object in finalization queue is null");

            let is_suppressed = ptr
                .borrow()
                .as_obj()
                .is_some_and(|o| o.finalizer_suppressed);

            if is_suppressed {
                queue.swap_remove(i);
                continue;
            }

            if Gc::is_dead(fc, ptr) {
                to_finalize.push(queue.swap_remove(i));
            } else {
                i += 1;
            }
        }

        if !to_finalize.is_empty() {
            debug!(count = to_finalize.len(), "queueing dead objects for finalization");
            let mut pending = self.pending_finalization.borrow_mut();
            for obj in to_finalize {
                let ptr = obj.0.expect("object in finalization queue is null");
                pending.push(obj);
                if resurrected.insert(Gc::as_ptr(ptr) as usize) {
                    Gc::resurrect(fc, ptr);
                    ptr.borrow().resurrect(fc, &mut resurrected);
                }
            }
        }
    }
}

impl<'gc> Default for HeapManager<'gc> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<'gc> Collect for HeapManager<'gc> {
    fn trace(&self, cc: &Collection) {
        for obj in self.roots.borrow().iter().flatten() {
            obj.trace(cc);
        }
        self.pending_finalization.borrow().trace(cc);
        // self.finalization_queue is not traced: queued objects must be
        // allowed to die, and finalize_check resurrects the dead ones it
        // moves to the pending list.
    }
}
