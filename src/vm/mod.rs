//! The heap runtime: arena shell, allocation, slot access, and the
//! collection/finalization cycle.
//!
//! ## Subsystems
//!
//! - **Heap** (`heap.rs`): finalization queue, pending-finalization list,
//!   strong root table.
//! - **Dispose** (`dispose.rs`): the generic dispose/finalize helper.
use crate::{
    error::{RuntimeError, SlotError},
    types::{ClassId, ClassRegistry, FieldKind},
    value::{HeapSize, HeapStorage, ManagedString, ManagedVec, Object, ObjectRef, SlotValue},
};
use gc_arena::{Arena, Mutation, Rootable};
use std::sync::Arc;
use tracing::debug;

pub mod dispose;
mod heap;

pub use heap::{HeapManager, RootHandle};

/// A handle to the GC mutation context.
pub type GCHandle<'gc> = &'gc Mutation<'gc>;

pub type HeapArena = Arena<Rootable![HeapManager<'_>]>;

/// Owns the arena and the class registry behind it.
pub struct Runtime {
    registry: Arc<ClassRegistry>,
    arena: HeapArena,
}

impl Runtime {
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            arena: HeapArena::new(|_gc| HeapManager::new()),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Enter the arena's mutation context.
    pub fn mutate<T>(&self, f: impl for<'gc> FnOnce(HeapContext<'gc, '_>) -> T) -> T {
        let registry = self.registry.as_ref();
        self.arena
            .mutate(move |gc, heap| f(HeapContext { gc, heap, registry }))
    }

    /// Run one full collection cycle: mark, finalize-check, sweep.
    ///
    /// Dead finalizable objects are moved to the pending list and
    /// resurrected; run [`Runtime::run_pending_finalizers`] afterwards to
    /// drain them.
    pub fn collect(&mut self) {
        debug!("starting collection cycle");
        let mut marked = None;
        while marked.is_none() {
            marked = self.arena.mark_all();
        }
        if let Some(marked) = marked {
            marked.finalize(|fc, heap| heap.finalize_check(fc));
        }
        self.arena.collect_all();
    }

    /// Drain the pending-finalization list, running the handle-clearing
    /// pass on each entry. Returns the number of objects finalized.
    pub fn run_pending_finalizers(&self) -> Result<usize, RuntimeError> {
        let registry = self.registry.as_ref();
        self.arena.mutate(move |gc, heap| {
            if heap.processing_finalizer.get() {
                return Ok(0);
            }
            heap.processing_finalizer.set(true);

            let mut count = 0;
            let mut result = Ok(());
            loop {
                let next = heap.pending_finalization.borrow_mut().pop();
                let Some(obj) = next else { break };
                let Some(handle) = obj.0 else { continue };
                debug!(obj = ?obj, "finalizing");
                if let Err(e) = dispose::finalize_object(gc, registry, handle) {
                    result = Err(RuntimeError::Dispose(e));
                    break;
                }
                count += 1;
            }

            heap.processing_finalizer.set(false);
            result.map(|()| count)
        })
    }
}

/// Per-mutation view of the heap: allocation, slot access, disposal, and
/// root management.
pub struct HeapContext<'gc, 'a> {
    pub gc: GCHandle<'gc>,
    pub heap: &'gc HeapManager<'gc>,
    registry: &'a ClassRegistry,
}

impl<'gc> HeapContext<'gc, '_> {
    pub fn registry(&self) -> &ClassRegistry {
        self.registry
    }

    /// Allocate a default-initialized instance. Instances of finalizable
    /// classes enter the finalization queue immediately.
    pub fn alloc_object(&self, class: ClassId) -> Result<ObjectRef<'gc>, RuntimeError> {
        self.alloc_object_init(class, &[])
    }

    /// Allocate an instance with constructor-time slot values. Read-only
    /// slots may only receive their value here.
    pub fn alloc_object_init(
        &self,
        class: ClassId,
        values: &[(&str, SlotValue<'gc>)],
    ) -> Result<ObjectRef<'gc>, RuntimeError> {
        let desc = self.registry.get(class)?;
        let mut object = Object::new(self.registry, class);
        for (name, value) in values {
            object
                .storage
                .write_initial(self.registry, name, value.clone())?;
        }

        debug!(class = %desc.name, size = object.size_bytes(), "allocating instance");
        let obj = ObjectRef::new(self.gc, HeapStorage::Obj(object));
        if self.registry.is_finalizable(class) {
            self.heap.finalization_queue.borrow_mut().push(obj);
            debug!(class = %desc.name, "registered instance for finalization");
        }
        Ok(obj)
    }

    /// Allocate a sequence from element values, which must all match the
    /// element kind.
    pub fn alloc_vec(
        &self,
        element: FieldKind,
        values: Vec<SlotValue<'gc>>,
    ) -> Result<ObjectRef<'gc>, RuntimeError> {
        let vector = ManagedVec::from_values(element, values)?;
        debug!(element = ?element, size = vector.size_bytes(), "allocating vector");
        Ok(ObjectRef::new(self.gc, HeapStorage::Vec(vector)))
    }

    /// Allocate a default-filled sequence of the given length.
    pub fn alloc_vec_sized(&self, element: FieldKind, len: usize) -> ObjectRef<'gc> {
        let vector = ManagedVec::new(self.registry, element, len);
        ObjectRef::new(self.gc, HeapStorage::Vec(vector))
    }

    pub fn alloc_string(&self, s: &str) -> ObjectRef<'gc> {
        ObjectRef::new(self.gc, HeapStorage::Str(ManagedString::from(s)))
    }

    pub fn read_field(
        &self,
        obj: ObjectRef<'gc>,
        name: &str,
    ) -> Result<SlotValue<'gc>, RuntimeError> {
        self.with_instance(obj, |o| o.storage.read(self.registry, name).cloned())?
            .map_err(Into::into)
    }

    pub fn write_field(
        &self,
        obj: ObjectRef<'gc>,
        name: &str,
        value: SlotValue<'gc>,
    ) -> Result<(), RuntimeError> {
        self.with_instance_mut(obj, |o| o.storage.write(self.registry, name, value))?
            .map_err(Into::into)
    }

    pub fn is_disposed(&self, obj: ObjectRef<'gc>) -> Result<bool, RuntimeError> {
        Ok(self.with_instance(obj, |o| o.disposed)?)
    }

    /// Full cleanup pass over `target`; see [`dispose::invoke_dispose`].
    pub fn invoke_dispose(&self, target: ObjectRef<'gc>) -> Result<(), RuntimeError> {
        dispose::invoke_dispose(self.gc, self.registry, target).map_err(Into::into)
    }

    /// Handle-clearing pass over `target`; see [`dispose::invoke_finalize`].
    pub fn invoke_finalize(&self, target: ObjectRef<'gc>) -> Result<(), RuntimeError> {
        dispose::invoke_finalize(self.gc, self.registry, target).map_err(Into::into)
    }

    /// Undo finalization suppression and put the instance back in the
    /// finalization queue if its class requires it.
    pub fn reregister_for_finalization(&self, target: ObjectRef<'gc>) -> Result<(), RuntimeError> {
        let class = self.with_instance_mut(target, |o| {
            o.finalizer_suppressed = false;
            o.class
        })?;
        if self.registry.is_finalizable(class) {
            let mut queue = self.heap.finalization_queue.borrow_mut();
            if !queue.iter().any(|o| *o == target) {
                queue.push(target);
            }
        }
        Ok(())
    }

    pub fn root(&self, obj: ObjectRef<'gc>) -> RootHandle {
        self.heap.root(obj)
    }

    pub fn unroot(&self, handle: RootHandle) {
        self.heap.unroot(handle);
    }

    pub fn get_root(&self, handle: RootHandle) -> ObjectRef<'gc> {
        self.heap.get_root(handle)
    }

    fn with_instance<T>(
        &self,
        obj: ObjectRef<'gc>,
        f: impl FnOnce(&Object<'gc>) -> T,
    ) -> Result<T, SlotError> {
        let Some(handle) = obj.0 else {
            return Err(SlotError::NullReference);
        };
        let borrow = handle.borrow();
        match &*borrow {
            HeapStorage::Obj(o) => Ok(f(o)),
            other => Err(SlotError::KindMismatch {
                expected: "instance".to_string(),
                actual: other.variant_name().to_string(),
            }),
        }
    }

    fn with_instance_mut<T>(
        &self,
        obj: ObjectRef<'gc>,
        f: impl FnOnce(&mut Object<'gc>) -> T,
    ) -> Result<T, SlotError> {
        let Some(handle) = obj.0 else {
            return Err(SlotError::NullReference);
        };
        let mut borrow = handle.borrow_mut(self.gc);
        match &mut *borrow {
            HeapStorage::Obj(o) => Ok(f(o)),
            other => Err(SlotError::KindMismatch {
                expected: "instance".to_string(),
                actual: other.variant_name().to_string(),
            }),
        }
    }
}
