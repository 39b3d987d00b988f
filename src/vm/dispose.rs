//! The generic dispose helper.
//!
//! Both entry points walk the target's inheritance chain, most-derived level
//! first, and release the resources owned by each level's slots. A
//! disposing pass releases managed members and clears handle slots, then
//! suppresses finalization; a finalizing pass only clears handle slots,
//! because touching other managed objects during finalization is unsafe.
//!
//! Rules upheld by the walk:
//! - read-only slots are skipped by both passes, whatever they hold;
//! - string references are never treated as sequences of disposables;
//! - sequence slots are released element-wise and never cleared;
//! - reference slots are cleared after their member is released, value
//!   slots are released in place;
//! - handle slots equal to zero are left untouched.
use crate::{
    error::DisposeError,
    types::{ClassId, ClassRegistry},
    value::{FieldStorage, HeapStorage, Object, ObjectHandle, ObjectRef, SlotValue},
    vm::GCHandle,
};
use tracing::{debug, trace};

/// Full cleanup pass: releases managed members, clears handle slots, then
/// exempts the instance from finalization.
///
/// Fails with an argument error when `target` is null, does not reference a
/// class instance, or its class does not implement the disposal contract.
/// Errors from nested dispose hooks propagate unmodified and abort the
/// remaining passes.
pub fn invoke_dispose<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    target: ObjectRef<'gc>,
) -> Result<(), DisposeError> {
    let handle = require_disposable(registry, target)?;
    debug!(obj = ?target, "running dispose pass");
    dispose_object(gc, registry, handle)
}

/// Finalizer-safe cleanup pass: clears handle slots only.
///
/// Never invokes nested disposal contracts (finalization order across
/// objects is unspecified) and does not suppress finalization.
pub fn invoke_finalize<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    target: ObjectRef<'gc>,
) -> Result<(), DisposeError> {
    let handle = require_disposable(registry, target)?;
    debug!(obj = ?target, "running finalize pass");
    finalize_object(gc, registry, handle)
}

fn require_disposable<'gc>(
    registry: &ClassRegistry,
    target: ObjectRef<'gc>,
) -> Result<ObjectHandle<'gc>, DisposeError> {
    let Some(handle) = target.0 else {
        return Err(DisposeError::NullTarget);
    };
    let class = {
        let borrow = handle.borrow();
        match &*borrow {
            HeapStorage::Obj(o) => o.class,
            other => return Err(DisposeError::InvalidTarget(other.variant_name())),
        }
    };
    if !registry.is_disposable(class) {
        return Err(DisposeError::NotDisposable {
            class: registry.class(class).name.clone(),
        });
    }
    Ok(handle)
}

/// Release an instance's members and mark it disposed and exempt from
/// finalization. Shared by the public entry point and the managed pass when
/// it reaches a disposable member.
pub(crate) fn dispose_object<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    handle: ObjectHandle<'gc>,
) -> Result<(), DisposeError> {
    let (class, mut storage) = detach_storage(gc, handle)?;
    let result = release_storage(gc, registry, class, &mut storage, true);

    let mut borrow = handle.borrow_mut(gc);
    if let Some(o) = borrow.as_obj_mut() {
        o.storage = storage;
        if result.is_ok() {
            o.disposed = true;
            o.finalizer_suppressed = true;
        }
    }
    result
}

/// Handle-clearing pass for the finalizer path and the pending-finalizer
/// drain. Does not require the disposal contract.
pub(crate) fn finalize_object<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    handle: ObjectHandle<'gc>,
) -> Result<(), DisposeError> {
    let (class, mut storage) = detach_storage(gc, handle)?;
    let result = release_storage(gc, registry, class, &mut storage, false);
    if let Some(o) = handle.borrow_mut(gc).as_obj_mut() {
        o.storage = storage;
    }
    result
}

/// Take the instance's slot storage out of the heap cell so nested member
/// disposal never has to re-enter a held borrow. The caller must write the
/// storage back.
fn detach_storage<'gc>(
    gc: GCHandle<'gc>,
    handle: ObjectHandle<'gc>,
) -> Result<(ClassId, FieldStorage<'gc>), DisposeError> {
    let mut borrow = handle.borrow_mut(gc);
    match borrow.as_obj_mut() {
        Some(o) => Ok((o.class, std::mem::take(&mut o.storage))),
        None => Err(DisposeError::InvalidTarget(borrow.variant_name())),
    }
}

enum Release<'gc> {
    /// A disposable member behind a reference slot: release, then clear.
    Member(ObjectHandle<'gc>),
    /// A sequence slot: release disposable elements, clear nothing.
    Elements(ObjectHandle<'gc>),
    /// A disposable inline struct value: release in place.
    StructInPlace,
}

fn classify<'gc>(registry: &ClassRegistry, slot: &SlotValue<'gc>) -> Option<Release<'gc>> {
    match slot {
        SlotValue::Ref(ObjectRef(Some(handle))) => match &*handle.borrow() {
            HeapStorage::Obj(o) if registry.is_disposable(o.class) => {
                Some(Release::Member(*handle))
            }
            HeapStorage::Vec(_) => Some(Release::Elements(*handle)),
            // Strings iterate like sequences but are never element-disposed.
            _ => None,
        },
        SlotValue::Struct(o) if registry.is_disposable(o.class) => Some(Release::StructInPlace),
        _ => None,
    }
}

fn release_storage<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    class: ClassId,
    storage: &mut FieldStorage<'gc>,
    disposing: bool,
) -> Result<(), DisposeError> {
    for (level_idx, (_, desc)) in registry.chain(class).enumerate() {
        // A re-entrant disposal sees detached (hence empty) storage; there
        // are no levels left to process in that case.
        if level_idx >= storage.levels().len() {
            break;
        }

        if disposing {
            if let Some(hook) = desc.dispose_hook {
                trace!(class = %desc.name, "running dispose hook");
                hook(registry, storage).map_err(|source| DisposeError::Hook {
                    class: desc.name.clone(),
                    source,
                })?;
            }

            for (slot_idx, field) in desc.fields.iter().enumerate() {
                if field.readonly {
                    continue;
                }
                match classify(registry, &storage.levels()[level_idx].slots[slot_idx]) {
                    Some(Release::Member(member)) => {
                        dispose_object(gc, registry, member)?;
                        storage.levels_mut()[level_idx].slots[slot_idx] =
                            SlotValue::Ref(ObjectRef::null());
                        trace!(field = %field.name, "released and cleared member");
                    }
                    Some(Release::Elements(seq)) => dispose_elements(gc, registry, seq)?,
                    Some(Release::StructInPlace) => {
                        let SlotValue::Struct(value) =
                            &mut storage.levels_mut()[level_idx].slots[slot_idx]
                        else {
                            unreachable!("classified slot changed kind mid-pass")
                        };
                        dispose_struct(gc, registry, value)?;
                        trace!(field = %field.name, "released struct value in place");
                    }
                    None => {}
                }
            }
        }

        // Handle pass: runs for both entry points.
        for (slot_idx, field) in desc.fields.iter().enumerate() {
            if field.readonly || !field.kind.is_handle() {
                continue;
            }
            match &mut storage.levels_mut()[level_idx].slots[slot_idx] {
                SlotValue::NativeInt(v) if *v != 0 => {
                    trace!(field = %field.name, value = *v, "resetting native handle");
                    *v = 0;
                }
                SlotValue::NativeUInt(v) if *v != 0 => {
                    trace!(field = %field.name, value = *v, "resetting native handle");
                    *v = 0;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn dispose_struct<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    value: &mut Object<'gc>,
) -> Result<(), DisposeError> {
    release_storage(gc, registry, value.class, &mut value.storage, true)?;
    value.disposed = true;
    Ok(())
}

fn dispose_elements<'gc>(
    gc: GCHandle<'gc>,
    registry: &ClassRegistry,
    seq: ObjectHandle<'gc>,
) -> Result<(), DisposeError> {
    let len = match &*seq.borrow() {
        HeapStorage::Vec(v) => v.len(),
        _ => return Ok(()),
    };

    for index in 0..len {
        // Snapshot the element so no sequence borrow is held across the
        // nested disposal.
        let element = match &*seq.borrow() {
            HeapStorage::Vec(v) => v.get(index).cloned(),
            _ => None,
        };
        match element {
            Some(SlotValue::Ref(ObjectRef(Some(handle)))) => {
                let disposable = matches!(
                    &*handle.borrow(),
                    HeapStorage::Obj(o) if registry.is_disposable(o.class)
                );
                if disposable {
                    dispose_object(gc, registry, handle)?;
                }
            }
            Some(SlotValue::Struct(mut value)) if registry.is_disposable(value.class) => {
                dispose_struct(gc, registry, &mut value)?;
                // Written back in place: sequence elements have by-value
                // semantics, like any other value slot.
                if let HeapStorage::Vec(v) = &mut *seq.borrow_mut(gc) {
                    v.values_mut()[index] = SlotValue::Struct(value);
                }
            }
            _ => {}
        }
    }
    Ok(())
}
