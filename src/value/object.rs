use crate::{
    error::SlotError,
    types::{ClassId, ClassRegistry, FieldKind},
    utils::DebugStr,
    value::{FieldStorage, ManagedString, SlotValue},
    vm::GCHandle,
};
use enum_dispatch::enum_dispatch;
use gc_arena::{lock::RefLock, Collect, Collection, Finalization, Gc};
use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

pub type ObjectInner<'gc> = RefLock<HeapStorage<'gc>>;
pub type ObjectHandle<'gc> = Gc<'gc, ObjectInner<'gc>>;

/// A nullable reference to a heap allocation.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct ObjectRef<'gc>(pub Option<ObjectHandle<'gc>>);

unsafe impl<'gc> Collect for ObjectRef<'gc> {
    fn trace(&self, cc: &Collection) {
        if let Some(h) = self.0 {
            h.trace(cc);
        }
    }
}

impl PartialEq for ObjectRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Some(l), Some(r)) => Gc::ptr_eq(l, r),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for ObjectRef<'_> {}

impl PartialOrd for ObjectRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.0, other.0) {
            (Some(l), Some(r)) => Gc::as_ptr(l).partial_cmp(&Gc::as_ptr(r)),
            (None, None) => Some(Ordering::Equal),
            (None, _) => Some(Ordering::Less),
            (_, None) => Some(Ordering::Greater),
        }
    }
}

impl Hash for ObjectRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0 {
            Some(g) => Gc::as_ptr(g).hash(state),
            None => 0usize.hash(state),
        }
    }
}

impl<'gc> ObjectRef<'gc> {
    pub fn new(gc: GCHandle<'gc>, value: HeapStorage<'gc>) -> Self {
        Self(Some(Gc::new(gc, RefLock::new(value))))
    }

    pub const fn null() -> Self {
        Self(None)
    }

    pub const fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn resurrect(&self, fc: &Finalization<'gc>, visited: &mut HashSet<usize>) {
        if let Some(handle) = self.0 {
            let ptr = Gc::as_ptr(handle) as usize;
            if visited.insert(ptr) {
                Gc::resurrect(fc, handle);
                handle.borrow().resurrect(fc, visited);
            }
        }
    }

    pub fn as_object<T>(&self, op: impl FnOnce(&Object<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = &self else {
            panic!("called ObjectRef::as_object on a null object reference")
        };
        let heap = o.borrow();
        let HeapStorage::Obj(instance) = &*heap else {
            panic!("called ObjectRef::as_object on a non-instance heap reference")
        };

        op(instance)
    }

    pub fn as_object_mut<T>(&self, gc: GCHandle<'gc>, op: impl FnOnce(&mut Object<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = &self else {
            panic!("called ObjectRef::as_object_mut on a null object reference")
        };
        let mut heap = o.borrow_mut(gc);
        let HeapStorage::Obj(instance) = &mut *heap else {
            panic!("called ObjectRef::as_object_mut on a non-instance heap reference")
        };

        op(instance)
    }

    pub fn as_vector<T>(&self, op: impl FnOnce(&ManagedVec<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = &self else {
            panic!("called ObjectRef::as_vector on a null object reference")
        };
        let heap = o.borrow();
        let HeapStorage::Vec(vector) = &*heap else {
            panic!("called ObjectRef::as_vector on a non-vector heap reference")
        };

        op(vector)
    }

    pub fn as_vector_mut<T>(
        &self,
        gc: GCHandle<'gc>,
        op: impl FnOnce(&mut ManagedVec<'gc>) -> T,
    ) -> T {
        let ObjectRef(Some(o)) = &self else {
            panic!("called ObjectRef::as_vector_mut on a null object reference")
        };
        let mut heap = o.borrow_mut(gc);
        let HeapStorage::Vec(vector) = &mut *heap else {
            panic!("called ObjectRef::as_vector_mut on a non-vector heap reference")
        };

        op(vector)
    }
}

impl Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            None => f.write_str("NULL"),
            Some(gc) => {
                let handle = gc.borrow();
                let desc = match &*handle {
                    HeapStorage::Obj(o) => format!("instance of {}", o.class),
                    HeapStorage::Vec(v) => format!("{:?}[{}]", v.element, v.len()),
                    HeapStorage::Str(s) => format!("{s:?}"),
                };
                write!(f, "{} @ {:#?}", desc, Gc::as_ptr(gc))
            }
        }
    }
}

#[enum_dispatch]
pub trait HeapSize {
    /// Rough heap footprint of this allocation, in bytes.
    fn size_bytes(&self) -> usize;
}

#[enum_dispatch(HeapSize)]
#[derive(Clone, Debug, PartialEq)]
pub enum HeapStorage<'gc> {
    Obj(Object<'gc>),
    Vec(ManagedVec<'gc>),
    Str(ManagedString),
}

unsafe impl<'gc> Collect for HeapStorage<'gc> {
    fn trace(&self, cc: &Collection) {
        match self {
            Self::Obj(o) => o.trace(cc),
            Self::Vec(v) => v.trace(cc),
            Self::Str(_) => {}
        }
    }
}

impl<'gc> HeapStorage<'gc> {
    pub fn resurrect(&self, fc: &Finalization<'gc>, visited: &mut HashSet<usize>) {
        match self {
            HeapStorage::Obj(o) => o.resurrect(fc, visited),
            HeapStorage::Vec(v) => v.resurrect(fc, visited),
            HeapStorage::Str(_) => {}
        }
    }

    pub fn as_obj(&self) -> Option<&Object<'gc>> {
        match self {
            HeapStorage::Obj(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_obj_mut(&mut self) -> Option<&mut Object<'gc>> {
        match self {
            HeapStorage::Obj(o) => Some(o),
            _ => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            HeapStorage::Obj(_) => "instance",
            HeapStorage::Vec(_) => "vector",
            HeapStorage::Str(_) => "string",
        }
    }
}

/// A class instance: slot storage plus disposal bookkeeping.
///
/// The same shape backs heap instances and inline struct values; struct
/// values simply never enter the finalization queue.
#[derive(Clone, Debug, PartialEq, Collect)]
#[collect(no_drop)]
pub struct Object<'gc> {
    pub class: ClassId,
    pub storage: FieldStorage<'gc>,
    pub finalizer_suppressed: bool,
    pub disposed: bool,
}

impl<'gc> Object<'gc> {
    pub fn new(registry: &ClassRegistry, class: ClassId) -> Self {
        Self {
            class,
            storage: FieldStorage::instance_fields(registry, class),
            finalizer_suppressed: false,
            disposed: false,
        }
    }

    pub fn resurrect(&self, fc: &Finalization<'gc>, visited: &mut HashSet<usize>) {
        self.storage.resurrect(fc, visited);
    }
}

impl HeapSize for Object<'_> {
    fn size_bytes(&self) -> usize {
        size_of::<Object>() + self.storage.slot_count() * size_of::<SlotValue>()
    }
}

/// A homogeneous heap sequence.
#[derive(Clone, PartialEq, Collect)]
#[collect(no_drop)]
pub struct ManagedVec<'gc> {
    pub element: FieldKind,
    values: Vec<SlotValue<'gc>>,
}

impl Debug for ManagedVec<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                std::iter::once(DebugStr(format!(
                    "vector of {:?} (length {})",
                    self.element,
                    self.values.len()
                )))
                .chain(self.values.iter().map(|v| DebugStr(format!("{v:?}")))),
            )
            .finish()
    }
}

impl<'gc> ManagedVec<'gc> {
    pub fn new(registry: &ClassRegistry, element: FieldKind, len: usize) -> Self {
        Self {
            element,
            values: (0..len)
                .map(|_| SlotValue::default_of(registry, element))
                .collect(),
        }
    }

    pub fn from_values(element: FieldKind, values: Vec<SlotValue<'gc>>) -> Result<Self, SlotError> {
        for value in &values {
            value.check_kind(element)?;
        }
        Ok(Self { element, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SlotValue<'gc>> {
        self.values.get(index)
    }

    pub fn set(&mut self, index: usize, value: SlotValue<'gc>) -> Result<(), SlotError> {
        value.check_kind(self.element)?;
        self.values[index] = value;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotValue<'gc>> + '_ {
        self.values.iter()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [SlotValue<'gc>] {
        &mut self.values
    }

    pub fn resurrect(&self, fc: &Finalization<'gc>, visited: &mut HashSet<usize>) {
        for value in &self.values {
            value.resurrect(fc, visited);
        }
    }
}

impl HeapSize for ManagedVec<'_> {
    fn size_bytes(&self) -> usize {
        size_of::<ManagedVec>() + self.values.len() * size_of::<SlotValue>()
    }
}
