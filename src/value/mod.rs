//! Runtime values: slot contents, heap storage, and field storage.
//!
//! A [`SlotValue`] is the content of one state slot. Scalars and handles are
//! stored inline, object references point into the GC heap, and struct
//! values embed a whole instance in place.
use crate::{
    error::SlotError,
    types::{ClassRegistry, FieldKind},
};
use gc_arena::{Collect, Collection, Finalization};
use std::collections::HashSet;

mod object;
#[cfg(test)]
mod object_tests;
mod storage;
mod string;

pub use object::{HeapSize, HeapStorage, ManagedVec, Object, ObjectHandle, ObjectInner, ObjectRef};
pub use storage::{FieldStorage, LevelStorage};
pub use string::ManagedString;

#[derive(Clone, Debug, PartialEq)]
pub enum SlotValue<'gc> {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    /// Signed native-size handle value.
    NativeInt(isize),
    /// Unsigned native-size handle value.
    NativeUInt(usize),
    Ref(ObjectRef<'gc>),
    Struct(Box<Object<'gc>>),
}

unsafe impl<'gc> Collect for SlotValue<'gc> {
    fn trace(&self, cc: &Collection) {
        match self {
            SlotValue::Ref(o) => o.trace(cc),
            SlotValue::Struct(o) => o.trace(cc),
            _ => {}
        }
    }
}

impl<'gc> SlotValue<'gc> {
    /// Zero/null/default value for a declared slot kind.
    pub fn default_of(registry: &ClassRegistry, kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => SlotValue::Bool(false),
            FieldKind::Int32 => SlotValue::Int32(0),
            FieldKind::Int64 => SlotValue::Int64(0),
            FieldKind::Float64 => SlotValue::Float64(0.0),
            FieldKind::NativeInt => SlotValue::NativeInt(0),
            FieldKind::NativeUInt => SlotValue::NativeUInt(0),
            FieldKind::Reference => SlotValue::Ref(ObjectRef::null()),
            FieldKind::Struct(class) => {
                SlotValue::Struct(Box::new(Object::new(registry, class)))
            }
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            SlotValue::Bool(_) => FieldKind::Bool,
            SlotValue::Int32(_) => FieldKind::Int32,
            SlotValue::Int64(_) => FieldKind::Int64,
            SlotValue::Float64(_) => FieldKind::Float64,
            SlotValue::NativeInt(_) => FieldKind::NativeInt,
            SlotValue::NativeUInt(_) => FieldKind::NativeUInt,
            SlotValue::Ref(_) => FieldKind::Reference,
            SlotValue::Struct(o) => FieldKind::Struct(o.class),
        }
    }

    pub fn check_kind(&self, expected: FieldKind) -> Result<(), SlotError> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(SlotError::KindMismatch {
                expected: format!("{expected:?}"),
                actual: format!("{:?}", self.kind()),
            })
        }
    }

    pub fn as_bool(&self) -> Result<bool, SlotError> {
        match self {
            SlotValue::Bool(b) => Ok(*b),
            _ => Err(self.mismatch(FieldKind::Bool)),
        }
    }

    pub fn as_int32(&self) -> Result<i32, SlotError> {
        match self {
            SlotValue::Int32(i) => Ok(*i),
            _ => Err(self.mismatch(FieldKind::Int32)),
        }
    }

    pub fn as_int64(&self) -> Result<i64, SlotError> {
        match self {
            SlotValue::Int64(i) => Ok(*i),
            _ => Err(self.mismatch(FieldKind::Int64)),
        }
    }

    pub fn as_float64(&self) -> Result<f64, SlotError> {
        match self {
            SlotValue::Float64(f) => Ok(*f),
            _ => Err(self.mismatch(FieldKind::Float64)),
        }
    }

    pub fn as_native_int(&self) -> Result<isize, SlotError> {
        match self {
            SlotValue::NativeInt(i) => Ok(*i),
            _ => Err(self.mismatch(FieldKind::NativeInt)),
        }
    }

    pub fn as_native_uint(&self) -> Result<usize, SlotError> {
        match self {
            SlotValue::NativeUInt(i) => Ok(*i),
            _ => Err(self.mismatch(FieldKind::NativeUInt)),
        }
    }

    pub fn as_object_ref(&self) -> Result<ObjectRef<'gc>, SlotError> {
        match self {
            SlotValue::Ref(o) => Ok(*o),
            _ => Err(self.mismatch(FieldKind::Reference)),
        }
    }

    pub fn as_struct(&self) -> Result<&Object<'gc>, SlotError> {
        match self {
            SlotValue::Struct(o) => Ok(o),
            _ => Err(SlotError::KindMismatch {
                expected: "struct".to_string(),
                actual: format!("{:?}", self.kind()),
            }),
        }
    }

    fn mismatch(&self, expected: FieldKind) -> SlotError {
        SlotError::KindMismatch {
            expected: format!("{expected:?}"),
            actual: format!("{:?}", self.kind()),
        }
    }

    pub(crate) fn resurrect(&self, fc: &Finalization<'gc>, visited: &mut HashSet<usize>) {
        match self {
            SlotValue::Ref(o) => o.resurrect(fc, visited),
            SlotValue::Struct(o) => o.resurrect(fc, visited),
            _ => {}
        }
    }
}
