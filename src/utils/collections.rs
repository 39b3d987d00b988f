//! Collection wrappers: a null-rejecting reference list, a read-only
//! name/value table, fixed-size page views, and comparer adaptors.
use crate::{
    error::CollectionError,
    value::{ObjectHandle, ObjectRef, SlotValue},
};
use gc_arena::Collect;
use std::{cmp::Ordering, collections::HashMap};

/// An ordered collection of object references that never contains null.
///
/// Null references are rejected at every insertion point, so readers can
/// rely on `get` producing live references only.
#[derive(Clone, Default, Collect)]
#[collect(no_drop)]
pub struct NonNullList<'gc> {
    items: Vec<ObjectHandle<'gc>>,
}

impl<'gc> NonNullList<'gc> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, obj: ObjectRef<'gc>) -> Result<(), CollectionError> {
        let Some(handle) = obj.0 else {
            return Err(CollectionError::NullEntry);
        };
        self.items.push(handle);
        Ok(())
    }

    pub fn set(&mut self, index: usize, obj: ObjectRef<'gc>) -> Result<(), CollectionError> {
        let Some(handle) = obj.0 else {
            return Err(CollectionError::NullEntry);
        };
        if index >= self.items.len() {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items[index] = handle;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<ObjectRef<'gc>> {
        self.items.get(index).map(|h| ObjectRef(Some(*h)))
    }

    pub fn remove(&mut self, index: usize) -> Result<ObjectRef<'gc>, CollectionError> {
        if index >= self.items.len() {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(ObjectRef(Some(self.items.remove(index))))
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectRef<'gc>> + '_ {
        self.items.iter().map(|h| ObjectRef(Some(*h)))
    }
}

/// An immutable name/value view. Values are captured at construction; the
/// table exposes no mutation surface at all.
#[derive(Clone, Default, Collect)]
#[collect(no_drop)]
pub struct ReadOnlyTable<'gc> {
    entries: HashMap<String, SlotValue<'gc>>,
}

impl<'gc> ReadOnlyTable<'gc> {
    pub fn new(entries: impl IntoIterator<Item = (String, SlotValue<'gc>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue<'gc>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + use<'_, 'gc> {
        self.entries.keys().map(String::as_str)
    }
}

/// Fixed-size page windows over a slice. The final page may be short.
pub struct PagedView<'a, T> {
    items: &'a [T],
    page_size: usize,
}

impl<'a, T> PagedView<'a, T> {
    pub fn new(items: &'a [T], page_size: usize) -> Result<Self, CollectionError> {
        if page_size == 0 {
            return Err(CollectionError::ZeroPageSize);
        }
        Ok(Self { items, page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }

    pub fn page(&self, index: usize) -> Option<&'a [T]> {
        let start = index.checked_mul(self.page_size)?;
        if start >= self.items.len() {
            return None;
        }
        let end = (start + self.page_size).min(self.items.len());
        Some(&self.items[start..end])
    }

    pub fn pages(&self) -> impl Iterator<Item = &'a [T]> {
        self.items.chunks(self.page_size)
    }
}

/// Comparison seam: anything that can order two values.
pub trait Comparer<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Orders by the type's own `Ord`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrdComparer;

impl<T: Ord> Comparer<T> for OrdComparer {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts the order produced by an inner comparer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReverseComparer<C>(pub C);

impl<T, C: Comparer<T>> Comparer<T> for ReverseComparer<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}
