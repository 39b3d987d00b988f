use crate::value::HeapSize;
use gc_arena::{unsafe_empty_collect, Collect};
use std::{
    fmt::{Debug, Formatter},
    ops::Deref,
};

/// Heap string payload, stored as UTF-16 code units.
///
/// Strings are iterable but are never treated as sequences of disposable
/// elements; keeping them a dedicated storage variant makes that exclusion a
/// structural fact rather than a runtime check on element types.
#[derive(Clone, PartialEq, Eq)]
pub struct ManagedString(Vec<u16>);

unsafe_empty_collect!(ManagedString);

impl ManagedString {
    pub fn new(units: Vec<u16>) -> Self {
        Self(units)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_string(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }
}

impl HeapSize for ManagedString {
    fn size_bytes(&self) -> usize {
        size_of::<ManagedString>() + self.0.len() * 2
    }
}

impl Deref for ManagedString {
    type Target = [u16];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for ManagedString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_string())
    }
}

impl<T: AsRef<str>> From<T> for ManagedString {
    fn from(s: T) -> Self {
        Self::new(s.as_ref().encode_utf16().collect())
    }
}
