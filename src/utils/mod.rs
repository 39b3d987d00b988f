//! Shared utilities: collection wrappers and small formatting helpers.
use std::fmt::{Debug, Formatter};

pub mod collections;

pub use collections::{Comparer, NonNullList, OrdComparer, PagedView, ReadOnlyTable, ReverseComparer};

/// Wraps a pre-rendered string so `Debug` formatting emits it verbatim.
pub struct DebugStr(pub String);

impl Debug for DebugStr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
