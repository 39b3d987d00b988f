use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("class registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("slot access failed: {0}")]
    Slot(#[from] SlotError),

    #[error("disposal failed: {0}")]
    Dispose(#[from] DisposeError),

    #[error("collection operation failed: {0}")]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("class {0:?} is already registered")]
    DuplicateClass(String),

    #[error("class {class:?} declares field {field:?} more than once")]
    DuplicateField { class: String, field: String },

    #[error("class {0:?} is not registered")]
    UnknownClass(String),

    #[error("class id {0} does not belong to this registry")]
    InvalidClassId(u32),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SlotError {
    #[error("object reference is null")]
    NullReference,

    #[error("class {class:?} has no field named {field:?}")]
    UnknownField { class: String, field: String },

    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    #[error("field {field:?} of class {class:?} is read-only")]
    ReadOnly { class: String, field: String },
}

/// Failures raised by the two disposal entry points.
///
/// `NullTarget`, `InvalidTarget` and `NotDisposable` are argument-validation
/// failures; `Hook` carries a nested dispose-hook error through unmodified.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DisposeError {
    #[error("target object reference is null")]
    NullTarget,

    #[error("target is not a class instance (found a {0})")]
    InvalidTarget(&'static str),

    #[error("class {class:?} does not implement the disposal contract")]
    NotDisposable { class: String },

    #[error("dispose hook of class {class:?} failed: {source}")]
    Hook {
        class: String,
        #[source]
        source: HookError,
    },
}

/// Error surfaced by a registered dispose hook.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct HookError(pub String);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollectionError {
    #[error("null object reference cannot be stored")]
    NullEntry,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("page size must be non-zero")]
    ZeroPageSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_error_display() {
        assert_eq!(
            DisposeError::NullTarget.to_string(),
            "target object reference is null"
        );
        let err = DisposeError::Hook {
            class: "Connection".to_string(),
            source: HookError("socket already closed".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "dispose hook of class \"Connection\" failed: socket already closed"
        );
    }

    #[test]
    fn test_runtime_error_from_slot() {
        let slot = SlotError::ReadOnly {
            class: "Widget".to_string(),
            field: "token".to_string(),
        };
        let runtime: RuntimeError = slot.clone().into();
        assert_eq!(runtime, RuntimeError::Slot(slot));
    }
}
