//! # dispose-rs
//!
//! A miniature managed-object runtime built around a generic dispose
//! helper. Classes register an explicit slot manifest (per inheritance
//! level, with declared kinds and read-only flags); instances live in a
//! garbage-collected arena; and the dispose helper walks an instance's
//! chain to release the resources its slots own, with a separate
//! finalizer-safe pass that only clears native handle slots.
//!
//! ## Subsystems
//!
//! - **Types** (`types/`): class descriptions, the registry, and chain
//!   resolution.
//! - **Values** (`value/`): slot values, heap storage, field storage.
//! - **VM** (`vm/`): the arena runtime, heap manager, finalization cycle,
//!   and the dispose helper itself.
//! - **Utils** (`utils/`): collection wrappers and comparer adaptors.
//!
//! ## Example
//!
//! ```
//! use dispose_rs::{ClassRegistry, FieldKind, Runtime, SlotValue};
//!
//! let mut registry = ClassRegistry::new();
//! let resource = registry
//!     .define("Resource")
//!     .disposable()
//!     .register()
//!     .unwrap();
//! let widget = registry
//!     .define("Widget")
//!     .field("child", FieldKind::Reference)
//!     .field("handle", FieldKind::NativeInt)
//!     .disposable()
//!     .register()
//!     .unwrap();
//!
//! let runtime = Runtime::new(registry);
//! runtime.mutate(|ctx| {
//!     let child = ctx.alloc_object(resource).unwrap();
//!     let obj = ctx
//!         .alloc_object_init(
//!             widget,
//!             &[
//!                 ("child", SlotValue::Ref(child)),
//!                 ("handle", SlotValue::NativeInt(0x20)),
//!             ],
//!         )
//!         .unwrap();
//!
//!     ctx.invoke_dispose(obj).unwrap();
//!     assert!(ctx.is_disposed(child).unwrap());
//!     assert_eq!(
//!         ctx.read_field(obj, "handle").unwrap(),
//!         SlotValue::NativeInt(0)
//!     );
//! });
//! ```
pub mod error;
pub mod types;
pub mod utils;
pub mod value;
pub mod vm;

pub use error::{
    CollectionError, DisposeError, HookError, RegistryError, RuntimeError, SlotError,
};
pub use types::{ClassDescription, ClassId, ClassRegistry, DisposeHook, FieldKind};
pub use value::{
    FieldStorage, HeapSize, HeapStorage, ManagedString, ManagedVec, Object, ObjectHandle,
    ObjectRef, SlotValue,
};
pub use vm::{
    dispose::{invoke_dispose, invoke_finalize},
    GCHandle, HeapContext, HeapManager, RootHandle, Runtime,
};
