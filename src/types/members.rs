use crate::{error::HookError, value::FieldStorage};
use gc_arena::Collect;
use std::fmt::{Debug, Display, Formatter};

/// Index of a registered class inside its [`ClassRegistry`](crate::types::ClassRegistry).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Collect)]
#[collect(require_static)]
pub struct ClassId(pub u32);

impl Display for ClassId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declared kind of a state slot.
///
/// `NativeInt` and `NativeUInt` are the two native-size handle kinds; they
/// are the complete set of handle kinds the runtime models.
#[derive(Copy, Clone, PartialEq, Eq, Collect)]
#[collect(require_static)]
pub enum FieldKind {
    Bool,
    Int32,
    Int64,
    Float64,
    /// Signed native-size handle. Zero is the null sentinel.
    NativeInt,
    /// Unsigned native-size handle. Zero is the null sentinel.
    NativeUInt,
    /// Nullable reference to a heap object, vector, or string.
    Reference,
    /// Inline value-type instance of the given class.
    Struct(ClassId),
}

impl FieldKind {
    pub const fn is_handle(&self) -> bool {
        matches!(self, FieldKind::NativeInt | FieldKind::NativeUInt)
    }
}

impl Debug for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Int32 => f.write_str("int32"),
            FieldKind::Int64 => f.write_str("int64"),
            FieldKind::Float64 => f.write_str("float64"),
            FieldKind::NativeInt => f.write_str("nint"),
            FieldKind::NativeUInt => f.write_str("nuint"),
            FieldKind::Reference => f.write_str("ref"),
            FieldKind::Struct(id) => write!(f, "struct {id}"),
        }
    }
}

/// Release operation a class may register alongside the generic slot walk.
///
/// Runs against the instance's own slot storage before the managed pass of
/// the level that declared it. A hook failure propagates to the disposal
/// caller unmodified and aborts the remaining passes.
pub type DisposeHook = for<'gc> fn(
    &crate::types::ClassRegistry,
    &mut FieldStorage<'gc>,
) -> Result<(), HookError>;

/// A state slot declared directly on one class.
#[derive(Clone)]
pub struct FieldDescription {
    pub name: String,
    pub kind: FieldKind,
    pub readonly: bool,
}

impl Debug for FieldDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.readonly {
            write!(f, "readonly ")?;
        }
        write!(f, "{:?} {}", self.kind, self.name)
    }
}
