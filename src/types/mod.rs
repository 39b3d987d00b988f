//! Class descriptions and the registry that resolves them.
//!
//! A [`ClassDescription`] is the explicit manifest of one inheritance level:
//! the slots it declares directly, whether the class participates in the
//! disposal contract, and whether its instances require finalization. The
//! [`ClassRegistry`] owns every description, provides the built-in root
//! class, and walks inheritance chains.
use crate::error::RegistryError;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
};

mod members;

pub use members::{ClassId, DisposeHook, FieldDescription, FieldKind};

/// One level of a type's inheritance chain.
#[derive(Clone)]
pub struct ClassDescription {
    pub name: String,
    /// Parent class; `None` only for the registry root.
    pub extends: Option<ClassId>,
    /// Slots declared directly at this level, in declaration order.
    pub fields: Vec<FieldDescription>,
    /// Whether this level implements the disposal contract.
    pub disposable: bool,
    /// Whether instances of this level enter the finalization queue.
    pub finalizable: bool,
    pub dispose_hook: Option<DisposeHook>,
}

impl ClassDescription {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl Debug for ClassDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "class {}", self.name)
    }
}

/// Registry of every class known to a runtime.
///
/// Class ids index into the registry and are only meaningful for the
/// registry that produced them.
pub struct ClassRegistry {
    classes: Vec<ClassDescription>,
    by_name: HashMap<String, ClassId>,
}

impl ClassRegistry {
    /// The universal root class. It declares no slots and is excluded from
    /// every chain walk.
    pub const ROOT: ClassId = ClassId(0);

    pub fn new() -> Self {
        let root = ClassDescription {
            name: "Object".to_string(),
            extends: None,
            fields: Vec::new(),
            disposable: false,
            finalizable: false,
            dispose_hook: None,
        };
        Self {
            classes: vec![root],
            by_name: HashMap::from([("Object".to_string(), Self::ROOT)]),
        }
    }

    /// Start registering a class extending the root.
    pub fn define(&mut self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder {
            registry: self,
            name: name.to_string(),
            extends: Self::ROOT,
            fields: Vec::new(),
            disposable: false,
            finalizable: false,
            dispose_hook: None,
        }
    }

    pub fn class(&self, id: ClassId) -> &ClassDescription {
        &self.classes[id.0 as usize]
    }

    pub fn get(&self, id: ClassId) -> Result<&ClassDescription, RegistryError> {
        self.classes
            .get(id.0 as usize)
            .ok_or(RegistryError::InvalidClassId(id.0))
    }

    pub fn lookup(&self, name: &str) -> Result<ClassId, RegistryError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownClass(name.to_string()))
    }

    /// Walk the inheritance chain starting at `id`, most-derived level
    /// first, excluding the root class.
    pub fn chain(&self, id: ClassId) -> impl Iterator<Item = (ClassId, &ClassDescription)> + '_ {
        let mut current = Some(id);
        std::iter::from_fn(move || {
            let id = current?;
            if id == Self::ROOT {
                return None;
            }
            let desc = &self.classes[id.0 as usize];
            current = desc.extends;
            Some((id, desc))
        })
    }

    /// Whether any level of the chain implements the disposal contract.
    pub fn is_disposable(&self, id: ClassId) -> bool {
        self.chain(id).any(|(_, c)| c.disposable)
    }

    /// Whether any level of the chain requires finalization.
    pub fn is_finalizable(&self, id: ClassId) -> bool {
        self.chain(id).any(|(_, c)| c.finalizable)
    }

    /// Resolve a field by name across the chain; the most-derived
    /// declaration shadows same-named slots further up.
    pub fn locate_field(&self, id: ClassId, name: &str) -> Option<(usize, usize)> {
        for (level, (_, desc)) in self.chain(id).enumerate() {
            if let Some(slot) = desc.field_index(name) {
                return Some((level, slot));
            }
        }
        None
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ClassBuilder<'r> {
    registry: &'r mut ClassRegistry,
    name: String,
    extends: ClassId,
    fields: Vec<FieldDescription>,
    disposable: bool,
    finalizable: bool,
    dispose_hook: Option<DisposeHook>,
}

impl<'r> ClassBuilder<'r> {
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.extends = parent;
        self
    }

    pub fn field(self, name: &str, kind: FieldKind) -> Self {
        self.add_field(name, kind, false)
    }

    pub fn readonly_field(self, name: &str, kind: FieldKind) -> Self {
        self.add_field(name, kind, true)
    }

    fn add_field(mut self, name: &str, kind: FieldKind, readonly: bool) -> Self {
        self.fields.push(FieldDescription {
            name: name.to_string(),
            kind,
            readonly,
        });
        self
    }

    pub fn disposable(mut self) -> Self {
        self.disposable = true;
        self
    }

    pub fn finalizable(mut self) -> Self {
        self.finalizable = true;
        self
    }

    /// Attach a release hook; implies the disposal contract.
    pub fn dispose_hook(mut self, hook: DisposeHook) -> Self {
        self.dispose_hook = Some(hook);
        self.disposable = true;
        self
    }

    pub fn register(self) -> Result<ClassId, RegistryError> {
        if self.registry.by_name.contains_key(&self.name) {
            return Err(RegistryError::DuplicateClass(self.name));
        }
        self.registry.get(self.extends)?;
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(RegistryError::DuplicateField {
                    class: self.name,
                    field: field.name.clone(),
                });
            }
            // Struct slots can only name already-registered classes, which
            // rules out recursive inline layouts.
            if let FieldKind::Struct(id) = field.kind {
                self.registry.get(id)?;
            }
        }

        let id = ClassId(self.registry.classes.len() as u32);
        self.registry.by_name.insert(self.name.clone(), id);
        self.registry.classes.push(ClassDescription {
            name: self.name,
            extends: Some(self.extends),
            fields: self.fields,
            disposable: self.disposable,
            finalizable: self.finalizable,
            dispose_hook: self.dispose_hook,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_predefined() {
        let registry = ClassRegistry::new();
        assert_eq!(registry.lookup("Object").unwrap(), ClassRegistry::ROOT);
        assert!(registry.class(ClassRegistry::ROOT).fields.is_empty());
    }

    #[test]
    fn test_chain_excludes_root_and_orders_most_derived_first() {
        let mut registry = ClassRegistry::new();
        let base = registry
            .define("Base")
            .field("a", FieldKind::Int32)
            .register()
            .unwrap();
        let derived = registry
            .define("Derived")
            .extends(base)
            .field("b", FieldKind::Int32)
            .register()
            .unwrap();

        let names: Vec<_> = registry
            .chain(derived)
            .map(|(_, c)| c.name.as_str())
            .collect();
        assert_eq!(names, ["Derived", "Base"]);
    }

    #[test]
    fn test_disposable_and_finalizable_are_inherited() {
        let mut registry = ClassRegistry::new();
        let base = registry.define("Base").disposable().register().unwrap();
        let derived = registry
            .define("Derived")
            .extends(base)
            .finalizable()
            .register()
            .unwrap();

        assert!(registry.is_disposable(derived));
        assert!(registry.is_finalizable(derived));
        assert!(!registry.is_finalizable(base));
    }

    #[test]
    fn test_field_shadowing_resolves_most_derived() {
        let mut registry = ClassRegistry::new();
        let base = registry
            .define("Base")
            .field("value", FieldKind::Int32)
            .register()
            .unwrap();
        let derived = registry
            .define("Derived")
            .extends(base)
            .field("value", FieldKind::Int64)
            .register()
            .unwrap();

        assert_eq!(registry.locate_field(derived, "value"), Some((0, 0)));
        assert_eq!(registry.locate_field(base, "value"), Some((0, 0)));
        assert_eq!(registry.locate_field(derived, "missing"), None);
    }

    #[test]
    fn test_duplicate_registrations_are_rejected() {
        let mut registry = ClassRegistry::new();
        registry.define("Thing").register().unwrap();
        assert_eq!(
            registry.define("Thing").register(),
            Err(RegistryError::DuplicateClass("Thing".to_string()))
        );
        assert_eq!(
            registry
                .define("Other")
                .field("x", FieldKind::Bool)
                .field("x", FieldKind::Bool)
                .register(),
            Err(RegistryError::DuplicateField {
                class: "Other".to_string(),
                field: "x".to_string(),
            })
        );
    }

    #[test]
    fn test_struct_field_requires_registered_class() {
        let mut registry = ClassRegistry::new();
        assert_eq!(
            registry
                .define("Holder")
                .field("inner", FieldKind::Struct(ClassId(99)))
                .register(),
            Err(RegistryError::InvalidClassId(99))
        );
    }
}
