use crate::{
    error::SlotError,
    types::{ClassId, ClassRegistry, FieldDescription},
    value::SlotValue,
};
use gc_arena::Collect;

/// Instance slot storage, grouped by inheritance level.
///
/// Levels are ordered most-derived first, matching the registry's chain
/// walk; each level holds exactly the slots its class declares directly.
#[derive(Clone, Debug, Default, PartialEq, Collect)]
#[collect(no_drop)]
pub struct FieldStorage<'gc> {
    levels: Vec<LevelStorage<'gc>>,
}

#[derive(Clone, Debug, PartialEq, Collect)]
#[collect(no_drop)]
pub struct LevelStorage<'gc> {
    pub class: ClassId,
    pub slots: Vec<SlotValue<'gc>>,
}

impl<'gc> FieldStorage<'gc> {
    /// Build default-initialized storage for an instance of `class`.
    pub fn instance_fields(registry: &ClassRegistry, class: ClassId) -> Self {
        let levels = registry
            .chain(class)
            .map(|(id, desc)| LevelStorage {
                class: id,
                slots: desc
                    .fields
                    .iter()
                    .map(|f| SlotValue::default_of(registry, f.kind))
                    .collect(),
            })
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> &[LevelStorage<'gc>] {
        &self.levels
    }

    pub fn levels_mut(&mut self) -> &mut [LevelStorage<'gc>] {
        &mut self.levels
    }

    pub fn slot_count(&self) -> usize {
        self.levels.iter().map(|l| l.slots.len()).sum()
    }

    fn owner_name(&self, registry: &ClassRegistry) -> String {
        match self.levels.first() {
            Some(level) => registry.class(level.class).name.clone(),
            None => registry.class(ClassRegistry::ROOT).name.clone(),
        }
    }

    fn locate<'r>(
        &self,
        registry: &'r ClassRegistry,
        name: &str,
    ) -> Option<(usize, usize, &'r FieldDescription)> {
        for (level_idx, level) in self.levels.iter().enumerate() {
            let desc = registry.class(level.class);
            if let Some(slot_idx) = desc.field_index(name) {
                return Some((level_idx, slot_idx, &desc.fields[slot_idx]));
            }
        }
        None
    }

    /// Read a slot by name; the most-derived declaration shadows same-named
    /// slots further up the chain.
    pub fn read(&self, registry: &ClassRegistry, name: &str) -> Result<&SlotValue<'gc>, SlotError> {
        let (level, slot, _) = self.locate(registry, name).ok_or_else(|| {
            SlotError::UnknownField {
                class: self.owner_name(registry),
                field: name.to_string(),
            }
        })?;
        Ok(&self.levels[level].slots[slot])
    }

    /// Write a slot by name. Read-only slots are rejected; the value must
    /// match the declared kind.
    pub fn write(
        &mut self,
        registry: &ClassRegistry,
        name: &str,
        value: SlotValue<'gc>,
    ) -> Result<(), SlotError> {
        let (level, slot, field) = self.locate(registry, name).ok_or_else(|| {
            SlotError::UnknownField {
                class: self.owner_name(registry),
                field: name.to_string(),
            }
        })?;
        if field.readonly {
            return Err(SlotError::ReadOnly {
                class: registry.class(self.levels[level].class).name.clone(),
                field: name.to_string(),
            });
        }
        value.check_kind(field.kind)?;
        self.levels[level].slots[slot] = value;
        Ok(())
    }

    /// Constructor-time write: kind-checked, but allowed to assign read-only
    /// slots. Only reachable through allocation, before the instance is
    /// published.
    pub(crate) fn write_initial(
        &mut self,
        registry: &ClassRegistry,
        name: &str,
        value: SlotValue<'gc>,
    ) -> Result<(), SlotError> {
        let (level, slot, field) = self.locate(registry, name).ok_or_else(|| {
            SlotError::UnknownField {
                class: self.owner_name(registry),
                field: name.to_string(),
            }
        })?;
        value.check_kind(field.kind)?;
        self.levels[level].slots[slot] = value;
        Ok(())
    }

    pub(crate) fn resurrect(
        &self,
        fc: &gc_arena::Finalization<'gc>,
        visited: &mut std::collections::HashSet<usize>,
    ) {
        for level in &self.levels {
            for slot in &level.slots {
                slot.resurrect(fc, visited);
            }
        }
    }
}
