// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Archetype index: mask -> archetype lookup and the ordered archetype list
//!
//! Archetypes are created on demand, appended to the ordered list, and live
//! for the world's lifetime. `structural_version` is bumped on every
//! creation so filters can detect when their archetype lists are stale.

use ahash::AHashMap;

use crate::archetype::Archetype;
use crate::mask::ComponentMask;
use crate::registry::ComponentRegistry;

/// Slot of the no-components archetype, created on construction.
pub(crate) const EMPTY_ARCHETYPE: usize = 0;

/// Mask -> archetype map plus the creation-ordered archetype list
pub struct ArchetypeIndex {
    archetypes: Vec<Archetype>,
    by_mask: AHashMap<ComponentMask, usize>,
    structural_version: u64,
}

impl ArchetypeIndex {
    /// Create the index with the empty-mask archetype at slot 0 so fresh
    /// entities have an immediate home.
    pub(crate) fn new(registry: &ComponentRegistry) -> Self {
        let mut index = Self {
            // Start with reasonable defaults to avoid resize spikes
            archetypes: Vec::with_capacity(64),
            by_mask: AHashMap::with_capacity(64),
            structural_version: 0,
        };
        index.get_or_create(ComponentMask::EMPTY, registry);
        index
    }

    /// Return the archetype slot for `mask`, creating the archetype if the
    /// mask is new. Column layouts for a fresh archetype come from the
    /// registry. Creation bumps `structural_version`.
    pub(crate) fn get_or_create(&mut self, mask: ComponentMask, registry: &ComponentRegistry) -> usize {
        if let Some(&slot) = self.by_mask.get(&mask) {
            return slot;
        }

        // Push first so the map never refers to a missing slot
        let slot = self.archetypes.len();
        self.archetypes.push(Archetype::new(mask, registry, slot));
        self.by_mask.insert(mask, slot);
        self.structural_version += 1;
        slot
    }

    /// Existing slot for a mask, if any.
    pub(crate) fn lookup(&self, mask: &ComponentMask) -> Option<usize> {
        self.by_mask.get(mask).copied()
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> &Archetype {
        &self.archetypes[slot]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, slot: usize) -> &mut Archetype {
        &mut self.archetypes[slot]
    }

    pub(crate) fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub(crate) fn archetypes_mut(&mut self) -> &mut [Archetype] {
        &mut self.archetypes
    }

    pub(crate) fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Bumped once per archetype creation; never decreases.
    pub(crate) fn structural_version(&self) -> u64 {
        self.structural_version
    }

    /// Disjoint mutable access to two distinct archetypes, for row
    /// migration.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Archetype, &mut Archetype) {
        debug_assert_ne!(a, b);
        if a < b {
            let (left, right) = self.archetypes.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.archetypes.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_empty_archetype_bootstrapped() {
        let registry = ComponentRegistry::new();
        let index = ArchetypeIndex::new(&registry);
        assert_eq!(index.len(), 1);
        assert!(index.get(EMPTY_ARCHETYPE).mask().is_empty());
        assert_eq!(index.structural_version(), 1);
    }

    #[test]
    fn test_one_archetype_per_mask() {
        let mut registry = ComponentRegistry::new();
        let info = registry.register::<Position>();
        let mut index = ArchetypeIndex::new(&registry);

        let mask = ComponentMask::from_ids(&[info.id]);
        let a = index.get_or_create(mask, &registry);
        let b = index.get_or_create(mask, &registry);

        assert_eq!(a, b);
        assert_eq!(index.len(), 2);
        assert_eq!(index.structural_version(), 2);
        assert_eq!(index.lookup(&mask), Some(a));
        assert_eq!(index.get(a).index(), a);
    }
}
