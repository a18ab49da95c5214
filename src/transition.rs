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

//! Cached archetype transitions for structural changes
//!
//! A structural change moves an entity's row from a source archetype to a
//! target archetype. The copy plan for one `(source, delta-mask)` pair never
//! changes once both archetypes exist, so plans are computed once and cached
//! in flat tables keyed by `(source slot, exact delta mask)`, one table for
//! adds and one for removes. The caches grow monotonically.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::archetype::Archetype;
use crate::mask::ComponentMask;

/// One column copy of a migration: move `size` bytes of the row from the
/// source column slot to the target column slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CopyOp {
    pub src_col: u16,
    pub dst_col: u16,
    pub size: usize,
}

/// Resolved target plus the copy plan covering every shared component.
#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub target: usize,
    pub plan: SmallVec<[CopyOp; 8]>,
}

/// Two-level transition cache, flattened to `(source slot, delta mask)` keys
pub(crate) struct TransitionCache {
    add: AHashMap<(usize, ComponentMask), Transition>,
    remove: AHashMap<(usize, ComponentMask), Transition>,
}

impl TransitionCache {
    pub fn new() -> Self {
        Self {
            // Start with reasonable defaults to avoid resize spikes
            add: AHashMap::with_capacity(128),
            remove: AHashMap::with_capacity(128),
        }
    }

    pub fn add_transition(&self, source: usize, delta: &ComponentMask) -> Option<&Transition> {
        self.add.get(&(source, *delta))
    }

    pub fn insert_add(&mut self, source: usize, delta: ComponentMask, transition: Transition) {
        self.add.insert((source, delta), transition);
    }

    pub fn remove_transition(&self, source: usize, delta: &ComponentMask) -> Option<&Transition> {
        self.remove.get(&(source, *delta))
    }

    pub fn insert_remove(&mut self, source: usize, delta: ComponentMask, transition: Transition) {
        self.remove.insert((source, delta), transition);
    }

    pub fn len(&self) -> usize {
        self.add.len() + self.remove.len()
    }
}

/// Build the copy plan covering exactly the components present in both
/// archetypes, ordered by ascending component id so every shared component
/// moves exactly once, deterministically.
pub(crate) fn build_copy_plan(source: &Archetype, target: &Archetype) -> SmallVec<[CopyOp; 8]> {
    let shared = source.mask().intersection(target.mask());
    let mut plan = SmallVec::new();

    for id in shared.ones() {
        let src_col = source.column_slot(id).expect("id in source mask");
        let dst_col = target.column_slot(id).expect("id in target mask");
        plan.push(CopyOp {
            src_col: src_col as u16,
            dst_col: dst_col as u16,
            size: source.column(src_col).item_size(),
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentRegistry;

    #[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Health(u64);

    #[test]
    fn test_plan_covers_shared_components_in_id_order() {
        let mut registry = ComponentRegistry::new();
        let p = registry.register::<Position>();
        let h = registry.register::<Health>();

        let source = Archetype::new(ComponentMask::from_ids(&[p.id, h.id]), &registry, 1);
        let target = Archetype::new(ComponentMask::from_ids(&[p.id]), &registry, 2);

        let plan = build_copy_plan(&source, &target);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].src_col, 0);
        assert_eq!(plan[0].dst_col, 0);
        assert_eq!(plan[0].size, std::mem::size_of::<Position>());
    }

    #[test]
    fn test_cache_keys_by_source_and_delta() {
        let mut cache = TransitionCache::new();
        let delta = ComponentMask::from_ids(&[3]);

        cache.insert_add(
            0,
            delta,
            Transition {
                target: 1,
                plan: SmallVec::new(),
            },
        );

        assert!(cache.add_transition(0, &delta).is_some());
        assert!(cache.add_transition(1, &delta).is_none());
        assert!(cache.remove_transition(0, &delta).is_none());
        assert_eq!(cache.len(), 1);
    }
}
