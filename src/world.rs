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

//! World: central entity and archetype storage
//!
//! The world bundles the component registry, the entity directory, the
//! archetype index, and the transition caches, and routes every structural
//! change through the migration path. Two counters drive filter caching:
//! `structural_version` (archetype creation) and `mutation_version` (any
//! change that creates, removes, or moves an entity; in-place value writes
//! do not count).
//!
//! A world is owned by one logical actor. It is `Send` but deliberately not
//! `Sync`; multi-threaded access requires external synchronization.

use std::cell::Cell;
use std::marker::PhantomData;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::Archetype;
use crate::component::{Bundle, Component, ComponentSet};
use crate::entity::{Entity, EntityDirectory, EntityLocation};
use crate::index::{ArchetypeIndex, EMPTY_ARCHETYPE};
use crate::mask::ComponentMask;
use crate::registry::{ComponentInfo, ComponentRegistry};
use crate::transition::{build_copy_plan, Transition, TransitionCache};

/// Central ECS world
pub struct World {
    /// Per-world component type ids; never shared across worlds
    registry: ComponentRegistry,

    /// Entity id -> (archetype, row, version) slots with free-list
    directory: EntityDirectory,

    /// Mask-keyed archetype storage and the structural version counter
    archetypes: ArchetypeIndex,

    /// Cached (source, delta-mask) -> (target, copy plan) transitions
    transitions: TransitionCache,

    /// Bumped on entity create/remove and archetype migration
    mutation_version: u64,

    /// Keeps the world !Sync; external synchronization is required for
    /// shared access across threads.
    _single_owner: PhantomData<Cell<u64>>,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        let registry = ComponentRegistry::new();
        let archetypes = ArchetypeIndex::new(&registry);
        Self {
            registry,
            directory: EntityDirectory::new(),
            archetypes,
            transitions: TransitionCache::new(),
            mutation_version: 0,
            _single_owner: PhantomData,
        }
    }

    // ========== Entity lifecycle ==========

    /// Allocate an entity with no components.
    ///
    /// The id comes from the free-list when one is available; the version is
    /// always >= 1.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.directory.allocate();
        let archetype = self.archetypes.get_mut(EMPTY_ARCHETYPE);
        let row = archetype.push_zeroed(entity);
        self.directory.relocate(entity.id(), EMPTY_ARCHETYPE, row);
        self.mutation_version += 1;
        entity
    }

    /// Bulk form of [`create_entity`](Self::create_entity); amortizes column
    /// growth. Which free-list ids are consumed first is
    /// implementation-defined.
    pub fn create_entities(&mut self, count: usize) -> Vec<Entity> {
        self.archetypes.get_mut(EMPTY_ARCHETYPE).reserve_rows(count);

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let entity = self.directory.allocate();
            let archetype = self.archetypes.get_mut(EMPTY_ARCHETYPE);
            let row = archetype.push_zeroed(entity);
            self.directory.relocate(entity.id(), EMPTY_ARCHETYPE, row);
            out.push(entity);
        }
        self.mutation_version += count as u64;
        out
    }

    /// Remove an entity, swap-filling its row. Stale handles are a no-op
    /// returning `false`.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        let Some(location) = self.directory.free(entity) else {
            return false;
        };

        let archetype = self.archetypes.get_mut(location.archetype_id);
        if let Some(swapped) = archetype.swap_remove(location.archetype_row) {
            self.directory
                .relocate(swapped.id(), location.archetype_id, location.archetype_row);
        }
        self.mutation_version += 1;
        true
    }

    /// Bulk form of [`remove_entity`](Self::remove_entity). Returns how many
    /// handles were live.
    pub fn remove_entities(&mut self, entities: &[Entity]) -> usize {
        let mut removed = 0;
        for &entity in entities {
            if self.remove_entity(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Drop every entity: reset all archetypes to zero rows and free every
    /// live slot. Archetypes, component ids, and column capacity survive.
    pub fn clear_entities(&mut self) {
        for archetype in self.archetypes.archetypes_mut() {
            archetype.clear_rows();
        }
        self.directory.clear();
        self.mutation_version += 1;
    }

    /// Slot exists and its version matches the handle's.
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.directory.is_valid(entity)
    }

    /// Current location of a live handle.
    pub fn location(&self, entity: Entity) -> Option<EntityLocation> {
        self.directory.location(entity)
    }

    // ========== Spawning with components ==========

    /// Create an entity directly inside the bundle's archetype and write the
    /// bundle's values. One placement; equivalent to create + set.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.spawn", archetype_count = self.archetypes.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let ids = B::register(&mut self.registry);
        let mask = ComponentMask::from_ids(&ids);
        let slot = self.archetypes.get_or_create(mask, &self.registry);

        let entity = self.directory.allocate();
        let archetype = self.archetypes.get_mut(slot);
        let row = archetype.push_zeroed(entity);
        let columns =
            B::columns(archetype, &self.registry).expect("spawn target has the bundle's columns");
        unsafe { bundle.write(&columns, row) };

        self.directory.relocate(entity.id(), slot, row);
        self.mutation_version += 1;
        entity
    }

    /// Spawn many entities with the same bundle type, reserving rows once.
    pub fn spawn_batch<B, I>(&mut self, bundles: I) -> Vec<Entity>
    where
        B: Bundle,
        I: IntoIterator<Item = B>,
        I::IntoIter: ExactSizeIterator,
    {
        let bundles = bundles.into_iter();
        let count = bundles.len();
        if count == 0 {
            return Vec::new();
        }

        let ids = B::register(&mut self.registry);
        let mask = ComponentMask::from_ids(&ids);
        let slot = self.archetypes.get_or_create(mask, &self.registry);
        self.archetypes.get_mut(slot).reserve_rows(count);

        let mut out = Vec::with_capacity(count);
        for bundle in bundles {
            let entity = self.directory.allocate();
            let archetype = self.archetypes.get_mut(slot);
            let row = archetype.push_zeroed(entity);
            let columns = B::columns(archetype, &self.registry)
                .expect("spawn target has the bundle's columns");
            unsafe { bundle.write(&columns, row) };
            self.directory.relocate(entity.id(), slot, row);
            out.push(entity);
        }
        self.mutation_version += count as u64;
        out
    }

    // ========== Component access ==========

    /// Immutable reference to a component on an entity. `None` for stale
    /// handles, unregistered types, and absent components.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let location = self.directory.location(entity)?;
        let info = self.registry.lookup::<T>()?;
        let archetype = self.archetypes.get(location.archetype_id);
        let ptr = archetype.component_ptr(info.id, location.archetype_row)?;
        Some(unsafe { &*(ptr.as_ptr() as *const T) })
    }

    /// Mutable reference to a component on an entity. An in-place write is
    /// not a structural change and invalidates no filter snapshot.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let location = self.directory.location(entity)?;
        let info = self.registry.lookup::<T>()?;
        let archetype = self.archetypes.get(location.archetype_id);
        let ptr = archetype.component_ptr(info.id, location.archetype_row)?;
        Some(unsafe { &mut *(ptr.as_ptr() as *mut T) })
    }

    /// Check if a live entity currently has component `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        match (self.directory.location(entity), self.registry.lookup::<T>()) {
            (Some(location), Some(info)) => {
                self.archetypes.get(location.archetype_id).has_component(info.id)
            }
            _ => false,
        }
    }

    // ========== Structural mutation ==========

    /// Write component values onto an entity, migrating it to a wider
    /// archetype when needed.
    ///
    /// When the entity's archetype already covers every component in the
    /// bundle the values are overwritten in place, which is not a structural
    /// change. Stale handles are a no-op returning `false`; an empty bundle
    /// is a no-op returning `true`.
    pub fn set<B: Bundle>(&mut self, entity: Entity, bundle: B) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        let ids = B::register(&mut self.registry);
        if ids.is_empty() {
            return true;
        }
        let delta = ComponentMask::from_ids(&ids);
        let source = location.archetype_id;

        if self.archetypes.get(source).mask().contains_all(&delta) {
            let archetype = self.archetypes.get(source);
            let columns = B::columns(archetype, &self.registry)
                .expect("source archetype covers the delta");
            unsafe { bundle.write(&columns, location.archetype_row) };
            return true;
        }

        let transition = self.add_transition_for(source, delta);
        let row = self.apply_transition(entity, source, location.archetype_row, &transition);
        let archetype = self.archetypes.get(transition.target);
        let columns =
            B::columns(archetype, &self.registry).expect("target archetype covers the delta");
        unsafe { bundle.write(&columns, row) };
        true
    }

    /// Add components without values; new columns stay zero-initialized and
    /// components already present keep their values. Adding zero components,
    /// or a set the entity already has, is a no-op reporting success.
    pub fn add<S: ComponentSet>(&mut self, entity: Entity) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        let ids = S::register(&mut self.registry);
        if ids.is_empty() {
            return true;
        }
        let delta = ComponentMask::from_ids(&ids);
        let source = location.archetype_id;

        if self.archetypes.get(source).mask().contains_all(&delta) {
            return true;
        }

        let transition = self.add_transition_for(source, delta);
        self.apply_transition(entity, source, location.archetype_row, &transition);
        true
    }

    /// Remove components from an entity, migrating it to a narrower
    /// archetype. Removing components the entity does not have is a no-op
    /// reporting success; stale handles return `false`.
    pub fn remove<S: ComponentSet>(&mut self, entity: Entity) -> bool {
        let Some(location) = self.directory.location(entity) else {
            return false;
        };
        let ids = S::register(&mut self.registry);
        if ids.is_empty() {
            return true;
        }
        let delta = ComponentMask::from_ids(&ids);
        let source = location.archetype_id;

        if !self.archetypes.get(source).mask().intersects(&delta) {
            return true;
        }

        let transition = self.remove_transition_for(source, delta);
        self.apply_transition(entity, source, location.archetype_row, &transition);
        true
    }

    fn add_transition_for(&mut self, source: usize, delta: ComponentMask) -> Transition {
        if let Some(transition) = self.transitions.add_transition(source, &delta) {
            return transition.clone();
        }

        let target_mask = self.archetypes.get(source).mask().union(&delta);
        let target = self.archetypes.get_or_create(target_mask, &self.registry);
        let plan = build_copy_plan(self.archetypes.get(source), self.archetypes.get(target));
        let transition = Transition { target, plan };
        self.transitions
            .insert_add(source, delta, transition.clone());
        transition
    }

    fn remove_transition_for(&mut self, source: usize, delta: ComponentMask) -> Transition {
        if let Some(transition) = self.transitions.remove_transition(source, &delta) {
            return transition.clone();
        }

        let target_mask = self.archetypes.get(source).mask().difference(&delta);
        let target = self.archetypes.get_or_create(target_mask, &self.registry);
        let plan = build_copy_plan(self.archetypes.get(source), self.archetypes.get(target));
        let transition = Transition { target, plan };
        self.transitions
            .insert_remove(source, delta, transition.clone());
        transition
    }

    /// Move one entity's row from `source` to the transition's target:
    /// append a zeroed row, run the copy plan, swap-remove the old row, and
    /// patch the directory entries of the entity and of whichever entity
    /// backfilled the hole.
    fn apply_transition(
        &mut self,
        entity: Entity,
        source: usize,
        source_row: usize,
        transition: &Transition,
    ) -> usize {
        debug_assert_ne!(source, transition.target);

        #[cfg(feature = "profiling")]
        let span = info_span!("world.migrate", source = source, target = transition.target);
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let (source_arch, target_arch) = self.archetypes.pair_mut(source, transition.target);
        let target_row = target_arch.push_zeroed(entity);

        for op in &transition.plan {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    source_arch.column(op.src_col as usize).row_ptr(source_row),
                    target_arch.column(op.dst_col as usize).row_ptr(target_row),
                    op.size,
                );
            }
        }

        if let Some(swapped) = source_arch.swap_remove(source_row) {
            self.directory.relocate(swapped.id(), source, source_row);
        }
        self.directory
            .relocate(entity.id(), transition.target, target_row);
        self.mutation_version += 1;
        target_row
    }

    // ========== Introspection ==========

    /// Register (or look up) a component type, returning its id and layout.
    pub fn register_component<T: Component>(&mut self) -> ComponentInfo {
        self.registry.register::<T>()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.directory.live_count()
    }

    /// Number of archetypes, including the empty one.
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Number of registered component types.
    pub fn component_type_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of cached archetype transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Bumped once per archetype creation; never decreases.
    pub fn structural_version(&self) -> u64 {
        self.archetypes.structural_version()
    }

    /// Bumped by every entity create/remove/migration; never decreases.
    pub fn mutation_version(&self) -> u64 {
        self.mutation_version
    }

    /// Get archetype by slot
    pub fn archetype(&self, slot: usize) -> Option<&Archetype> {
        self.archetype_list().get(slot)
    }

    pub(crate) fn archetype_list(&self) -> &[Archetype] {
        self.archetypes.archetypes()
    }

    pub(crate) fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Split borrow for mutable query iteration.
    pub(crate) fn query_parts_mut(&mut self) -> (&ComponentRegistry, &mut [Archetype]) {
        (&self.registry, self.archetypes.archetypes_mut())
    }

    /// Free every row of one archetype in bulk, returning how many entities
    /// were dropped. Used by filter-level bulk removal.
    pub(crate) fn free_archetype_rows(&mut self, slot: usize) -> usize {
        let archetype = self.archetypes.get_mut(slot);
        let count = archetype.len();
        for i in 0..count {
            let entity = archetype.entities()[i];
            self.directory.free(entity);
        }
        archetype.clear_rows();
        count
    }

    pub(crate) fn bump_mutation(&mut self) {
        self.mutation_version += 1;
    }

    /// Walk every cross-structure invariant and panic with diagnostics on
    /// the first violation. Debugging aid; the test suite calls this after
    /// every mutation sequence.
    pub fn assert_invariants(&self) {
        let mut live = 0usize;
        for (id, slot) in self.directory.raw_slots().iter().enumerate() {
            if slot.is_free() {
                continue;
            }
            live += 1;
            let archetype = self.archetypes.get(slot.archetype as usize);
            let row = slot.row as usize;
            assert!(
                row < archetype.len(),
                "slot {id}: row {row} out of bounds (size {})",
                archetype.len()
            );
            let stored = archetype.entities()[row];
            assert_eq!(
                stored.id() as usize,
                id,
                "slot {id}: archetype row holds entity {}",
                stored.id()
            );
            assert_eq!(stored.version(), slot.version, "slot {id}: version mismatch");
        }

        let mut total_rows = 0usize;
        for (slot_idx, archetype) in self.archetypes.archetypes().iter().enumerate() {
            total_rows += archetype.len();
            assert!(
                archetype.capacity() >= archetype.len(),
                "archetype {slot_idx}: capacity below size"
            );
            assert_eq!(
                self.archetypes.lookup(archetype.mask()),
                Some(slot_idx),
                "archetype {slot_idx}: mask is not uniquely indexed"
            );
            assert_eq!(archetype.index(), slot_idx, "archetype {slot_idx}: stale self-index");

            for (row, &entity) in archetype.entities().iter().enumerate() {
                let location = self
                    .directory
                    .location(entity)
                    .unwrap_or_else(|| panic!("archetype {slot_idx} row {row}: dangling entity"));
                assert_eq!(location.archetype_id, slot_idx);
                assert_eq!(location.archetype_row, row);
            }
        }

        assert_eq!(
            total_rows, live,
            "sum of archetype sizes does not match live slot count"
        );
        assert_eq!(live, self.directory.live_count());
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
