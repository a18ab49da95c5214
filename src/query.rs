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

//! Persistent filters over component masks
//!
//! A [`Filter`] matches every archetype whose mask is a superset of the
//! required set and disjoint from the excluded set; the empty required set
//! matches only the no-components archetype. Each filter caches its
//! matching-archetype list and a flat entity snapshot, invalidated against
//! the world's structural and mutation version counters.
//!
//! Iteration order is archetype creation order, then ascending row.
//! Pointers yielded during iteration stay valid until the next structural
//! change; in-place value writes during iteration are supported.

use std::marker::PhantomData;
use std::ptr::NonNull;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::Archetype;
use crate::component::ComponentSet;
use crate::entity::Entity;
use crate::mask::ComponentMask;
use crate::registry::ComponentRegistry;
use crate::world::World;

/// Persistent query over a required component tuple `Q` and an optional
/// excluded set
pub struct Filter<Q: ComponentSet> {
    required: ComponentMask,
    excluded: ComponentMask,

    /// Archetype slots currently passing the mask test, creation order.
    matches: Vec<usize>,

    /// Flat entity snapshot across all matches.
    snapshot: Vec<Entity>,
    snapshot_valid: bool,

    last_structural: u64,
    last_mutation: u64,

    _marker: PhantomData<fn(Q)>,
}

impl<Q: ComponentSet> Filter<Q> {
    /// Build a filter requiring every component in `Q`, registering them as
    /// needed.
    pub fn new(world: &mut World) -> Self {
        let ids = Q::register(world.registry_mut());
        let mut filter = Self {
            required: ComponentMask::from_ids(&ids),
            excluded: ComponentMask::EMPTY,
            matches: Vec::new(),
            snapshot: Vec::new(),
            snapshot_valid: false,
            last_structural: 0,
            last_mutation: 0,
            _marker: PhantomData,
        };
        filter.rescan(world);
        filter.last_structural = world.structural_version();
        filter
    }

    /// Additionally exclude every component in `X`.
    pub fn exclude<X: ComponentSet>(mut self, world: &mut World) -> Self {
        let ids = X::register(world.registry_mut());
        for &id in &ids {
            self.excluded.set(id);
        }
        self.rescan(world);
        self.last_structural = world.structural_version();
        self.snapshot_valid = false;
        self
    }

    /// Required mask of this filter.
    pub fn required(&self) -> &ComponentMask {
        &self.required
    }

    /// Excluded mask of this filter.
    pub fn excluded(&self) -> &ComponentMask {
        &self.excluded
    }

    /// Number of archetypes passing the filter as of the last refresh.
    pub fn matching_archetype_count(&self) -> usize {
        self.matches.len()
    }

    fn archetype_matches(&self, mask: &ComponentMask) -> bool {
        if self.required.is_empty() {
            // A no-components query matches only the no-components
            // archetype, not every entity in the world.
            mask.is_empty()
        } else {
            mask.contains_all(&self.required) && !mask.intersects(&self.excluded)
        }
    }

    /// Re-sync the matching-archetype list against the structural version.
    fn refresh(&mut self, world: &World) {
        let structural = world.structural_version();
        if structural != self.last_structural {
            self.rescan(world);
            self.last_structural = structural;
            self.snapshot_valid = false;
        }
    }

    fn rescan(&mut self, world: &World) {
        #[cfg(feature = "profiling")]
        let span = info_span!("filter.rescan", archetype_count = world.archetype_count());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        self.matches.clear();
        for (slot, archetype) in world.archetype_list().iter().enumerate() {
            if self.archetype_matches(archetype.mask()) {
                self.matches.push(slot);
            }
        }
    }

    /// Iterate matching entities with shared component references.
    pub fn iter<'a>(&'a mut self, world: &'a World) -> FilterIter<'a, Q> {
        self.refresh(world);
        FilterIter {
            world,
            matches: &self.matches,
            cursor: 0,
            row: 0,
            state: None,
        }
    }

    /// Iterate matching entities with mutable component references.
    ///
    /// Value writes through the yielded references are in-place mutations:
    /// they change no archetype and invalidate no snapshot.
    pub fn iter_mut<'a>(&'a mut self, world: &'a mut World) -> FilterIterMut<'a, Q> {
        self.refresh(world);

        let (registry, archetypes) = world.query_parts_mut();
        let mut matched = Vec::with_capacity(self.matches.len());
        for &slot in &self.matches {
            matched.push(NonNull::from(&mut archetypes[slot]));
        }

        FilterIterMut {
            registry,
            archetypes: matched,
            cursor: 0,
            row: 0,
            state: None,
            _world: PhantomData,
        }
    }

    /// Materialized snapshot of every entity currently matching.
    ///
    /// Rebuilt when the structural version changes (archetype list first) or
    /// when the mutation version changes; otherwise served from cache.
    pub fn entities(&mut self, world: &World) -> &[Entity] {
        self.refresh(world);

        let mutation = world.mutation_version();
        if !self.snapshot_valid || self.last_mutation != mutation {
            self.snapshot.clear();
            for &slot in &self.matches {
                let archetype = &world.archetype_list()[slot];
                if archetype.is_empty() {
                    continue;
                }
                self.snapshot.extend_from_slice(archetype.entities());
            }
            self.last_mutation = mutation;
            self.snapshot_valid = true;
        }

        &self.snapshot
    }

    /// Number of entities currently matching.
    pub fn count(&mut self, world: &World) -> usize {
        self.refresh(world);
        self.matches
            .iter()
            .map(|&slot| world.archetype_list()[slot].len())
            .sum()
    }

    /// Remove every matching entity, archetype by archetype: reset each
    /// matching archetype to zero rows and free its entity ids in bulk.
    pub fn remove_entities(&mut self, world: &mut World) {
        self.refresh(world);

        let mut removed = 0;
        for &slot in &self.matches {
            removed += world.free_archetype_rows(slot);
        }
        if removed > 0 {
            world.bump_mutation();
        }
        self.snapshot_valid = false;
    }
}

/// Per-archetype iteration state: resolved columns plus the entity column.
struct ArchetypeState<C> {
    columns: C,
    entities: *const Entity,
    len: usize,
}

/// Shared-reference filter iterator
pub struct FilterIter<'w, Q: ComponentSet> {
    world: &'w World,
    matches: &'w [usize],
    cursor: usize,
    row: usize,
    state: Option<ArchetypeState<Q::Columns>>,
}

impl<'w, Q: ComponentSet> Iterator for FilterIter<'w, Q> {
    type Item = (Entity, Q::Refs<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Acquire state for the next non-empty archetype if we have none
            if self.state.is_none() {
                if self.cursor >= self.matches.len() {
                    return None;
                }

                let archetype = &self.world.archetype_list()[self.matches[self.cursor]];
                if archetype.is_empty() {
                    self.cursor += 1;
                    continue;
                }

                match Q::columns(archetype, self.world.registry()) {
                    Some(columns) => {
                        self.state = Some(ArchetypeState {
                            columns,
                            entities: archetype.entities().as_ptr(),
                            len: archetype.len(),
                        });
                        self.row = 0;
                    }
                    None => {
                        self.cursor += 1;
                        continue;
                    }
                }
            }

            let state = self.state.as_ref().unwrap();
            if self.row >= state.len {
                self.state = None;
                self.cursor += 1;
                continue;
            }

            let row = self.row;
            self.row += 1;

            // SAFETY: row bounds checked above; the world is borrowed for 'w
            // so the archetype cannot change structurally underneath us.
            let entity = unsafe { *state.entities.add(row) };
            let item = unsafe { Q::refs_at(&state.columns, row) };
            return Some((entity, item));
        }
    }
}

/// Mutable-reference filter iterator
pub struct FilterIterMut<'w, Q: ComponentSet> {
    registry: &'w ComponentRegistry,
    archetypes: Vec<NonNull<Archetype>>,
    cursor: usize,
    row: usize,
    state: Option<ArchetypeState<Q::Columns>>,
    _world: PhantomData<&'w mut World>,
}

impl<'w, Q: ComponentSet> Iterator for FilterIterMut<'w, Q> {
    type Item = (Entity, Q::Muts<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.state.is_none() {
                if self.cursor >= self.archetypes.len() {
                    return None;
                }

                // SAFETY: pointers come from the exclusive world borrow held
                // for 'w; nothing else can touch these archetypes.
                let archetype = unsafe { self.archetypes[self.cursor].as_ref() };
                if archetype.is_empty() {
                    self.cursor += 1;
                    continue;
                }

                match Q::columns(archetype, self.registry) {
                    Some(columns) => {
                        self.state = Some(ArchetypeState {
                            columns,
                            entities: archetype.entities().as_ptr(),
                            len: archetype.len(),
                        });
                        self.row = 0;
                    }
                    None => {
                        self.cursor += 1;
                        continue;
                    }
                }
            }

            let state = self.state.as_ref().unwrap();
            if self.row >= state.len {
                self.state = None;
                self.cursor += 1;
                continue;
            }

            let row = self.row;
            self.row += 1;

            // SAFETY: bounds checked above; every (archetype, row) pair is
            // yielded at most once, so the mutable references never alias.
            let entity = unsafe { *state.entities.add(row) };
            let item = unsafe { Q::muts_at(&state.columns, row) };
            return Some((entity, item));
        }
    }
}
