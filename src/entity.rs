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

//! Entity handles and the slot directory
//!
//! An [`Entity`] is a generational handle `(id, version)`. The directory maps
//! ids to dense slots holding the entity's archetype, row, and current
//! version; a stale handle is detected by version mismatch and never panics.
//! Freed ids go on a free-list and are recycled with a bumped version.
//! Version 0 is reserved for "never allocated / freed".

/// Sentinel archetype value for free slots.
const NO_ARCHETYPE: u32 = u32::MAX;

/// Opaque generational entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u32,
    version: u32,
}

impl Entity {
    pub(crate) fn new(id: u32, version: u32) -> Self {
        Self { id, version }
    }

    /// Slot index in the entity directory.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Generation counter; live handles carry a version >= 1.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Where an entity currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype_id: usize,
    pub archetype_row: usize,
}

/// One slot per possible entity id.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntitySlot {
    /// `NO_ARCHETYPE` when free.
    pub archetype: u32,
    /// `-1` when free.
    pub row: i32,
    /// 0 means never allocated; bumped on free, wrapping 0 -> 1.
    pub version: u32,
}

impl EntitySlot {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.archetype == NO_ARCHETYPE
    }
}

/// Dense entity slot table with a free-list of reusable ids
pub struct EntityDirectory {
    slots: Vec<EntitySlot>,
    free: Vec<u32>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate an id, preferring the free-list. The returned handle carries
    /// the slot's current version; the caller places the entity and records
    /// its location with [`relocate`](Self::relocate).
    pub(crate) fn allocate(&mut self) -> Entity {
        if let Some(id) = self.free.pop() {
            let slot = &self.slots[id as usize];
            debug_assert!(slot.is_free());
            return Entity::new(id, slot.version);
        }

        let id = self.slots.len();
        assert!(id < u32::MAX as usize, "entity id space exhausted");
        self.slots.push(EntitySlot {
            archetype: NO_ARCHETYPE,
            row: -1,
            version: 1,
        });
        Entity::new(id as u32, 1)
    }

    /// Free a live handle: mark the slot free, bump its version (wrapping
    /// 0 -> 1) and push the id onto the free-list. Returns the entity's old
    /// location, or `None` for a stale handle.
    pub(crate) fn free(&mut self, entity: Entity) -> Option<EntityLocation> {
        let slot = self.slots.get_mut(entity.id() as usize)?;
        if slot.is_free() || slot.version != entity.version() {
            return None;
        }

        let location = EntityLocation {
            archetype_id: slot.archetype as usize,
            archetype_row: slot.row as usize,
        };

        slot.archetype = NO_ARCHETYPE;
        slot.row = -1;
        slot.version = next_version(slot.version);
        self.free.push(entity.id());

        Some(location)
    }

    /// Slot exists and its version matches the handle's.
    pub fn is_valid(&self, entity: Entity) -> bool {
        match self.slots.get(entity.id() as usize) {
            Some(slot) => !slot.is_free() && slot.version == entity.version(),
            None => false,
        }
    }

    /// Current location of a live handle; `None` for stale handles.
    pub(crate) fn location(&self, entity: Entity) -> Option<EntityLocation> {
        let slot = self.slots.get(entity.id() as usize)?;
        if slot.is_free() || slot.version != entity.version() {
            return None;
        }
        Some(EntityLocation {
            archetype_id: slot.archetype as usize,
            archetype_row: slot.row as usize,
        })
    }

    /// Record where an entity now lives. The slot's version is untouched.
    pub(crate) fn relocate(&mut self, id: u32, archetype: usize, row: usize) {
        let slot = &mut self.slots[id as usize];
        slot.archetype = archetype as u32;
        slot.row = row as i32;
    }

    /// Free every live slot and rebuild the free-list in ascending id order.
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            if !slot.is_free() {
                slot.archetype = NO_ARCHETYPE;
                slot.row = -1;
                slot.version = next_version(slot.version);
            }
        }
        self.free.clear();
        self.free.extend(0..self.slots.len() as u32);
    }

    /// Number of live (occupied) slots.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn raw_slots(&self) -> &[EntitySlot] {
        &self.slots
    }
}

impl Default for EntityDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn next_version(version: u32) -> u32 {
    let next = version.wrapping_add(1);
    if next == 0 {
        1
    } else {
        next
    }
}
