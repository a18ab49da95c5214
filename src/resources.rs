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

//! Typed singleton container
//!
//! At most one instance per type. `add` returns a recyclable integer slot;
//! adding an existing type is an error. The container has no interaction
//! with entity storage.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use crate::error::{EcsError, Result};

/// Generic singleton container keyed by type
pub struct Resources {
    slots: Vec<Option<Box<dyn Any + Send + Sync>>>,
    by_type: FxHashMap<TypeId, usize>,
    free: Vec<usize>,
}

impl Resources {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            by_type: FxHashMap::default(),
            free: Vec::new(),
        }
    }

    /// Store a resource, returning its slot id. Slot ids are recycled after
    /// removal. Errors if a resource of this type already exists.
    pub fn add<R: Send + Sync + 'static>(&mut self, resource: R) -> Result<usize> {
        let type_id = TypeId::of::<R>();
        if self.by_type.contains_key(&type_id) {
            return Err(EcsError::ResourceAlreadyExists(std::any::type_name::<R>()));
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(Box::new(resource));
                slot
            }
            None => {
                self.slots.push(Some(Box::new(resource)));
                self.slots.len() - 1
            }
        };
        self.by_type.insert(type_id, slot);
        Ok(slot)
    }

    /// Check if a resource of type `R` exists.
    pub fn has<R: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<R>())
    }

    /// Immutable reference to the stored resource, if any.
    pub fn get<R: 'static>(&self) -> Option<&R> {
        let &slot = self.by_type.get(&TypeId::of::<R>())?;
        self.slots[slot].as_ref()?.downcast_ref()
    }

    /// Mutable reference to the stored resource, if any.
    pub fn get_mut<R: 'static>(&mut self) -> Option<&mut R> {
        let &slot = self.by_type.get(&TypeId::of::<R>())?;
        self.slots[slot].as_mut()?.downcast_mut()
    }

    /// Remove and return the stored resource, recycling its slot.
    pub fn remove<R: 'static>(&mut self) -> Option<R> {
        let slot = self.by_type.remove(&TypeId::of::<R>())?;
        let boxed = self.slots[slot].take()?;
        self.free.push(slot);
        boxed.downcast::<R>().ok().map(|b| *b)
    }

    /// Drop every resource and reset the slot table.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.by_type.clear();
        self.free.clear();
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}
