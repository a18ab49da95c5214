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

//! Per-world component type registry
//!
//! Assigns each distinct component type a compact 8-bit id in first-seen
//! order and records its byte size and alignment. Ids are never recycled and
//! are meaningful only within their world. Capping ids at 256 keeps the
//! component mask a stack value and lets archetypes index their column
//! tables directly by id.

use std::any::TypeId;

use rustc_hash::FxHashMap;

use crate::component::Component;
use crate::error::{EcsError, Result};

/// Maximum number of distinct component types per world.
pub const MAX_COMPONENT_TYPES: usize = 256;

/// Layout descriptor for one registered component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Compact per-world id, assigned in first-seen order.
    pub id: u8,
    /// Row byte size, `size_of::<T>()`.
    pub size: usize,
    /// Native alignment, `align_of::<T>()`.
    pub align: usize,
}

struct ComponentMeta {
    size: usize,
    align: usize,
    name: &'static str,
}

/// Component type registry, one per world
pub struct ComponentRegistry {
    ids: FxHashMap<TypeId, u8>,
    metas: Vec<ComponentMeta>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            metas: Vec::new(),
        }
    }

    /// Register `T`, or return its existing info. Idempotent.
    ///
    /// # Panics
    /// Panics if a 257th distinct component type is registered.
    pub fn register<T: Component>(&mut self) -> ComponentInfo {
        match self.try_register::<T>() {
            Ok(info) => info,
            Err(err) => panic!("{err} (while registering {})", std::any::type_name::<T>()),
        }
    }

    /// Fallible form of [`register`](Self::register).
    pub fn try_register<T: Component>(&mut self) -> Result<ComponentInfo> {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.ids.get(&type_id) {
            return Ok(self.info(id));
        }

        if self.metas.len() >= MAX_COMPONENT_TYPES {
            return Err(EcsError::TooManyComponentTypes);
        }

        let id = self.metas.len() as u8;
        self.metas.push(ComponentMeta {
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            name: std::any::type_name::<T>(),
        });
        self.ids.insert(type_id, id);
        Ok(ComponentInfo {
            id,
            size: self.metas[id as usize].size,
            align: self.metas[id as usize].align,
        })
    }

    /// Info for an already-registered type, `None` if unseen.
    pub fn lookup<T: Component>(&self) -> Option<ComponentInfo> {
        let &id = self.ids.get(&TypeId::of::<T>())?;
        Some(self.info(id))
    }

    /// Info for a registered id. Constant after registration.
    ///
    /// # Panics
    /// Panics if `id` was never assigned.
    pub fn info(&self, id: u8) -> ComponentInfo {
        let meta = &self.metas[id as usize];
        ComponentInfo {
            id,
            size: meta.size,
            align: meta.align,
        }
    }

    /// Type name for a registered id, for diagnostics.
    pub fn name(&self, id: u8) -> &'static str {
        self.metas[id as usize].name
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
