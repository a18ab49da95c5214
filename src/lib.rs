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

//! Lattice ECS - mask-indexed archetype Entity Component System
//!
//! Entities are generational handles into dense archetype storage: one raw,
//! aligned byte column per component type, iterated in cache-friendly order
//! through persistent, version-cached filters.

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod event_bus;
pub mod index;
pub mod mask;
pub mod prelude;
pub mod query;
pub mod registry;
pub mod resources;
pub mod world;

mod transition;

// Re-exports for convenience
pub use archetype::Archetype;
pub use component::{Bundle, Component, ComponentSet};
pub use entity::{Entity, EntityLocation};
pub use error::{EcsError, Result};
pub use event_bus::EventBus;
pub use mask::ComponentMask;
pub use query::Filter;
pub use registry::{ComponentInfo, ComponentRegistry, MAX_COMPONENT_TYPES};
pub use resources::Resources;
pub use world::World;
