//! Common imports for downstream crates
//!
//! ```ignore
//! use lattice_ecs::prelude::*;
//! ```

pub use crate::component::{Bundle, Component, ComponentSet};
pub use crate::entity::{Entity, EntityLocation};
pub use crate::error::{EcsError, Result};
pub use crate::event_bus::EventBus;
pub use crate::mask::ComponentMask;
pub use crate::query::Filter;
pub use crate::registry::ComponentInfo;
pub use crate::resources::Resources;
pub use crate::world::World;
