//! Convenience re-exports — `use wyrd::prelude::*` for the common items.
//!
//! Types only — all functionality is discoverable through methods on types,
//! not free functions.

pub use crate::ecs::event::HandlerId;
pub use crate::ecs::filter::{Filter, FilterBuilder};
pub use crate::ecs::mask::Mask;
pub use crate::ecs::registry::{ComponentId, EventId, SystemId, TypeRegistry};
pub use crate::ecs::scene::Scene;
pub use crate::ecs::system::{Phase, System};
pub use crate::ecs::world::World;
pub use crate::ecs::{Entity, MAX_COMPONENTS, MAX_EVENTS, MAX_SYSTEMS};
pub use crate::error::Error;
