//! # Error — What Can Go Wrong
//!
//! Every fallible operation in the crate returns [`Error`]. The variants map
//! one-to-one onto the ways a caller can hand us something we can't act on:
//! a stale entity id, a component that was never added, a system that was
//! never registered, a duplicate entity name, or a type registry that ran
//! out of slots.
//!
//! Failures triggered *inside* deferred-action replay or a system callback
//! are a different story: those are logged and contained at the action or
//! system boundary so one bad actor can't stall the whole tick. See
//! [`Scene::update`](crate::ecs::scene::Scene::update).

use thiserror::Error;

use crate::ecs::Entity;

/// Errors surfaced by direct API calls on the [`World`](crate::ecs::world::World)
/// and [`Scene`](crate::ecs::scene::Scene).
#[derive(Debug, Error)]
pub enum Error {
    /// The entity id is out of range or has been removed.
    #[error("entity {0} is not valid")]
    InvalidEntity(Entity),

    /// The component type id exceeds the per-entity slot capacity.
    #[error("component `{type_name}` has type id {type_id}, beyond the slot capacity {capacity}")]
    InvalidComponent {
        type_name: &'static str,
        type_id: usize,
        capacity: usize,
    },

    /// The entity does not currently own a component of the requested type.
    #[error("entity {entity} has no `{type_name}` component")]
    ComponentNotFound {
        entity: Entity,
        type_name: &'static str,
    },

    /// No system of the requested type is registered with the scene.
    #[error("scene has no `{type_name}` system")]
    SystemNotFound { type_name: &'static str },

    /// An entity with this name already exists.
    #[error("entity name \"{0}\" is already in use")]
    NameCollision(String),

    /// A type id category (component, system, or event kinds) is exhausted.
    ///
    /// Ids are assigned on first use and never recycled, so this fires on
    /// the first registration past the cap rather than silently truncating.
    #[error("{category} type registry is full ({capacity} kinds)")]
    RegistryFull {
        category: &'static str,
        capacity: usize,
    },
}
