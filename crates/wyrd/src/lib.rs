//! # Wyrd — Entity Component System Runtime
//!
//! A small, single-threaded ECS core: entities are dense reusable ids,
//! components are type-erased data attached to an id, and systems are logic
//! units whose entity membership is kept current automatically from a
//! declared component filter.
//!
//! Structural changes are deferred: enabling, disabling, refreshing, or
//! removing an entity is queued and applied at the top of the next
//! [`Scene::update`](ecs::scene::Scene::update), so system callbacks can
//! reshape the world mid-iteration without invalidating the collections
//! being walked.
//!
//! Start with `use wyrd::prelude::*` and build a [`Scene`](ecs::scene::Scene).
//!
//! Diagnostics go through the [`log`] facade; install any `log::Log`
//! implementation to see them.

pub mod ecs;
pub mod error;
pub mod prelude;
