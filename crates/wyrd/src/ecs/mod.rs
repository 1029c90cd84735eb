//! # ECS — Entities, Components, Systems
//!
//! The core loop of this crate: entities are plain ids, components are data
//! attached to an id, and systems are logic units that automatically track
//! the subset of entities whose components match a declared
//! [`Filter`](filter::Filter).
//!
//! Structural changes (enable, disable, refresh, remove) are *recorded*, not
//! applied on the spot: [`World`](world::World) queues them and
//! [`Scene::update`](scene::Scene::update) drains the queue once per tick
//! before running the systems. That indirection is what lets a callback
//! create or destroy entities mid-iteration without corrupting the very
//! collections being iterated.

use std::fmt;

pub mod event;
pub mod filter;
pub mod mask;
pub mod pool;
pub mod registry;
pub mod scene;
pub mod schedule;
pub mod store;
pub mod system;
pub mod world;

/// The maximum number of distinct component kinds an entity can hold.
///
/// Also the width of the occupancy [`Mask`](mask::Mask): bit *i* is set iff
/// the entity owns a component with type id *i*.
pub const MAX_COMPONENTS: usize = 64;

/// The maximum number of distinct system kinds a scene can register.
pub const MAX_SYSTEMS: usize = 64;

/// The maximum number of distinct event kinds a scene can dispatch.
pub const MAX_EVENTS: usize = 64;

/// A lightweight handle to an entity. Cheap to copy — it's just an id.
///
/// An `Entity` does not "contain" anything; all state lives in
/// [`World`](world::World)-owned rows keyed by this id. Ids are dense and
/// reused: removing an entity returns its id to a pool, and a later create
/// hands the same id out again. There is **no** generation counter, so a
/// handle captured before a remove/create cycle will alias the reissued id —
/// callers that hold handles across ticks must treat a removed entity's
/// handle as dead themselves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub(crate) u32);

impl Entity {
    /// Returns the raw id. Useful for diagnostics, not for general use.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Row index into the world's entity and component tables.
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
