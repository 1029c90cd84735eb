//! # TypeRegistry — Stable Small-Integer Ids per Type
//!
//! Rust gives every type a [`TypeId`], but those are opaque hashes — useless
//! as bit indices. The registry assigns each distinct component, system, and
//! event type a dense `usize` id on first use, so masks and slot arrays can
//! be indexed directly.
//!
//! The three categories are independent id spaces: the first component type
//! gets component id 0, the first system type gets system id 0, and so on.
//! Each space is capped (64 kinds); registering a 65th kind is a reported
//! [`Error::RegistryFull`], never a silent truncation. Ids are never
//! recycled — they stay stable for the registry's lifetime, including across
//! [`Scene::clear`](super::scene::Scene::clear).

use std::any::TypeId;
use std::collections::HashMap;

use crate::ecs::{MAX_COMPONENTS, MAX_EVENTS, MAX_SYSTEMS};
use crate::error::Error;

/// Dense id of a component kind. Doubles as a bit index into a
/// [`Mask`](super::mask::Mask) and a slot index in the component store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) usize);

/// Dense id of a system kind. Doubles as a bit index into the per-entity
/// attachment mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) usize);

/// Dense id of an event kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId(pub(crate) usize);

impl ComponentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl SystemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl EventId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One capped id space: `TypeId` → dense index, first come first served.
struct IdSpace {
    ids: HashMap<TypeId, usize>,
    capacity: usize,
    category: &'static str,
}

impl IdSpace {
    fn new(capacity: usize, category: &'static str) -> Self {
        Self {
            ids: HashMap::new(),
            capacity,
            category,
        }
    }

    fn get_or_assign(&mut self, type_id: TypeId) -> Result<usize, Error> {
        if let Some(&id) = self.ids.get(&type_id) {
            return Ok(id);
        }
        if self.ids.len() >= self.capacity {
            return Err(Error::RegistryFull {
                category: self.category,
                capacity: self.capacity,
            });
        }
        let id = self.ids.len();
        self.ids.insert(type_id, id);
        Ok(id)
    }

    fn lookup(&self, type_id: TypeId) -> Option<usize> {
        self.ids.get(&type_id).copied()
    }
}

/// Assigns and remembers dense ids for component, system, and event types.
pub struct TypeRegistry {
    components: IdSpace,
    systems: IdSpace,
    events: IdSpace,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            components: IdSpace::new(MAX_COMPONENTS, "component"),
            systems: IdSpace::new(MAX_SYSTEMS, "system"),
            events: IdSpace::new(MAX_EVENTS, "event"),
        }
    }

    /// Id of component type `T`, assigning one on first use.
    pub fn component_id<T: 'static>(&mut self) -> Result<ComponentId, Error> {
        self.components.get_or_assign(TypeId::of::<T>()).map(ComponentId)
    }

    /// Id of component type `T` if it has been seen before.
    pub fn lookup_component<T: 'static>(&self) -> Option<ComponentId> {
        self.components.lookup(TypeId::of::<T>()).map(ComponentId)
    }

    /// Id of system type `T`, assigning one on first use.
    pub fn system_id<T: 'static>(&mut self) -> Result<SystemId, Error> {
        self.systems.get_or_assign(TypeId::of::<T>()).map(SystemId)
    }

    /// Id of event type `T`, assigning one on first use.
    pub fn event_id<T: 'static>(&mut self) -> Result<EventId, Error> {
        self.events.get_or_assign(TypeId::of::<T>()).map(EventId)
    }

    /// Id of event type `T` if it has been seen before.
    pub fn lookup_event<T: 'static>(&self) -> Option<EventId> {
        self.events.lookup(TypeId::of::<T>()).map(EventId)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
