//! # World — Entity Rows, Components, Events
//!
//! The world owns every piece of per-entity state: a row table indexed by
//! entity id (validity, enabled flag, optional name, system-attachment
//! mask), the component store, the type registry, and the event bus. It does
//! **not** own the systems — that's the [`Scene`](super::scene::Scene)'s
//! half, and the split is what lets system hooks receive `&mut World`
//! while the scene is mid-walk over its system table.
//!
//! Structural operations (enable, disable, refresh, remove) don't take
//! effect when called. They are validated, queued as `Action`s, and
//! replayed by [`Scene::update`](super::scene::Scene::update) at the top of
//! the next tick. Component and event operations are immediate.

use std::any::Any;
use std::collections::HashMap;

use crate::ecs::event::{EventBus, HandlerId};
use crate::ecs::mask::Mask;
use crate::ecs::pool::EntityPool;
use crate::ecs::registry::{SystemId, TypeRegistry};
use crate::ecs::store::ComponentStore;
use crate::ecs::Entity;
use crate::error::Error;

/// A deferred structural change, replayed in enqueue order once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Mark the entity enabled and enable it in every attached system.
    Enable,
    /// Mark the entity disabled and disable it in every attached system.
    Disable,
    /// Re-match the entity's component mask against every system's filter.
    Refresh,
    /// Detach from every system, drop all components, recycle the id.
    Remove,
}

#[derive(Default)]
struct EntityRow {
    valid: bool,
    enabled: bool,
    name: Option<String>,
    /// Bit per [`SystemId`]: which systems this entity is attached to.
    attached: Mask,
}

/// All per-entity state plus the component store, type registry, and event
/// bus. Handed to every system hook.
pub struct World {
    rows: Vec<EntityRow>,
    names: HashMap<String, Entity>,
    components: ComponentStore,
    registry: TypeRegistry,
    events: EventBus,
    pool: EntityPool,
    actions: Vec<(Entity, Action)>,
}

impl World {
    pub(crate) fn new() -> Self {
        Self {
            rows: Vec::new(),
            names: HashMap::new(),
            components: ComponentStore::new(),
            registry: TypeRegistry::new(),
            events: EventBus::new(),
            pool: EntityPool::new(),
            actions: Vec::new(),
        }
    }

    // ── Entities ────────────────────────────────────────────────────────

    /// Creates an entity, valid and enabled immediately. An Enable action is
    /// queued so systems pick it up on the next tick.
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity(self.pool.create());
        let index = entity.index();
        while self.rows.len() <= index {
            self.rows.push(EntityRow::default());
        }
        self.components.resize(self.rows.len());
        self.rows[index] = EntityRow {
            valid: true,
            enabled: true,
            name: None,
            attached: Mask::EMPTY,
        };
        self.actions.push((entity, Action::Enable));
        entity
    }

    /// Creates a uniquely named entity.
    ///
    /// The name is checked *before* any allocation, so a collision has no
    /// side effects at all.
    pub fn create_entity_named(&mut self, name: impl Into<String>) -> Result<Entity, Error> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(Error::NameCollision(name));
        }
        let entity = self.create_entity();
        self.rows[entity.index()].name = Some(name.clone());
        self.names.insert(name, entity);
        Ok(entity)
    }

    /// Looks an entity up by name.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        self.names.get(name).copied()
    }

    /// The entity's name, `None` if it was created anonymously.
    pub fn entity_name(&self, entity: Entity) -> Result<Option<&str>, Error> {
        let row = self
            .rows
            .get(entity.index())
            .filter(|row| row.valid)
            .ok_or(Error::InvalidEntity(entity))?;
        Ok(row.name.as_deref())
    }

    /// Whether the id refers to a live entity.
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.rows
            .get(entity.index())
            .map(|row| row.valid)
            .unwrap_or(false)
    }

    /// Whether the entity is enabled. Reflects *applied* state — a queued
    /// Enable/Disable doesn't show here until the next tick.
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.rows
            .get(entity.index())
            .map(|row| row.valid && row.enabled)
            .unwrap_or(false)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.rows.iter().filter(|row| row.valid).count()
    }

    /// Every live entity, in row order.
    pub fn entities(&self) -> Vec<Entity> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.valid)
            .map(|(i, _)| Entity(i as u32))
            .collect()
    }

    /// Queues an Enable for the entity.
    pub fn enable_entity(&mut self, entity: Entity) -> Result<(), Error> {
        self.queue(entity, Action::Enable)
    }

    /// Queues a Disable for the entity.
    pub fn disable_entity(&mut self, entity: Entity) -> Result<(), Error> {
        self.queue(entity, Action::Disable)
    }

    /// Queues a Remove for the entity. The id stays valid until the action
    /// is replayed.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<(), Error> {
        self.queue(entity, Action::Remove)
    }

    /// Queues a Refresh: system membership is re-derived from the entity's
    /// component mask on the next tick.
    pub fn refresh_entity(&mut self, entity: Entity) -> Result<(), Error> {
        self.queue(entity, Action::Refresh)
    }

    /// Queues a Remove for every live entity.
    pub fn remove_all_entities(&mut self) {
        for entity in self.entities() {
            self.actions.push((entity, Action::Remove));
        }
    }

    fn queue(&mut self, entity: Entity, action: Action) -> Result<(), Error> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        self.actions.push((entity, action));
        Ok(())
    }

    // ── Components ──────────────────────────────────────────────────────

    /// Adds (or replaces) a `T` component on the entity. The component is
    /// readable immediately; a Refresh is queued so system membership
    /// catches up next tick.
    pub fn add_component<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), Error> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        let id = self.registry.component_id::<T>()?;
        self.components
            .insert(entity, id, std::any::type_name::<T>(), Box::new(component))?;
        self.actions.push((entity, Action::Refresh));
        Ok(())
    }

    /// Reference to the entity's `T` component.
    pub fn get_component<T: 'static>(&self, entity: Entity) -> Result<&T, Error> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        let id = self
            .registry
            .lookup_component::<T>()
            .ok_or(Error::ComponentNotFound {
                entity,
                type_name: std::any::type_name::<T>(),
            })?;
        self.components.get::<T>(entity, id)
    }

    /// Mutable reference to the entity's `T` component. In-place mutation
    /// does not queue a Refresh — membership depends on presence, not value.
    pub fn get_component_mut<T: 'static>(&mut self, entity: Entity) -> Result<&mut T, Error> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        let id = self
            .registry
            .lookup_component::<T>()
            .ok_or(Error::ComponentNotFound {
                entity,
                type_name: std::any::type_name::<T>(),
            })?;
        self.components.get_mut::<T>(entity, id)
    }

    /// Whether the entity owns a `T` component. Never fails; invalid
    /// entities and unseen types are simply `false`.
    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.is_valid(entity)
            && self
                .registry
                .lookup_component::<T>()
                .map(|id| self.components.has(entity, id))
                .unwrap_or(false)
    }

    /// Removes the entity's `T` component and queues a Refresh. Removing a
    /// component the entity doesn't own is a no-op.
    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> Result<(), Error> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        if let Some(id) = self.registry.lookup_component::<T>() {
            if self.components.has(entity, id) {
                self.components.remove(entity, id);
                self.actions.push((entity, Action::Refresh));
            }
        }
        Ok(())
    }

    /// Snapshot of the entity's component occupancy mask.
    pub fn component_mask(&self, entity: Entity) -> Mask {
        self.components.mask(entity)
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Subscribes a handler to event type `E`. Handlers for one event type
    /// run in registration order.
    pub fn connect<E: 'static>(
        &mut self,
        mut handler: impl FnMut(&E) + 'static,
    ) -> Result<HandlerId, Error> {
        let id = self.registry.event_id::<E>()?;
        Ok(self.events.connect(
            id,
            Box::new(move |value| {
                if let Some(event) = value.downcast_ref::<E>() {
                    handler(event);
                }
            }),
        ))
    }

    /// Dispatches `event` to every `E` handler, synchronously. A type with
    /// no subscribers is a no-op.
    pub fn emit<E: 'static>(&mut self, event: &E) {
        if let Some(id) = self.registry.lookup_event::<E>() {
            self.events.emit(id, event as &dyn Any);
        }
    }

    /// Unsubscribes one handler by ticket. Returns whether it was found.
    pub fn disconnect(&mut self, handler: HandlerId) -> bool {
        self.events.disconnect(handler)
    }

    /// Unsubscribes every handler for event type `E`.
    pub fn disconnect_all<E: 'static>(&mut self) {
        if let Some(id) = self.registry.lookup_event::<E>() {
            self.events.disconnect_all(id);
        }
    }

    /// Unsubscribes every handler for every event type.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    // ── Scene plumbing ──────────────────────────────────────────────────

    /// Takes the queued actions, leaving the queue empty. Actions queued by
    /// hooks during the replay land in the fresh queue for the next tick.
    pub(crate) fn take_actions(&mut self) -> Vec<(Entity, Action)> {
        std::mem::take(&mut self.actions)
    }

    pub(crate) fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub(crate) fn is_attached(&self, entity: Entity, system: SystemId) -> bool {
        self.rows
            .get(entity.index())
            .map(|row| row.attached.test(system.index()))
            .unwrap_or(false)
    }

    pub(crate) fn set_attached(&mut self, entity: Entity, system: SystemId, attached: bool) {
        if let Some(row) = self.rows.get_mut(entity.index()) {
            if attached {
                row.attached.set(system.index());
            } else {
                row.attached.clear(system.index());
            }
        }
    }

    /// Clears one system's attachment bit on every row. Run when the system
    /// is removed so a later system reusing the id doesn't inherit stale
    /// flags.
    pub(crate) fn clear_system_flags(&mut self, system: SystemId) {
        for row in &mut self.rows {
            row.attached.clear(system.index());
        }
    }

    pub(crate) fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        if let Some(row) = self.rows.get_mut(entity.index()) {
            row.enabled = enabled;
        }
    }

    /// Tears one entity down: row invalidated, name released, components
    /// dropped, id recycled. Only called from Remove action replay, after
    /// the systems have detached it.
    pub(crate) fn destroy(&mut self, entity: Entity) {
        let Some(row) = self.rows.get_mut(entity.index()) else {
            return;
        };
        if !row.valid {
            return;
        }
        if let Some(name) = row.name.take() {
            self.names.remove(&name);
        }
        *row = EntityRow::default();
        self.components.remove_all(entity);
        self.pool.store(entity.0);
    }

    /// Drops every entity, component, and queued action, and restarts id
    /// allocation from zero. The registry and event bus are left alone.
    pub(crate) fn clear_entities(&mut self) {
        self.rows.clear();
        self.names.clear();
        self.actions.clear();
        self.components.clear();
        self.pool.reset();
    }
}
