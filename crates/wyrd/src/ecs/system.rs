//! # System — Logic Units With Tracked Membership
//!
//! A system is a user type implementing [`System`]. It declares a component
//! [`Filter`] once at registration, and from then on the scene keeps the
//! system's entity membership current: entities whose occupancy mask matches
//! the filter are attached, entities that stop matching are detached, and
//! per-entity enable/disable moves them between the two lists without
//! forgetting them.
//!
//! ## Fault isolation
//!
//! Every hook call crosses `guarded`: a panicking system logs an error and
//! loses the rest of its own hook, but neither the tick nor the other
//! systems. Membership bookkeeping happens *outside* the guarded closure, so
//! a panic can't desynchronize the attachment state either.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::ecs::filter::{Filter, FilterBuilder};
use crate::ecs::registry::SystemId;
use crate::ecs::world::World;
use crate::ecs::Entity;
use crate::error::Error;

/// The three update phases of a tick, run in this order for every system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    PreUpdate,
    Update,
    PostUpdate,
}

/// A logic unit registered with a [`Scene`](super::scene::Scene).
///
/// Every hook has a no-op default — implement only what the system needs.
/// Hooks receive `&mut World` for data access; the system table itself is
/// deliberately out of reach, so structural changes (create, remove, enable)
/// go through the world's deferred queue.
#[allow(unused_variables)]
pub trait System: Any {
    /// Declares which entities this system tracks. Called once, at
    /// registration. The default filter matches every entity.
    fn filter(&self, builder: &mut FilterBuilder<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Runs when the system starts, before its first update phase.
    fn on_start(&mut self, world: &mut World) {}

    /// Runs when the system is removed from the scene, after its entities
    /// have been detached.
    fn on_shutdown(&mut self, world: &mut World) {}

    fn on_pre_update(&mut self, delta: f32, world: &mut World, entities: &[Entity]) {}

    fn on_update(&mut self, delta: f32, world: &mut World, entities: &[Entity]) {}

    fn on_post_update(&mut self, delta: f32, world: &mut World, entities: &[Entity]) {}

    /// Runs when an entity newly matches the filter. The entity arrives in
    /// the disabled list; an enable follows if the entity itself is enabled.
    fn on_entity_attached(&mut self, entity: Entity, world: &mut World) {}

    /// Runs when an attached entity stops matching the filter or is removed.
    fn on_entity_detached(&mut self, entity: Entity, world: &mut World) {}

    fn on_entity_enabled(&mut self, entity: Entity, world: &mut World) {}

    fn on_entity_disabled(&mut self, entity: Entity, world: &mut World) {}
}

/// How [`Scene`](super::scene::Scene) membership reconciliation left an
/// entity with respect to one system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttachStatus {
    /// Matched the filter and was newly attached.
    Attached,
    /// Matched the filter and was attached already.
    AlreadyAttached,
    /// Was attached but no longer matches; detached.
    Detached,
    /// Does not match and was not attached.
    NotAttached,
}

/// Per-system lifecycle state of one attached entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntityStatus {
    Disabled,
    Enabled,
}

/// One registered system plus the bookkeeping the scene keeps around it.
pub(crate) struct SystemCell {
    pub id: SystemId,
    pub priority: i32,
    /// Short type name, used in log lines.
    pub name: &'static str,
    pub system: Box<dyn System>,
    pub filter: Filter,
    enabled: Vec<Entity>,
    disabled: Vec<Entity>,
    status: HashMap<Entity, EntityStatus>,
}

impl SystemCell {
    pub fn new(
        id: SystemId,
        priority: i32,
        name: &'static str,
        system: Box<dyn System>,
        filter: Filter,
    ) -> Self {
        Self {
            id,
            priority,
            name,
            system,
            filter,
            enabled: Vec::new(),
            disabled: Vec::new(),
            status: HashMap::new(),
        }
    }

    pub fn is_attached(&self, entity: Entity) -> bool {
        self.status.contains_key(&entity)
    }

    /// The enabled entities, in attachment order. Disabled entities stay
    /// attached but are not exposed here.
    pub fn enabled_entities(&self) -> Vec<Entity> {
        self.enabled.clone()
    }

    /// Every attached entity, enabled first. Used for teardown, not exposed
    /// through the scene.
    pub fn entities(&self) -> Vec<Entity> {
        let mut all = self.enabled.clone();
        all.extend_from_slice(&self.disabled);
        all
    }

    /// Attaches `entity` in the disabled state and runs the attach hook.
    /// No-op if already attached.
    pub fn attach(&mut self, entity: Entity, world: &mut World) {
        if self.status.contains_key(&entity) {
            return;
        }
        self.status.insert(entity, EntityStatus::Disabled);
        self.disabled.push(entity);
        guarded(self.name, "on_entity_attached", || {
            self.system.on_entity_attached(entity, world);
        });
    }

    /// Detaches `entity`, disabling it first if it was enabled so the hooks
    /// fire in enable/disable pairs. No-op if not attached.
    pub fn detach(&mut self, entity: Entity, world: &mut World) {
        match self.status.remove(&entity) {
            None => return,
            Some(EntityStatus::Enabled) => {
                self.enabled.retain(|&e| e != entity);
                guarded(self.name, "on_entity_disabled", || {
                    self.system.on_entity_disabled(entity, world);
                });
            }
            Some(EntityStatus::Disabled) => {
                self.disabled.retain(|&e| e != entity);
            }
        }
        guarded(self.name, "on_entity_detached", || {
            self.system.on_entity_detached(entity, world);
        });
    }

    /// Moves `entity` to the enabled list and runs the enable hook. No-op
    /// unless attached and currently disabled.
    pub fn enable(&mut self, entity: Entity, world: &mut World) {
        if self.status.get(&entity) != Some(&EntityStatus::Disabled) {
            return;
        }
        self.status.insert(entity, EntityStatus::Enabled);
        self.disabled.retain(|&e| e != entity);
        self.enabled.push(entity);
        guarded(self.name, "on_entity_enabled", || {
            self.system.on_entity_enabled(entity, world);
        });
    }

    /// Moves `entity` to the disabled list and runs the disable hook. No-op
    /// unless attached and currently enabled.
    pub fn disable(&mut self, entity: Entity, world: &mut World) {
        if self.status.get(&entity) != Some(&EntityStatus::Enabled) {
            return;
        }
        self.status.insert(entity, EntityStatus::Disabled);
        self.enabled.retain(|&e| e != entity);
        self.disabled.push(entity);
        guarded(self.name, "on_entity_disabled", || {
            self.system.on_entity_disabled(entity, world);
        });
    }

    /// Detaches every attached entity, enabled ones first.
    pub fn detach_all(&mut self, world: &mut World) {
        for entity in self.entities() {
            self.detach(entity, world);
        }
    }

    pub fn start(&mut self, world: &mut World) {
        guarded(self.name, "on_start", || {
            self.system.on_start(world);
        });
    }

    pub fn shutdown(&mut self, world: &mut World) {
        guarded(self.name, "on_shutdown", || {
            self.system.on_shutdown(world);
        });
    }

    /// Runs one update phase over a snapshot of the enabled entities.
    ///
    /// The snapshot is taken before the hook and filtered for world validity,
    /// so entities removed by an earlier system this tick are skipped, and
    /// membership changes the hook queues up don't affect the slice it was
    /// handed.
    pub fn run_phase(&mut self, phase: Phase, delta: f32, world: &mut World) {
        let snapshot: Vec<Entity> = self
            .enabled
            .iter()
            .copied()
            .filter(|&e| world.is_valid(e))
            .collect();
        let hook = match phase {
            Phase::PreUpdate => "on_pre_update",
            Phase::Update => "on_update",
            Phase::PostUpdate => "on_post_update",
        };
        guarded(self.name, hook, || match phase {
            Phase::PreUpdate => self.system.on_pre_update(delta, world, &snapshot),
            Phase::Update => self.system.on_update(delta, world, &snapshot),
            Phase::PostUpdate => self.system.on_post_update(delta, world, &snapshot),
        });
    }
}

/// Runs `f`, catching a panic at the hook boundary. A panic is logged with
/// the system name and hook; it never crosses into the tick loop.
pub(crate) fn guarded<F: FnOnce()>(name: &str, hook: &str, f: F) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        log::error!(
            "system `{name}` panicked in {hook}: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

/// `std::any::type_name` minus the module path — `wyrd::Foo<T>` has enough
/// noise in a log line already.
pub(crate) fn short_type_name<T: 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    match full.rfind(':') {
        Some(pos) => &full[pos + 1..],
        None => full,
    }
}
