//! # Scene — The Per-Tick Protocol
//!
//! A scene is a [`World`] plus a priority-ordered system table and the glue
//! that keeps the two consistent. [`Scene::update`] is the only place where
//! deferred structural actions are applied and system phase hooks run:
//!
//! 1. freshly added systems get their `on_start`,
//! 2. the action queue is swapped out and replayed in FIFO order
//!    (actions enqueued *during* the replay wait for the next tick),
//! 3. `on_pre_update`, `on_update`, `on_post_update` run — each phase
//!    walks every system in descending priority before the next phase
//!    begins.
//!
//! System hooks receive `&mut World` and nothing else. They can queue
//! structural changes, read and write components, and emit events, but the
//! system table itself is out of reach — which is exactly what makes handing
//! out the mutable world safe mid-walk.

use std::any::TypeId;
use std::mem;

use crate::ecs::filter::FilterBuilder;
use crate::ecs::schedule::SystemRegistry;
use crate::ecs::system::{short_type_name, AttachStatus, Phase, System, SystemCell};
use crate::ecs::world::{Action, World};
use crate::ecs::Entity;
use crate::error::Error;

/// A world and the systems that run over it.
pub struct Scene {
    world: World,
    systems: SystemRegistry,
    /// Systems added since the last tick, awaiting `on_start`.
    pending_start: Vec<TypeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            systems: SystemRegistry::new(),
            pending_start: Vec::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// See [`World::create_entity`].
    pub fn create_entity(&mut self) -> Entity {
        self.world.create_entity()
    }

    /// See [`World::create_entity_named`].
    pub fn create_entity_named(&mut self, name: impl Into<String>) -> Result<Entity, Error> {
        self.world.create_entity_named(name)
    }

    // ── Systems ─────────────────────────────────────────────────────────

    /// Registers a system under its type, replacing (shutdown + detach) any
    /// existing system of the same type. The filter is built once, here;
    /// `on_start` runs at the top of the next [`update`](Self::update).
    pub fn add_system<S: System>(&mut self, priority: i32, system: S) -> Result<(), Error> {
        let type_id = TypeId::of::<S>();
        if self.systems.contains(type_id) {
            self.teardown(type_id);
        }

        let id = self.world.registry_mut().system_id::<S>()?;
        let mut builder = FilterBuilder::new(self.world.registry_mut());
        system.filter(&mut builder)?;
        let filter = builder.finish();

        self.systems.insert(
            type_id,
            SystemCell::new(id, priority, short_type_name::<S>(), Box::new(system), filter),
        );
        self.pending_start.push(type_id);
        Ok(())
    }

    pub fn has_system<S: System>(&self) -> bool {
        self.systems.contains(TypeId::of::<S>())
    }

    /// Reference to the registered `S` system.
    pub fn get_system<S: System>(&self) -> Result<&S, Error> {
        self.systems.get::<S>().ok_or(Error::SystemNotFound {
            type_name: std::any::type_name::<S>(),
        })
    }

    /// Mutable reference to the registered `S` system.
    pub fn get_system_mut<S: System>(&mut self) -> Result<&mut S, Error> {
        self.systems.get_mut::<S>().ok_or(Error::SystemNotFound {
            type_name: std::any::type_name::<S>(),
        })
    }

    /// The entities the `S` system is actively running over: attached *and*
    /// enabled. Disabled entities remain attached but are not listed.
    pub fn system_entities<S: System>(&self) -> Result<Vec<Entity>, Error> {
        self.systems
            .cell(TypeId::of::<S>())
            .map(|cell| cell.enabled_entities())
            .ok_or(Error::SystemNotFound {
                type_name: std::any::type_name::<S>(),
            })
    }

    /// Removes the `S` system: `on_shutdown`, then a detach callback per
    /// attached entity (disable-before-detach for enabled ones).
    pub fn remove_system<S: System>(&mut self) -> Result<(), Error> {
        let type_id = TypeId::of::<S>();
        if !self.systems.contains(type_id) {
            return Err(Error::SystemNotFound {
                type_name: std::any::type_name::<S>(),
            });
        }
        self.teardown(type_id);
        Ok(())
    }

    /// Removes every system, in iteration order.
    pub fn remove_all_systems(&mut self) {
        self.pending_start.clear();
        for mut cell in self.systems.take_all() {
            cell.shutdown(&mut self.world);
            cell.detach_all(&mut self.world);
            self.world.clear_system_flags(cell.id);
        }
    }

    fn teardown(&mut self, type_id: TypeId) {
        self.pending_start.retain(|&t| t != type_id);
        if let Some(mut cell) = self.systems.remove(type_id) {
            cell.shutdown(&mut self.world);
            cell.detach_all(&mut self.world);
            // A later system reusing this id must not inherit stale
            // attachment bits.
            self.world.clear_system_flags(cell.id);
        }
    }

    // ── The tick ────────────────────────────────────────────────────────

    /// Runs one tick: pending starts, action replay, then the three phases.
    pub fn update(&mut self, delta: f32) {
        let Scene {
            world,
            systems,
            pending_start,
        } = self;

        for type_id in mem::take(pending_start) {
            if let Some(cell) = systems.cell_mut(type_id) {
                cell.start(world);
            }
        }

        for (entity, action) in world.take_actions() {
            if !world.is_valid(entity) {
                log::error!("dropping {action:?} for invalid entity {entity}");
                continue;
            }
            match action {
                Action::Enable => action_enable(systems, world, entity),
                Action::Disable => action_disable(systems, world, entity),
                Action::Refresh => action_refresh(systems, world, entity),
                Action::Remove => action_remove(systems, world, entity),
            }
        }

        for phase in [Phase::PreUpdate, Phase::Update, Phase::PostUpdate] {
            systems.for_each(|cell| cell.run_phase(phase, delta, world));
        }
    }

    /// Empties the scene: systems first (shutdown + detach), then entities,
    /// names, components, queued actions, the id pool, and event handlers.
    /// The type registry survives — ids stay stable across a clear.
    pub fn clear(&mut self) {
        self.remove_all_systems();
        self.world.clear_entities();
        self.world.clear_events();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconciles one (entity, system) pair against the system's filter.
///
/// Attaches on a new match, detaches on a lost match, and reports which of
/// the four cases applied. The per-row attachment bit is flipped *before*
/// the hook runs, so a hook observing the world sees the new state.
fn try_attach(cell: &mut SystemCell, world: &mut World, entity: Entity) -> AttachStatus {
    let matches = cell.filter.check(world.component_mask(entity));
    let attached = world.is_attached(entity, cell.id);
    match (matches, attached) {
        (true, true) => AttachStatus::AlreadyAttached,
        (true, false) => {
            world.set_attached(entity, cell.id, true);
            cell.attach(entity, world);
            AttachStatus::Attached
        }
        (false, true) => {
            world.set_attached(entity, cell.id, false);
            cell.detach(entity, world);
            AttachStatus::Detached
        }
        (false, false) => AttachStatus::NotAttached,
    }
}

fn action_enable(systems: &mut SystemRegistry, world: &mut World, entity: Entity) {
    world.set_enabled(entity, true);
    systems.for_each(|cell| {
        match try_attach(cell, world, entity) {
            AttachStatus::Attached | AttachStatus::AlreadyAttached => {
                cell.enable(entity, world);
            }
            AttachStatus::Detached | AttachStatus::NotAttached => {}
        }
    });
}

fn action_disable(systems: &mut SystemRegistry, world: &mut World, entity: Entity) {
    world.set_enabled(entity, false);
    systems.for_each(|cell| {
        if world.is_attached(entity, cell.id) {
            cell.disable(entity, world);
        }
    });
}

fn action_refresh(systems: &mut SystemRegistry, world: &mut World, entity: Entity) {
    let enabled = world.is_enabled(entity);
    systems.for_each(|cell| {
        if try_attach(cell, world, entity) == AttachStatus::Attached && enabled {
            cell.enable(entity, world);
        }
    });
}

fn action_remove(systems: &mut SystemRegistry, world: &mut World, entity: Entity) {
    systems.for_each(|cell| {
        if world.is_attached(entity, cell.id) {
            world.set_attached(entity, cell.id, false);
            cell.detach(entity, world);
        }
    });
    world.destroy(entity);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;

    #[derive(Default)]
    struct Movement {
        updates: u32,
    }

    impl System for Movement {
        fn filter(&self, builder: &mut FilterBuilder<'_>) -> Result<(), Error> {
            builder.require::<Position>()?.require::<Velocity>()?;
            Ok(())
        }
        fn on_update(&mut self, _delta: f32, _world: &mut World, entities: &[Entity]) {
            self.updates += entities.len() as u32;
        }
    }

    #[test]
    fn matching_entity_is_attached_on_the_next_tick() {
        let mut scene = Scene::new();
        scene.add_system(0, Movement::default()).unwrap();
        let e = scene.create_entity();
        scene.world_mut().add_component(e, Position).unwrap();
        scene.world_mut().add_component(e, Velocity).unwrap();

        assert!(scene.system_entities::<Movement>().unwrap().is_empty());
        scene.update(0.016);
        assert_eq!(scene.system_entities::<Movement>().unwrap(), [e]);
        assert_eq!(scene.get_system::<Movement>().unwrap().updates, 1);
    }

    #[test]
    fn losing_a_required_component_detaches() {
        let mut scene = Scene::new();
        scene.add_system(0, Movement::default()).unwrap();
        let e = scene.create_entity();
        scene.world_mut().add_component(e, Position).unwrap();
        scene.world_mut().add_component(e, Velocity).unwrap();
        scene.update(0.016);

        scene.world_mut().remove_component::<Velocity>(e).unwrap();
        scene.update(0.016);
        assert!(scene.system_entities::<Movement>().unwrap().is_empty());
        assert!(scene.world().is_valid(e));
    }

    #[test]
    fn disabled_entity_stays_attached_but_silent() {
        let mut scene = Scene::new();
        scene.add_system(0, Movement::default()).unwrap();
        let e = scene.create_entity();
        scene.world_mut().add_component(e, Position).unwrap();
        scene.world_mut().add_component(e, Velocity).unwrap();
        scene.update(0.016);

        scene.world_mut().disable_entity(e).unwrap();
        scene.update(0.016);
        // Still attached, but out of the active set the hook sees.
        assert!(scene.system_entities::<Movement>().unwrap().is_empty());
        assert_eq!(scene.get_system::<Movement>().unwrap().updates, 1);

        scene.world_mut().enable_entity(e).unwrap();
        scene.update(0.016);
        assert_eq!(scene.get_system::<Movement>().unwrap().updates, 2);
    }

    #[test]
    fn removed_entity_is_detached_and_recycled() {
        let mut scene = Scene::new();
        scene.add_system(0, Movement::default()).unwrap();
        let e = scene.create_entity();
        scene.world_mut().add_component(e, Position).unwrap();
        scene.world_mut().add_component(e, Velocity).unwrap();
        scene.update(0.016);

        scene.world_mut().remove_entity(e).unwrap();
        scene.update(0.016);
        assert!(!scene.world().is_valid(e));
        assert!(scene.system_entities::<Movement>().unwrap().is_empty());
        // LIFO reuse, and the fresh entity carries none of the old state.
        let e2 = scene.create_entity();
        assert_eq!(e2, e);
        assert!(!scene.world().has_component::<Position>(e2));
    }

    #[test]
    fn unknown_system_lookups_fail() {
        let scene = Scene::new();
        assert!(!scene.has_system::<Movement>());
        assert!(matches!(
            scene.get_system::<Movement>(),
            Err(Error::SystemNotFound { .. })
        ));
        assert!(matches!(
            scene.system_entities::<Movement>(),
            Err(Error::SystemNotFound { .. })
        ));
    }

    #[test]
    fn add_system_replaces_same_type() {
        let mut scene = Scene::new();
        scene.add_system(0, Movement::default()).unwrap();
        let e = scene.create_entity();
        scene.world_mut().add_component(e, Position).unwrap();
        scene.world_mut().add_component(e, Velocity).unwrap();
        scene.update(0.016);
        assert_eq!(scene.get_system::<Movement>().unwrap().updates, 1);

        // The replacement starts from scratch and re-attaches on refresh.
        scene.add_system(0, Movement::default()).unwrap();
        assert_eq!(scene.get_system::<Movement>().unwrap().updates, 0);
        assert!(scene.system_entities::<Movement>().unwrap().is_empty());
        scene.world_mut().refresh_entity(e).unwrap();
        scene.update(0.016);
        assert_eq!(scene.system_entities::<Movement>().unwrap(), [e]);
    }

    #[test]
    fn clear_leaves_a_reusable_scene() {
        let mut scene = Scene::new();
        scene.add_system(0, Movement::default()).unwrap();
        scene.create_entity_named("player").unwrap();
        scene.update(0.016);

        scene.clear();
        assert_eq!(scene.world().entity_count(), 0);
        assert!(!scene.has_system::<Movement>());

        // Everything works again, ids start over.
        scene.add_system(0, Movement::default()).unwrap();
        let e = scene.create_entity_named("player").unwrap();
        assert_eq!(e, Entity(0));
        scene.world_mut().add_component(e, Position).unwrap();
        scene.world_mut().add_component(e, Velocity).unwrap();
        scene.update(0.016);
        assert_eq!(scene.system_entities::<Movement>().unwrap(), [e]);
    }
}
