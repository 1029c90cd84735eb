//! # ComponentStore — Type-Erased Per-Entity Slots
//!
//! One row per entity id, one slot per component type id. A slot holds a
//! `Box<dyn Any + Send + Sync>` — heap-boxed, downcast on access. That
//! trades cache locality for zero unsafe code; for a bookkeeping core the
//! clarity is worth far more than the nanoseconds.
//!
//! Each row also mirrors its occupancy in a [`Mask`]: bit *i* is set iff
//! slot *i* is filled. The mask is updated in the same call as the slot,
//! never lazily, because system filtering reads *only* the mask — a
//! mask/slot mismatch would attach entities to systems whose data they
//! don't have.
//!
//! The store exclusively owns every instance; callers only ever see `&T` /
//! `&mut T` views.

use std::any::Any;

use crate::ecs::mask::Mask;
use crate::ecs::registry::ComponentId;
use crate::ecs::{Entity, MAX_COMPONENTS};
use crate::error::Error;

type Slot = Option<Box<dyn Any + Send + Sync>>;

struct Row {
    slots: Vec<Slot>,
    mask: Mask,
}

impl Row {
    fn new() -> Self {
        Self {
            slots: (0..MAX_COMPONENTS).map(|_| None).collect(),
            mask: Mask::EMPTY,
        }
    }
}

/// Component instances for every entity row, addressed by
/// `(entity id, component type id)`.
pub(crate) struct ComponentStore {
    rows: Vec<Row>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Grows row storage to at least `len` rows. Never shrinks.
    pub fn resize(&mut self, len: usize) {
        while self.rows.len() < len {
            self.rows.push(Row::new());
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Moves `value` into the slot and sets the mask bit, replacing any
    /// previous instance of the same type.
    pub fn insert(
        &mut self,
        entity: Entity,
        id: ComponentId,
        type_name: &'static str,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), Error> {
        let row = self
            .rows
            .get_mut(entity.index())
            .ok_or(Error::InvalidEntity(entity))?;
        if id.index() >= MAX_COMPONENTS {
            return Err(Error::InvalidComponent {
                type_name,
                type_id: id.index(),
                capacity: MAX_COMPONENTS,
            });
        }
        row.slots[id.index()] = Some(value);
        row.mask.set(id.index());
        Ok(())
    }

    /// Reference to the owned instance in the slot.
    pub fn get<T: 'static>(&self, entity: Entity, id: ComponentId) -> Result<&T, Error> {
        self.rows
            .get(entity.index())
            .and_then(|row| row.slots.get(id.index()))
            .and_then(|slot| slot.as_deref())
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or(Error::ComponentNotFound {
                entity,
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Mutable reference to the owned instance in the slot.
    pub fn get_mut<T: 'static>(
        &mut self,
        entity: Entity,
        id: ComponentId,
    ) -> Result<&mut T, Error> {
        self.rows
            .get_mut(entity.index())
            .and_then(|row| row.slots.get_mut(id.index()))
            .and_then(|slot| slot.as_deref_mut())
            .and_then(|value| value.downcast_mut::<T>())
            .ok_or(Error::ComponentNotFound {
                entity,
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Whether the slot is occupied. Out-of-range ids yield `false`.
    pub fn has(&self, entity: Entity, id: ComponentId) -> bool {
        self.rows
            .get(entity.index())
            .map(|row| row.mask.test(id.index()))
            .unwrap_or(false)
    }

    /// Clears the slot and the mask bit. No-op if already absent.
    pub fn remove(&mut self, entity: Entity, id: ComponentId) {
        if let Some(row) = self.rows.get_mut(entity.index()) {
            if id.index() < row.slots.len() {
                row.slots[id.index()] = None;
                row.mask.clear(id.index());
            }
        }
    }

    /// Clears every slot and the whole mask for a row. Used during entity
    /// removal.
    pub fn remove_all(&mut self, entity: Entity) {
        if let Some(row) = self.rows.get_mut(entity.index()) {
            for slot in &mut row.slots {
                *slot = None;
            }
            row.mask = Mask::EMPTY;
        }
    }

    /// Value-copy snapshot of the row's occupancy mask. Out-of-range ids
    /// yield the empty mask.
    pub fn mask(&self, entity: Entity) -> Mask {
        self.rows
            .get(entity.index())
            .map(|row| row.mask)
            .unwrap_or(Mask::EMPTY)
    }

    /// Drops every row. Row storage is rebuilt on the next `resize`.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    struct Shield;

    fn store_with_rows(len: usize) -> ComponentStore {
        let mut store = ComponentStore::new();
        store.resize(len);
        store
    }

    #[test]
    fn insert_sets_slot_and_mask() {
        let mut store = store_with_rows(2);
        let e = Entity(1);
        let id = ComponentId(3);
        store.insert(e, id, "Health", Box::new(Health(50))).unwrap();
        assert!(store.has(e, id));
        assert!(store.mask(e).test(3));
        assert_eq!(store.get::<Health>(e, id).unwrap(), &Health(50));
    }

    #[test]
    fn insert_replaces_existing() {
        let mut store = store_with_rows(1);
        let e = Entity(0);
        let id = ComponentId(0);
        store.insert(e, id, "Health", Box::new(Health(10))).unwrap();
        store.insert(e, id, "Health", Box::new(Health(99))).unwrap();
        assert_eq!(store.get::<Health>(e, id).unwrap(), &Health(99));
    }

    #[test]
    fn insert_out_of_range_row_fails() {
        let mut store = store_with_rows(1);
        let err = store
            .insert(Entity(5), ComponentId(0), "Shield", Box::new(Shield))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEntity(e) if e == Entity(5)));
    }

    #[test]
    fn get_empty_slot_fails() {
        let store = store_with_rows(1);
        let err = store.get::<Health>(Entity(0), ComponentId(0)).unwrap_err();
        assert!(matches!(err, Error::ComponentNotFound { .. }));
    }

    #[test]
    fn get_mut_allows_in_place_edit() {
        let mut store = store_with_rows(1);
        let e = Entity(0);
        let id = ComponentId(0);
        store.insert(e, id, "Health", Box::new(Health(1))).unwrap();
        store.get_mut::<Health>(e, id).unwrap().0 = 7;
        assert_eq!(store.get::<Health>(e, id).unwrap(), &Health(7));
    }

    #[test]
    fn has_never_fails() {
        let store = store_with_rows(1);
        assert!(!store.has(Entity(0), ComponentId(0)));
        assert!(!store.has(Entity(400), ComponentId(0)));
    }

    #[test]
    fn remove_clears_slot_and_bit() {
        let mut store = store_with_rows(1);
        let e = Entity(0);
        let id = ComponentId(2);
        store.insert(e, id, "Shield", Box::new(Shield)).unwrap();
        store.remove(e, id);
        assert!(!store.has(e, id));
        assert!(store.mask(e).is_empty());
        // Removing again is a no-op, as is removing from a bogus row.
        store.remove(e, id);
        store.remove(Entity(99), id);
    }

    #[test]
    fn remove_all_empties_the_row() {
        let mut store = store_with_rows(1);
        let e = Entity(0);
        store.insert(e, ComponentId(0), "Health", Box::new(Health(1))).unwrap();
        store.insert(e, ComponentId(5), "Shield", Box::new(Shield)).unwrap();
        store.remove_all(e);
        assert!(store.mask(e).is_empty());
        assert!(!store.has(e, ComponentId(0)));
        assert!(!store.has(e, ComponentId(5)));
    }

    #[test]
    fn mask_is_a_snapshot() {
        let mut store = store_with_rows(1);
        let e = Entity(0);
        store.insert(e, ComponentId(0), "Shield", Box::new(Shield)).unwrap();
        let snapshot = store.mask(e);
        store.remove(e, ComponentId(0));
        // The copy taken earlier is unaffected.
        assert!(snapshot.test(0));
        assert!(!store.mask(e).test(0));
    }

    #[test]
    fn resize_never_shrinks() {
        let mut store = store_with_rows(4);
        store.resize(2);
        assert_eq!(store.len(), 4);
        store.resize(8);
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn drop_runs_when_slot_cleared() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROPS.store(0, Ordering::SeqCst);
        let mut store = store_with_rows(1);
        store
            .insert(Entity(0), ComponentId(0), "Tracked", Box::new(Tracked))
            .unwrap();
        store.remove(Entity(0), ComponentId(0));
        assert_eq!(DROPS.load(Ordering::SeqCst), 1);
    }
}
