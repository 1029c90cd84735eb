//! # SystemRegistry — One Cell per System Type, Priority Order
//!
//! At most one system of each Rust type is registered at a time, so the
//! table is keyed by [`TypeId`]. Iteration order is a separate index:
//! priority descending, insertion order among equals, maintained as a
//! `BTreeMap` so every walk is already sorted.

use std::any::{Any, TypeId};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use crate::ecs::system::{System, SystemCell};

/// Iteration key: higher priority first, then earlier registration.
type OrderKey = (Reverse<i32>, u64);

pub(crate) struct SystemRegistry {
    cells: HashMap<TypeId, SystemCell>,
    order: BTreeMap<OrderKey, TypeId>,
    next_seq: u64,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Inserts a cell under `type_id`. The caller removes any existing cell
    /// of the same type first; this slot must be empty.
    pub fn insert(&mut self, type_id: TypeId, cell: SystemCell) {
        debug_assert!(!self.cells.contains_key(&type_id));
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert((Reverse(cell.priority), seq), type_id);
        self.cells.insert(type_id, cell);
    }

    /// Removes and returns the cell registered under `type_id`.
    pub fn remove(&mut self, type_id: TypeId) -> Option<SystemCell> {
        let cell = self.cells.remove(&type_id)?;
        self.order.retain(|_, t| *t != type_id);
        Some(cell)
    }

    /// Removes every cell, yielding them in iteration order.
    pub fn take_all(&mut self) -> Vec<SystemCell> {
        let order = std::mem::take(&mut self.order);
        order
            .into_values()
            .filter_map(|type_id| self.cells.remove(&type_id))
            .collect()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.cells.contains_key(&type_id)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, type_id: TypeId) -> Option<&SystemCell> {
        self.cells.get(&type_id)
    }

    pub fn cell_mut(&mut self, type_id: TypeId) -> Option<&mut SystemCell> {
        self.cells.get_mut(&type_id)
    }

    /// Typed view of a registered system.
    pub fn get<S: System>(&self) -> Option<&S> {
        let cell = self.cells.get(&TypeId::of::<S>())?;
        (cell.system.as_ref() as &dyn Any).downcast_ref::<S>()
    }

    /// Typed mutable view of a registered system.
    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        let cell = self.cells.get_mut(&TypeId::of::<S>())?;
        (cell.system.as_mut() as &mut dyn Any).downcast_mut::<S>()
    }

    /// Calls `f` on every cell in iteration order. The order is snapshotted
    /// first, so `f` observes a stable walk even though it gets `&mut`
    /// access to each cell.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut SystemCell)) {
        let walk: Vec<TypeId> = self.order.values().copied().collect();
        for type_id in walk {
            if let Some(cell) = self.cells.get_mut(&type_id) {
                f(cell);
            }
        }
    }
}
