//! # EntityPool — Id Allocation and Recycling
//!
//! Hands out dense `u32` ids: freed ids are reused LIFO before the monotonic
//! counter is bumped. Dense ids matter because the world indexes its entity
//! rows and component tables directly by id — reuse keeps those tables from
//! growing without bound.
//!
//! ## The double-free gap
//!
//! `store` rejects ids that were never issued, but it does **not** detect an
//! id that is already sitting in the free list. Storing the same id twice
//! makes `create` hand it out twice. The [`World`](super::world::World)
//! never does this (an id is stored exactly once, when its Remove action is
//! processed), so the pool leaves the check out rather than paying for a
//! membership test on every store.

/// LIFO pool of reusable entity ids.
pub(crate) struct EntityPool {
    /// Ids returned by removed entities, available for reuse.
    free: Vec<u32>,
    /// Next fresh id, used when the free list is empty.
    next: u32,
}

impl EntityPool {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            next: 0,
        }
    }

    /// Returns an id: the most recently stored one if any, else a fresh one.
    pub fn create(&mut self) -> u32 {
        if let Some(id) = self.free.pop() {
            id
        } else {
            let id = self.next;
            self.next += 1;
            id
        }
    }

    /// Returns `id` to the pool for reuse.
    ///
    /// Ids that were never issued are ignored — handing them out later would
    /// leave holes in the dense id range.
    pub fn store(&mut self, id: u32) {
        if id < self.next {
            self.free.push(id);
        }
    }

    /// Empties the free list and restarts the counter at zero.
    pub fn reset(&mut self) {
        self.free.clear();
        self.next = 0;
    }
}
