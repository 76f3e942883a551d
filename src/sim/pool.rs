//! Fixed-capacity object pool
//!
//! Entities are built once up front and toggled active/inactive afterwards,
//! so the real-time loop never allocates. Handles are plain indices tagged
//! with the owning pool's id so a handle from another pool is rejected.

use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

/// Minimal lifecycle an entity needs to live in a [`Pool`]
pub trait Poolable {
    /// Called when the pool hands the entity out
    fn activate(&mut self);
    /// Called when the entity is returned to the pool
    fn deactivate(&mut self);
    /// Restore default state (before first use and on release)
    fn reset(&mut self);
}

/// Opaque reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pool_id: u32,
    index: u32,
}

impl PoolHandle {
    /// Slot index inside the owning pool
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Generic recycler owning `capacity` pre-built entities
#[derive(Debug)]
pub struct Pool<T: Poolable> {
    id: u32,
    items: Vec<T>,
    /// Stack of free slots (last released is handed out first)
    available: Vec<u32>,
    /// `available_lookup[i]` is true iff slot `i` is on the free stack
    available_lookup: Vec<bool>,
    duplicate_release_warning_logged: bool,
}

impl<T: Poolable> Pool<T> {
    /// Build `capacity` entities (at least one) through `factory`, all available
    pub fn new(capacity: usize, mut factory: impl FnMut(usize) -> T) -> Self {
        let capacity = capacity.max(1);
        let mut items = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let mut item = factory(i);
            item.reset();
            item.deactivate();
            items.push(item);
        }

        // Reverse so slot 0 is handed out first
        let available = (0..capacity as u32).rev().collect();

        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            items,
            available,
            available_lookup: vec![true; capacity],
            duplicate_release_warning_logged: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Number of handles currently handed out
    pub fn active_count(&self) -> usize {
        self.capacity() - self.available_count()
    }

    /// Take a free entity, or `None` if the pool is exhausted
    pub fn try_get(&mut self) -> Option<PoolHandle> {
        while let Some(index) = self.available.pop() {
            let slot = index as usize;
            if !self.available_lookup[slot] {
                // Stale stack entry; the slot is already out
                self.log_duplicate_release(slot);
                continue;
            }
            self.available_lookup[slot] = false;
            self.items[slot].activate();
            return Some(PoolHandle {
                pool_id: self.id,
                index,
            });
        }
        None
    }

    /// Return an entity. Foreign and already-released handles are ignored.
    ///
    /// Returns true if the entity was actually put back.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        if !self.owns(handle) {
            return false;
        }
        let slot = handle.index();
        if self.available_lookup[slot] {
            self.log_duplicate_release(slot);
            return false;
        }

        let item = &mut self.items[slot];
        item.deactivate();
        item.reset();
        self.available_lookup[slot] = true;
        self.available.push(handle.index);
        true
    }

    /// Release every handle in `active` and clear it
    pub fn release_all(&mut self, active: &mut Vec<PoolHandle>) {
        for handle in active.drain(..) {
            self.release(handle);
        }
    }

    /// True if the handle belongs to this pool and is currently free
    pub fn is_available(&self, handle: PoolHandle) -> bool {
        self.owns(handle) && self.available_lookup[handle.index()]
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if self.owns(handle) {
            self.items.get(handle.index())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.owns(handle) {
            self.items.get_mut(handle.index())
        } else {
            None
        }
    }

    fn owns(&self, handle: PoolHandle) -> bool {
        handle.pool_id == self.id && handle.index() < self.items.len()
    }

    fn log_duplicate_release(&mut self, slot: usize) {
        if self.duplicate_release_warning_logged {
            return;
        }
        self.duplicate_release_warning_logged = true;
        log::warn!(
            "Pool<{}> ignored duplicate release for slot {}",
            std::any::type_name::<T>(),
            slot
        );
    }
}
