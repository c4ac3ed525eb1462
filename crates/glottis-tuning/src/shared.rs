//! Tuning handle shared between the control side and the render path.
//!
//! [`SharedTuning`] publishes an immutable [`PitchMapper`] through `ArcSwap`.
//! The render path takes a wait-free snapshot at the start of each block;
//! the control side builds a new mapper off-thread and swaps it in. A
//! failed load never reaches this type, so the current tuning stays.
//!
//! A reader that keeps its own `Arc` across blocks hands the one it lets
//! go of back through [`SharedTuning::refresh`]. Those land in a bounded
//! queue and are freed by the next writer, so the render thread never
//! runs a mapper's destructor.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::kbm::KeyboardMapping;
use crate::mapper::PitchMapper;
use crate::scl::Scale;

/// Mappers waiting to be freed off the render thread.
const RETIRED_CAPACITY: usize = 16;

/// Atomically swappable current tuning.
#[derive(Debug)]
pub struct SharedTuning {
    mapper: ArcSwap<PitchMapper>,
    retired_tx: Sender<Arc<PitchMapper>>,
    retired_rx: Receiver<Arc<PitchMapper>>,
}

impl Default for SharedTuning {
    fn default() -> Self {
        Self::new(PitchMapper::new())
    }
}

impl SharedTuning {
    /// Handle starting at `mapper`.
    pub fn new(mapper: PitchMapper) -> Self {
        let (retired_tx, retired_rx) = bounded(RETIRED_CAPACITY);
        Self {
            mapper: ArcSwap::from_pointee(mapper),
            retired_tx,
            retired_rx,
        }
    }

    /// Wait-free read of the current mapper. Holds no lock.
    pub fn load(&self) -> Guard<Arc<PitchMapper>> {
        self.mapper.load()
    }

    /// Owned reference to the current mapper.
    pub fn load_full(&self) -> Arc<PitchMapper> {
        self.mapper.load_full()
    }

    /// Point `held` at the current mapper without freeing anything.
    ///
    /// The mapper `held` let go of is queued for [`collect_retired`]
    /// instead of being dropped by the caller. Returns whether `held`
    /// changed. Does not allocate.
    ///
    /// [`collect_retired`]: SharedTuning::collect_retired
    pub fn refresh(&self, held: &mut Arc<PitchMapper>) -> bool {
        let current = self.mapper.load();
        if Arc::ptr_eq(&current, held) {
            return false;
        }
        let previous = std::mem::replace(held, Arc::clone(&current));
        // A full queue drops `previous` here.
        let _ = self.retired_tx.try_send(previous);
        true
    }

    /// Free every mapper readers have handed back. Returns how many.
    ///
    /// Writers call this before publishing; call it directly to reclaim
    /// memory when no further loads are coming.
    pub fn collect_retired(&self) -> usize {
        self.retired_rx.try_iter().count()
    }

    /// Replace the current mapper.
    pub fn store(&self, mapper: PitchMapper) {
        self.collect_retired();
        self.mapper.store(Arc::new(mapper));
    }

    /// Derive a new mapper from the current one and publish it.
    ///
    /// Retries if another writer published in between, so a scale load
    /// and a keyboard-mapping load racing each other both land.
    pub fn update(&self, f: impl Fn(&PitchMapper) -> PitchMapper) {
        self.collect_retired();
        self.mapper.rcu(|current| Arc::new(f(current)));
    }

    /// Publish `scale`, keeping the keyboard mapping.
    pub fn set_scale(&self, scale: Scale) {
        self.update(|m| m.clone().with_scale(scale.clone()));
    }

    /// Publish `mapping`, keeping the scale.
    pub fn set_keyboard_mapping(&self, mapping: KeyboardMapping) {
        self.update(|m| m.clone().with_keyboard_mapping(mapping.clone()));
    }

    /// Back to plain 12-TET.
    pub fn clear(&self) {
        self.store(PitchMapper::new());
    }
}
