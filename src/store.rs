//! Block persistence interface.
//!
//! The wider system keeps observation blocks in a relational database; the
//! scheduler only ever needs three questions answered, captured by the
//! [`BlockStore`] trait. The store is the single source of truth for
//! "already scheduled": the submitter re-asks at submission time rather
//! than trusting filter-time counts, and the `record_schedule` return
//! value is the claim that keeps a double submission out even if two
//! passes race.
//!
//! [`MemoryBlockStore`] is the in-process implementation used by the CLI
//! and the tests.
use std::collections::HashMap;
use std::sync::Mutex;

use hifitime::Epoch;

use crate::submit::ScheduleRequest;

/// One recorded observation block.
#[derive(Debug, Clone)]
pub struct BlockRecord {
    pub tracking_number: String,
    pub group_id: String,
    pub site_code: String,
    pub start: Epoch,
    pub end: Epoch,
    /// Still awaiting execution on the network.
    pub active: bool,
}

/// What the scheduler needs from block persistence.
pub trait BlockStore {
    /// Number of blocks still active for an object.
    fn active_block_count(&self, object_id: &str) -> usize;

    /// How many times the object was observed but not found on the frames.
    fn not_found_count(&self, object_id: &str) -> u32;

    /// Persist a submitted schedule and claim the target.
    ///
    /// Returns `false` when the object already holds an active block; the
    /// caller must then treat the submission as superseded, not retry.
    fn record_schedule(
        &self,
        object_id: &str,
        tracking_number: &str,
        request: &ScheduleRequest,
    ) -> bool;
}

/// In-memory [`BlockStore`] with interior mutability, so batch code can
/// share it behind `&dyn BlockStore`.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: Mutex<HashMap<String, Vec<BlockRecord>>>,
    not_found: Mutex<HashMap<String, u32>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a not-found tally (normally fed by the frame analysis
    /// pipeline).
    pub fn set_not_found(&self, object_id: &str, count: u32) {
        self.not_found
            .lock()
            .expect("block store mutex poisoned")
            .insert(object_id.to_string(), count);
    }

    /// Insert a pre-existing block, e.g. one carried over from a previous
    /// night.
    pub fn insert_block(&self, object_id: &str, record: BlockRecord) {
        self.blocks
            .lock()
            .expect("block store mutex poisoned")
            .entry(object_id.to_string())
            .or_default()
            .push(record);
    }

    /// All recorded blocks for an object, for reporting and tests.
    pub fn blocks_for(&self, object_id: &str) -> Vec<BlockRecord> {
        self.blocks
            .lock()
            .expect("block store mutex poisoned")
            .get(object_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl BlockStore for MemoryBlockStore {
    fn active_block_count(&self, object_id: &str) -> usize {
        self.blocks
            .lock()
            .expect("block store mutex poisoned")
            .get(object_id)
            .map(|records| records.iter().filter(|r| r.active).count())
            .unwrap_or(0)
    }

    fn not_found_count(&self, object_id: &str) -> u32 {
        self.not_found
            .lock()
            .expect("block store mutex poisoned")
            .get(object_id)
            .copied()
            .unwrap_or(0)
    }

    fn record_schedule(
        &self,
        object_id: &str,
        tracking_number: &str,
        request: &ScheduleRequest,
    ) -> bool {
        let mut blocks = self.blocks.lock().expect("block store mutex poisoned");
        let records = blocks.entry(object_id.to_string()).or_default();
        if records.iter().any(|r| r.active) {
            return false;
        }
        records.push(BlockRecord {
            tracking_number: tracking_number.to_string(),
            group_id: request.group_id.clone(),
            site_code: request.site_code.clone(),
            start: request.window_start,
            end: request.window_end,
            active: true,
        });
        true
    }
}
