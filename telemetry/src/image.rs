/*!
Process image.

One fixed-size slot per tracked identifier holding the most recent payload
seen on the bus. The ingestion worker is the only writer and the
transmission loop the only reader; a single mutex guards all slots and is
held for exactly one slot copy or one small read.
*/

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TelemetryError};
use crate::protocol::MAX_PAYLOAD_LEN;
use crate::tracked::TrackedIds;

/// Raw bytes of one slot
pub type Slot = [u8; MAX_PAYLOAD_LEN];

/// Latest payload per tracked identifier
#[derive(Debug)]
pub struct ProcessImage {
    slots: Mutex<Vec<Slot>>,
    slot_count: usize,
}

impl ProcessImage {
    /// Create an all-zero image with `slot_count` slots
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: Mutex::new(vec![[0u8; MAX_PAYLOAD_LEN]; slot_count]),
            slot_count,
        }
    }

    /// Create an image with one slot per tracked identifier
    pub fn for_tracked(tracked: &TrackedIds) -> Self {
        Self::new(tracked.len())
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Replace the contents of a slot with `payload`.
    ///
    /// The whole slot is rewritten: bytes past the end of the payload are
    /// zeroed so the slot always mirrors the last frame and nothing older.
    pub fn store(&self, slot: usize, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(TelemetryError::PayloadTooLong {
                len: payload.len(),
                capacity: MAX_PAYLOAD_LEN,
            });
        }
        self.check_slot(slot)?;

        let mut next = [0u8; MAX_PAYLOAD_LEN];
        next[..payload.len()].copy_from_slice(payload);

        self.lock()[slot] = next;
        Ok(())
    }

    /// Run `read` against a slot while holding the lock.
    ///
    /// Keep `read` to plain byte access; the lock is shared with frame reception.
    pub fn read<R>(&self, slot: usize, read: impl FnOnce(&Slot) -> R) -> Result<R> {
        self.check_slot(slot)?;
        let slots = self.lock();
        Ok(read(&slots[slot]))
    }

    /// Copy of a slot
    pub fn snapshot(&self, slot: usize) -> Result<Slot> {
        self.read(slot, |bytes| *bytes)
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.slot_count {
            return Err(TelemetryError::SlotOutOfRange {
                slot,
                slots: self.slot_count,
            });
        }
        Ok(())
    }

    // Slots are plain bytes, a panic elsewhere cannot leave them half-valid.
    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
