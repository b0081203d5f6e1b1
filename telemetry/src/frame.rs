/*!
Received CAN frames.

A [`CanFrame`] only lives for the duration of one receive: the ingestion
worker builds it from whatever the bus socket handed over, filters it and
copies its payload into the process image.
*/

use bytes::Bytes;

use crate::protocol::{CAN_ID_MASK, MAX_PAYLOAD_LEN};

/// One frame as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    id: u32,
    payload: Bytes,
}

impl CanFrame {
    /// Build a frame from a raw identifier word and its payload.
    ///
    /// The identifier is normalized with [`CAN_ID_MASK`] so the extended,
    /// remote and error flag bits never take part in lookups. The payload is
    /// kept as received, even when it is longer than a classic frame allows,
    /// so callers can reject it explicitly.
    pub fn new(raw_id: u32, payload: &[u8]) -> Self {
        Self {
            id: raw_id & CAN_ID_MASK,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Normalized identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Payload bytes
    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// True when the payload does not fit in a process image slot
    pub fn is_oversized(&self) -> bool {
        self.payload.len() > MAX_PAYLOAD_LEN
    }
}
