/*!
Common error types for the telemetry decoding core.
*/

use thiserror::Error;

/// Common result type used throughout the telemetry library
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while building the decode table or touching the process image
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// A channel reads from an identifier that is not tracked
    #[error("channel '{channel}' reads CAN ID 0x{can_id:03X}, which is not tracked")]
    UntrackedSource { channel: &'static str, can_id: u32 },

    /// A channel byte offset falls outside a process image slot
    #[error("channel '{channel}' uses byte offset {offset}, slot holds {capacity} bytes")]
    OffsetOutOfRange {
        channel: &'static str,
        offset: usize,
        capacity: usize,
    },

    /// A flag channel selects a bit that does not exist in a byte
    #[error("channel '{channel}' uses bit position {bit}")]
    BitOutOfRange { channel: &'static str, bit: u8 },

    /// A payload longer than a slot was offered to the process image
    #[error("payload of {len} bytes exceeds slot capacity of {capacity}")]
    PayloadTooLong { len: usize, capacity: usize },

    /// A slot index past the end of the process image
    #[error("slot {slot} out of range (process image has {slots} slots)")]
    SlotOutOfRange { slot: usize, slots: usize },
}
