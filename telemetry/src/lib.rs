/*!
# Telemetry Decoding Core

This crate contains the data model shared by the CAN telemetry gateway:
everything needed to turn raw bus payloads into decoded engine values,
independent of sockets and threads.

## Core Types

- [`CanFrame`] - A received bus frame with a normalized identifier
- [`TrackedIds`] - Sorted index of the identifiers the gateway understands
- [`ProcessImage`] - Latest payload per tracked identifier, behind one lock
- [`ChannelSpec`] - Compiled-in description of one telemetry signal
- [`DecodeTable`] - Channel specs bound to their process image slots
- [`TelemetryRecord`] - One decoded sample ready to go on the wire

## Modules

- [`haltech`] - The Haltech CAN protocol v2 identifier list and channel table
- [`error`] - Common error types
*/

pub mod channel;
pub mod error;
pub mod frame;
pub mod haltech;
pub mod image;
pub mod record;
pub mod tracked;

// Re-export commonly used types
pub use channel::{ChannelSpec, DecodeTable, Encoding};
pub use error::{TelemetryError, Result};
pub use frame::CanFrame;
pub use image::ProcessImage;
pub use record::{DecodedValue, TelemetryRecord};
pub use tracked::TrackedIds;

/// Version information for the telemetry library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    /// Maximum payload of a classic CAN frame, and the size of a process image slot
    pub const MAX_PAYLOAD_LEN: usize = 8;

    /// Mask applied to raw identifiers to strip the EFF/RTR/ERR flag bits
    pub const CAN_ID_MASK: u32 = 0x1FFF_FFFF;

    /// Default UDP port the downstream display listens on
    pub const DEFAULT_TELEMETRY_PORT: u16 = 45454;

    /// Default pause between two passes over the decode table, in milliseconds
    pub const DEFAULT_CADENCE_MS: u64 = 100;
}
