/*!
Channel decode table.

A [`ChannelSpec`] says where one telemetry signal lives inside a tracked
identifier's payload and how to turn those bytes into a physical value.
[`DecodeTable`] binds every spec to its process image slot once, at startup,
so the transmission loop never has to search while it runs.
*/

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::image::{ProcessImage, Slot};
use crate::protocol::MAX_PAYLOAD_LEN;
use crate::record::{DecodedValue, TelemetryRecord};
use crate::tracked::TrackedIds;

/// How a channel's bytes are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Encoding {
    /// 16-bit two's complement word; `high` holds the high-order byte.
    /// Channels choose their own order, `high` may come after `low`.
    SignedWord { high: usize, low: usize },
    /// Single bit `bit` (0 = LSB) of the byte at `byte`
    Flag { byte: usize, bit: u8 },
}

impl Encoding {
    /// Extract the raw quantity from a slot.
    ///
    /// Offsets must already be validated against the slot size.
    pub fn extract(&self, slot: &Slot) -> i16 {
        match *self {
            Self::SignedWord { high, low } => i16::from_be_bytes([slot[high], slot[low]]),
            Self::Flag { byte, bit } => ((slot[byte] >> bit) & 1) as i16,
        }
    }

    fn validate(&self, channel: &'static str) -> Result<()> {
        let offsets = match *self {
            Self::SignedWord { high, low } => [high, low],
            Self::Flag { byte, .. } => [byte, byte],
        };

        if let Some(&offset) = offsets.iter().find(|&&o| o >= MAX_PAYLOAD_LEN) {
            return Err(TelemetryError::OffsetOutOfRange {
                channel,
                offset,
                capacity: MAX_PAYLOAD_LEN,
            });
        }

        if let Self::Flag { bit, .. } = *self {
            if bit >= 8 {
                return Err(TelemetryError::BitOutOfRange { channel, bit });
            }
        }

        Ok(())
    }
}

/// Compiled-in description of one telemetry signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSpec {
    /// Human readable label, only used for logs and listings
    pub label: &'static str,
    pub encoding: Encoding,
    /// Identifier whose payload carries the signal
    pub can_id: u32,
    pub scale: f64,
    /// Subtracted after scaling
    pub offset: f64,
    pub unit: Option<&'static str>,
    /// Key the downstream consumer files the value under
    pub point_id: u32,
}

impl ChannelSpec {
    /// Signed word channel: `value = raw * scale - offset`
    pub const fn word(
        label: &'static str,
        can_id: u32,
        (high, low): (usize, usize),
        scale: f64,
        offset: f64,
        unit: Option<&'static str>,
        point_id: u32,
    ) -> Self {
        Self {
            label,
            encoding: Encoding::SignedWord { high, low },
            can_id,
            scale,
            offset,
            unit,
            point_id,
        }
    }

    /// Flag channel; a negative `scale` inverts the sign of the bit
    pub const fn flag(
        label: &'static str,
        can_id: u32,
        (byte, bit): (usize, u8),
        scale: f64,
        point_id: u32,
    ) -> Self {
        Self {
            label,
            encoding: Encoding::Flag { byte, bit },
            can_id,
            scale,
            offset: 0.0,
            unit: None,
            point_id,
        }
    }

    /// Turn an extracted raw quantity into the channel's value
    pub fn decode_raw(&self, raw: i16) -> DecodedValue {
        match self.encoding {
            Encoding::SignedWord { .. } => {
                DecodedValue::Numeric(f64::from(raw) * self.scale - self.offset)
            }
            Encoding::Flag { .. } => {
                let bit = raw as i8;
                DecodedValue::Flag(if self.scale < 0.0 { -bit } else { bit })
            }
        }
    }

    /// Decode the channel from a slot snapshot
    pub fn decode(&self, slot: &Slot) -> TelemetryRecord {
        TelemetryRecord::new(self.point_id, self.decode_raw(self.encoding.extract(slot)))
    }
}

/// A channel bound to its process image slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundChannel {
    pub spec: ChannelSpec,
    pub slot: usize,
}

/// One decoded channel, with the raw quantity kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub raw: i16,
    pub record: TelemetryRecord,
}

impl BoundChannel {
    /// Read the channel's bytes from the image and decode them.
    ///
    /// The image lock covers only the byte extraction.
    pub fn sample(&self, image: &ProcessImage) -> Result<Sample> {
        let raw = image.read(self.slot, |bytes| self.spec.encoding.extract(bytes))?;
        Ok(Sample {
            raw,
            record: TelemetryRecord::new(self.spec.point_id, self.spec.decode_raw(raw)),
        })
    }
}

/// Channel specs in transmission order, each resolved to a slot
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeTable {
    channels: Vec<BoundChannel>,
}

impl DecodeTable {
    /// Bind every spec to its slot, rejecting channels that could never decode
    pub fn new(specs: &[ChannelSpec], tracked: &TrackedIds) -> Result<Self> {
        let channels = specs
            .iter()
            .map(|spec| {
                spec.encoding.validate(spec.label)?;
                let slot = tracked
                    .slot_of(spec.can_id)
                    .ok_or(TelemetryError::UntrackedSource {
                        channel: spec.label,
                        can_id: spec.can_id,
                    })?;
                Ok(BoundChannel { spec: *spec, slot })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Bound {} channels over {} tracked IDs", channels.len(), tracked.len());
        Ok(Self { channels })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BoundChannel> {
        self.channels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundChannel> {
        self.channels.iter()
    }
}
