//! Core value types for stream construction and routing.

use crate::device::DeviceId;

/// Stream direction as a raw capability bitmask.
///
/// Kept as a mask rather than a closed enum so an unsupported combination
/// can flow in through attributes and be rejected by `start`/`stop` with an
/// invalid-argument error, instead of being unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction(u32);

impl Direction {
    /// Render path (towards a sink endpoint)
    pub const OUTPUT: Direction = Direction(0x1);
    /// Capture path (from a source endpoint)
    pub const INPUT: Direction = Direction(0x2);
    /// Simultaneous render and capture through one pipeline
    pub const LOOPBACK: Direction = Direction(0x1 | 0x2);

    /// Build a direction from a raw bitmask. No validation happens here;
    /// `topology` is where unsupported masks get rejected.
    pub const fn from_bits(bits: u32) -> Self {
        Direction(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Classify into one of the supported stream topologies.
    pub fn topology(self) -> Option<Topology> {
        match self {
            Direction::OUTPUT => Some(Topology::Output),
            Direction::INPUT => Some(Topology::Input),
            Direction::LOOPBACK => Some(Topology::Loopback),
            _ => None,
        }
    }
}

/// The three supported stream topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Output,
    Input,
    Loopback,
}

/// Logical stream class, as requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    LowLatency,
    DeepBuffer,
    Compressed,
    VoiceCall,
    VoiceUi,
    Loopback,
}

/// PCM sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    S16Le,
    S24Le,
    S32Le,
    F32Le,
}

/// Format snapshot for one direction of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_width: u16,
    pub format: SampleFormat,
}

impl MediaConfig {
    pub fn new(sample_rate: u32, channels: u16, bit_width: u16, format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            bit_width,
            format,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self::new(48000, 2, 16, SampleFormat::S16Le)
    }
}

/// Client-supplied stream attributes.
///
/// Value-copied at construction and on `set_attributes`; the old snapshot is
/// fully replaced, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamAttributes {
    pub stream_type: StreamType,
    pub direction: Direction,
    pub in_media: MediaConfig,
    pub out_media: MediaConfig,
}

impl StreamAttributes {
    pub fn new(
        stream_type: StreamType,
        direction: Direction,
        in_media: MediaConfig,
        out_media: MediaConfig,
    ) -> Self {
        Self {
            stream_type,
            direction,
            in_media,
            out_media,
        }
    }
}

/// Immutable per-call snapshot of the stream handed to session operations.
///
/// Stands in for a back-pointer to the owning stream: the session gets the
/// attributes and routing it needs without borrowing the stream itself.
#[derive(Debug, Clone)]
pub struct StreamContext {
    pub attributes: StreamAttributes,
    pub device_ids: Vec<DeviceId>,
}

impl StreamContext {
    pub fn new(attributes: StreamAttributes, device_ids: Vec<DeviceId>) -> Self {
        Self {
            attributes,
            device_ids,
        }
    }
}
