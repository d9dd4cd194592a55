//! Stream/session/device orchestration core for the OPAL audio abstraction layer.
//!
//! A [`Stream`] turns a client's logical audio stream (direction, format,
//! device list) into a coordinated sequence of lifecycle operations across
//! one processing [`Session`] (the DSP/codec pipeline) and one or more
//! physical [`Device`] endpoints. The core enforces the direction-dependent
//! ordering of those operations, serializes concurrent control calls, and
//! propagates the first failing sub-operation's error without retrying.
//!
//! Signal processing, device enumeration policy, and buffer format
//! negotiation all live behind the [`Session`] and [`Device`] capability
//! traits; concrete backends are selected at build time through the
//! [`backend`] module.

pub mod backend;
pub mod device;
pub mod error;
pub mod resource;
pub mod session;
pub mod stream;
pub mod types;

pub use device::{Device, DeviceDescriptor, DeviceFactory, DeviceId};
pub use error::{DeviceError, Result, SessionError, StreamError};
pub use resource::ResourceManager;
pub use session::{ConfigKind, EndpointKind, Session, SessionFactory, WriteFlags};
pub use stream::{Phase, Stream};
pub use types::{
    Direction, MediaConfig, SampleFormat, StreamAttributes, StreamContext, StreamType, Topology,
};
