//! Session capability contract: the DSP/codec pipeline bound to a stream.

use crate::error::SessionError;
use crate::types::{StreamAttributes, StreamContext};

/// Endpoint a data transfer runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EndpointKind {
    /// Shared-memory channel between the client buffer and the pipeline.
    /// This is the fixed endpoint used by stream read/write.
    ShMem,
    /// Hardware-facing endpoint inside the processing graph
    Device,
}

/// Which configuration table a `set_config` push targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Module-level key/value update
    Module,
    /// Calibration key/value update
    Calibration,
    /// Tagged key/value update
    Tag,
}

/// Flags accompanying a write transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteFlags(u32);

impl WriteFlags {
    pub const NONE: WriteFlags = WriteFlags(0);
    /// Marks the final buffer of the stream
    pub const EOS: WriteFlags = WriteFlags(0x1);

    pub const fn is_eos(self) -> bool {
        self.0 & Self::EOS.0 != 0
    }
}

/// One DSP/codec processing pipeline, exclusively owned by one stream.
///
/// All calls are synchronous and blocking; cancellation and timeouts, if
/// any, live inside the implementation. A per-call context snapshot gives
/// the session the attributes and routing of its owning stream.
pub trait Session: Send {
    fn open(&mut self, ctx: &StreamContext) -> Result<(), SessionError>;
    fn close(&mut self, ctx: &StreamContext) -> Result<(), SessionError>;
    fn prepare(&mut self, ctx: &StreamContext) -> Result<(), SessionError>;
    fn start(&mut self, ctx: &StreamContext) -> Result<(), SessionError>;
    fn stop(&mut self, ctx: &StreamContext) -> Result<(), SessionError>;

    /// Push a configuration update of the given kind to the pipeline.
    fn set_config(
        &mut self,
        ctx: &StreamContext,
        kind: ConfigKind,
        tag: u32,
    ) -> Result<(), SessionError>;

    /// Pull captured data from an endpoint into `buf`; returns bytes read.
    fn read(
        &mut self,
        ctx: &StreamContext,
        endpoint: EndpointKind,
        buf: &mut [u8],
    ) -> Result<usize, SessionError>;

    /// Push `buf` into an endpoint; returns bytes written.
    fn write(
        &mut self,
        ctx: &StreamContext,
        endpoint: EndpointKind,
        buf: &[u8],
        flags: WriteFlags,
    ) -> Result<usize, SessionError>;
}

/// Creates the session for a stream under construction.
///
/// The concrete backend behind this factory is a build/configuration-time
/// choice (see [`backend`](crate::backend)); the stream itself never selects
/// an implementation.
pub trait SessionFactory: Send + Sync {
    fn create(&self, attributes: &StreamAttributes) -> Result<Box<dyn Session>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_flags() {
        assert!(!WriteFlags::NONE.is_eos());
        assert!(WriteFlags::EOS.is_eos());
        assert_eq!(WriteFlags::default(), WriteFlags::NONE);
    }
}
