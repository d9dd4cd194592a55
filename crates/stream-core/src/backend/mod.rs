//! Build-time backend selection.
//!
//! Concrete session and device implementations are chosen by cargo feature,
//! never by the stream at runtime. Each enabled backend exports factory
//! constructors; the default backend is the in-memory mock, which is also
//! what the test suite runs against.

#[cfg(feature = "backend-mock")]
use std::sync::Arc;

#[cfg(feature = "backend-mock")]
use crate::device::DeviceFactory;
#[cfg(feature = "backend-mock")]
use crate::session::SessionFactory;

#[cfg(feature = "backend-mock")]
pub mod mock;

/// The session factory for the default enabled backend.
#[cfg(feature = "backend-mock")]
pub fn default_session_factory() -> Arc<dyn SessionFactory> {
    Arc::new(mock::MockBackend::new())
}

/// The device factory for the default enabled backend.
#[cfg(feature = "backend-mock")]
pub fn default_device_factory() -> Arc<dyn DeviceFactory> {
    Arc::new(mock::MockBackend::new())
}
