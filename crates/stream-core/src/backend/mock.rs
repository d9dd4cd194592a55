//! In-memory mock backend.
//!
//! Sessions and devices that record every call into a shared journal and
//! enforce their own lifecycle state machines. Failures can be injected per
//! call site, and an optional per-call latency widens race windows so the
//! concurrency tests can catch ordering violations.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::device::{Device, DeviceDescriptor, DeviceFactory, DeviceId};
use crate::error::{DeviceError, SessionError};
use crate::resource::ResourceManager;
use crate::session::{ConfigKind, EndpointKind, Session, SessionFactory, WriteFlags};
use crate::types::{StreamAttributes, StreamContext};

/// Shared append-only record of every backend call, in arrival order.
///
/// Entries are `"session.<op>"` for session calls and `"<DeviceId>.<op>"`
/// for device calls, e.g. `"Speaker.start"`.
#[derive(Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallJournal {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

type FailurePlan = Arc<Mutex<HashMap<String, i32>>>;

fn planned_failure(failures: &FailurePlan, entry: &str) -> Option<i32> {
    failures.lock().get(entry).copied()
}

/// Factory for mock sessions and devices sharing one journal and one
/// failure plan.
#[derive(Clone, Default)]
pub struct MockBackend {
    journal: CallJournal,
    failures: FailurePlan,
    latency: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every session and device call. Concurrency tests use
    /// this to make unserialized interleavings overwhelmingly likely to
    /// show up in the journal.
    pub fn with_call_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn journal(&self) -> CallJournal {
        self.journal.clone()
    }

    /// Make the named call site fail with the given backend status code.
    pub fn fail_on(&self, entry: &str, code: i32) {
        self.failures.lock().insert(entry.to_string(), code);
    }
}

impl SessionFactory for MockBackend {
    fn create(&self, attributes: &StreamAttributes) -> Result<Box<dyn Session>, SessionError> {
        self.journal.record("session.create");
        if let Some(code) = planned_failure(&self.failures, "session.create") {
            return Err(SessionError::graph_setup(format!(
                "injected failure {code}"
            )));
        }
        debug!(direction = attributes.direction.bits(), "mock session created");
        Ok(Box::new(MockSession {
            journal: self.journal.clone(),
            failures: self.failures.clone(),
            latency: self.latency,
            state: SessionState::Created,
        }))
    }
}

impl DeviceFactory for MockBackend {
    fn create(
        &self,
        descriptor: &DeviceDescriptor,
        _resources: &Arc<ResourceManager>,
    ) -> Result<Box<dyn Device>, DeviceError> {
        let entry = format!("{:?}.create", descriptor.id);
        self.journal.record(entry.clone());
        if let Some(code) = planned_failure(&self.failures, &entry) {
            return Err(DeviceError::unavailable(
                descriptor.id,
                format!("injected failure {code}"),
            ));
        }
        Ok(Box::new(MockDevice {
            id: descriptor.id,
            journal: self.journal.clone(),
            failures: self.failures.clone(),
            latency: self.latency,
            state: DeviceState::Created,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Created,
    Opened,
    Prepared,
    Started,
    Stopped,
    Closed,
}

pub struct MockSession {
    journal: CallJournal,
    failures: FailurePlan,
    latency: Option<Duration>,
    state: SessionState,
}

impl MockSession {
    /// Record the call, apply latency, and surface any injected failure.
    fn enter(&self, operation: &str) -> Result<(), SessionError> {
        let entry = format!("session.{operation}");
        self.journal.record(entry.clone());
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        if let Some(code) = planned_failure(&self.failures, &entry) {
            return Err(SessionError::backend(code, "injected failure"));
        }
        Ok(())
    }
}

impl Session for MockSession {
    fn open(&mut self, _ctx: &StreamContext) -> Result<(), SessionError> {
        self.enter("open")?;
        match self.state {
            SessionState::Created | SessionState::Closed => {
                self.state = SessionState::Opened;
                Ok(())
            }
            _ => Err(SessionError::NotReady { operation: "open" }),
        }
    }

    fn close(&mut self, _ctx: &StreamContext) -> Result<(), SessionError> {
        self.enter("close")?;
        self.state = SessionState::Closed;
        Ok(())
    }

    fn prepare(&mut self, _ctx: &StreamContext) -> Result<(), SessionError> {
        self.enter("prepare")?;
        match self.state {
            SessionState::Opened | SessionState::Prepared | SessionState::Stopped => {
                self.state = SessionState::Prepared;
                Ok(())
            }
            _ => Err(SessionError::NotReady {
                operation: "prepare",
            }),
        }
    }

    fn start(&mut self, _ctx: &StreamContext) -> Result<(), SessionError> {
        self.enter("start")?;
        match self.state {
            SessionState::Prepared => {
                self.state = SessionState::Started;
                Ok(())
            }
            _ => Err(SessionError::NotReady { operation: "start" }),
        }
    }

    fn stop(&mut self, _ctx: &StreamContext) -> Result<(), SessionError> {
        self.enter("stop")?;
        match self.state {
            SessionState::Started => {
                self.state = SessionState::Stopped;
                Ok(())
            }
            _ => Err(SessionError::NotReady { operation: "stop" }),
        }
    }

    fn set_config(
        &mut self,
        _ctx: &StreamContext,
        _kind: ConfigKind,
        _tag: u32,
    ) -> Result<(), SessionError> {
        self.enter("set_config")
    }

    fn read(
        &mut self,
        _ctx: &StreamContext,
        _endpoint: EndpointKind,
        buf: &mut [u8],
    ) -> Result<usize, SessionError> {
        self.enter("read")?;
        if self.state != SessionState::Started {
            return Err(SessionError::NotReady { operation: "read" });
        }
        buf.fill(0);
        Ok(buf.len())
    }

    fn write(
        &mut self,
        _ctx: &StreamContext,
        _endpoint: EndpointKind,
        buf: &[u8],
        _flags: WriteFlags,
    ) -> Result<usize, SessionError> {
        self.enter("write")?;
        if self.state != SessionState::Started {
            return Err(SessionError::NotReady { operation: "write" });
        }
        Ok(buf.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceState {
    Created,
    Opened,
    Started,
    Stopped,
    Closed,
}

pub struct MockDevice {
    id: DeviceId,
    journal: CallJournal,
    failures: FailurePlan,
    latency: Option<Duration>,
    state: DeviceState,
}

impl MockDevice {
    fn enter(&self, operation: &str) -> Result<(), DeviceError> {
        let entry = format!("{:?}.{operation}", self.id);
        self.journal.record(entry.clone());
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        if let Some(code) = planned_failure(&self.failures, &entry) {
            return Err(DeviceError::backend(self.id, code, "injected failure"));
        }
        Ok(())
    }
}

impl Device for MockDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        self.enter("open")?;
        match self.state {
            DeviceState::Created | DeviceState::Closed => {
                self.state = DeviceState::Opened;
                Ok(())
            }
            _ => Err(DeviceError::NotReady {
                id: self.id,
                operation: "open",
            }),
        }
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.enter("close")?;
        self.state = DeviceState::Closed;
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        self.enter("start")?;
        match self.state {
            DeviceState::Opened | DeviceState::Stopped => {
                self.state = DeviceState::Started;
                Ok(())
            }
            _ => Err(DeviceError::NotReady {
                id: self.id,
                operation: "start",
            }),
        }
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.enter("stop")?;
        match self.state {
            DeviceState::Started => {
                self.state = DeviceState::Stopped;
                Ok(())
            }
            _ => Err(DeviceError::NotReady {
                id: self.id,
                operation: "stop",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, MediaConfig, StreamType};

    fn attrs() -> StreamAttributes {
        StreamAttributes::new(
            StreamType::LowLatency,
            Direction::OUTPUT,
            MediaConfig::default(),
            MediaConfig::default(),
        )
    }

    fn ctx() -> StreamContext {
        StreamContext::new(attrs(), vec![DeviceId::Speaker])
    }

    #[test]
    fn test_session_enforces_call_order() {
        let backend = MockBackend::new();
        let mut session = SessionFactory::create(&backend, &attrs()).unwrap();
        let ctx = ctx();

        assert!(matches!(
            session.start(&ctx),
            Err(SessionError::NotReady { operation: "start" })
        ));
        session.open(&ctx).unwrap();
        session.prepare(&ctx).unwrap();
        session.start(&ctx).unwrap();
        session.stop(&ctx).unwrap();
        session.close(&ctx).unwrap();

        assert_eq!(
            backend.journal().take(),
            vec![
                "session.create",
                "session.start",
                "session.open",
                "session.prepare",
                "session.start",
                "session.stop",
                "session.close",
            ]
        );
    }

    #[test]
    fn test_injected_failure_carries_code() {
        let backend = MockBackend::new();
        backend.fail_on("session.open", -19);
        let mut session = SessionFactory::create(&backend, &attrs()).unwrap();

        let err = session.open(&ctx()).unwrap_err();
        assert_eq!(err, SessionError::backend(-19, "injected failure"));
    }

    #[test]
    fn test_device_lifecycle_and_journal_naming() {
        let backend = MockBackend::new();
        let resources = ResourceManager::with_defaults();
        let descriptor = DeviceDescriptor::new(DeviceId::VaMic, MediaConfig::default());
        let mut device = DeviceFactory::create(&backend, &descriptor, &resources).unwrap();

        device.open().unwrap();
        device.start().unwrap();
        device.stop().unwrap();
        device.close().unwrap();
        assert!(matches!(
            device.stop(),
            Err(DeviceError::NotReady { operation: "stop", .. })
        ));

        assert_eq!(
            backend.journal().take(),
            vec![
                "VaMic.create",
                "VaMic.open",
                "VaMic.start",
                "VaMic.stop",
                "VaMic.close",
                "VaMic.stop",
            ]
        );
    }
}
