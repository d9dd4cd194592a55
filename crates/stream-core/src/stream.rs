//! Stream lifecycle orchestration across one session and its devices.
//!
//! A [`Stream`] owns exactly one [`Session`] and an ordered device list
//! fixed at construction. Lifecycle calls fan out to the session and the
//! devices in a direction-dependent order:
//!
//! | topology | start | stop |
//! |---|---|---|
//! | output | devices → prepare → session | session → devices |
//! | input | prepare → session → devices | devices → session |
//! | loopback | out-devices → prepare → session → in-devices | in-devices → session → out-devices |
//!
//! A render endpoint must be ready before the pipeline pushes data into it;
//! a capture pipeline must be armed before its source starts producing.
//! Loopback composes both rules, bracketing the pipeline outside-in on
//! start and inside-out on stop.
//!
//! Locking: a control lock serializes all lifecycle transitions against
//! each other, and a separate session lock serializes the data path.
//! Control operations acquire control before session; `read`/`write` check
//! the phase gate under the control lock, release it, and run the transfer
//! under the session lock only, so a long transfer never blocks control
//! calls that stay off the session.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::device::{Device, DeviceDescriptor, DeviceFactory, DeviceId};
use crate::error::{Result, StreamError};
use crate::resource::ResourceManager;
use crate::session::{ConfigKind, EndpointKind, Session, SessionFactory, WriteFlags};
use crate::types::{StreamAttributes, StreamContext, Topology};

/// Lifecycle phase, tracked for the read/write state gate.
///
/// Control transitions do not validate their own preconditions against this;
/// the session and devices fail in order when driven out of sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Opened,
    Prepared,
    Running,
    Stopped,
    Closed,
}

struct ControlState {
    attributes: StreamAttributes,
    devices: Vec<Box<dyn Device>>,
    phase: Phase,
}

/// A client-facing audio stream: one session, one ordered device list, and
/// the ordering/concurrency/failure policy tying them together.
pub struct Stream {
    control: Mutex<ControlState>,
    session: Mutex<Box<dyn Session>>,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl Stream {
    /// Construct a stream from attributes and a device descriptor list.
    ///
    /// Creates exactly one session, then one device per descriptor in list
    /// order. Construction fails atomically with an allocation error if any
    /// piece cannot be created; devices created before the failure are
    /// released. The value is unshared until this returns, so nothing can
    /// interleave with construction.
    pub fn new(
        attributes: StreamAttributes,
        descriptors: &[DeviceDescriptor],
        resources: Arc<ResourceManager>,
        sessions: &dyn SessionFactory,
        device_factory: &dyn DeviceFactory,
    ) -> Result<Self> {
        debug!(
            direction = attributes.direction.bits(),
            devices = descriptors.len(),
            "creating stream"
        );

        let session = sessions.create(&attributes).map_err(|e| {
            error!(%e, "session creation failed");
            StreamError::allocation("session", e.to_string())
        })?;

        let mut devices: Vec<Box<dyn Device>> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match device_factory.create(descriptor, &resources) {
                Ok(device) => devices.push(device),
                Err(e) => {
                    error!(id = ?descriptor.id, %e, "device creation failed");
                    // dropping `devices` here releases everything created so far
                    return Err(StreamError::allocation("device", e.to_string()));
                }
            }
        }

        Ok(Self {
            control: Mutex::new(ControlState {
                attributes,
                devices,
                phase: Phase::Created,
            }),
            session: Mutex::new(session),
        })
    }

    /// Open the session, then every device in list order.
    ///
    /// The pipeline must exist before endpoints attach to it. On a device
    /// failure the already-opened devices and the session are closed again
    /// in reverse order and the original error is returned.
    pub fn open(&self) -> Result<()> {
        let mut state = self.control.lock();
        let ctx = snapshot(&state);
        debug!(devices = state.devices.len(), "opening stream");

        self.session.lock().open(&ctx).map_err(|e| {
            error!(%e, "session open failed");
            StreamError::from(e)
        })?;

        for i in 0..state.devices.len() {
            if let Err(e) = state.devices[i].open() {
                let id = state.devices[i].id();
                error!(?id, %e, "device open failed");
                self.unwind_open(&mut state, i, &ctx);
                return Err(e.into());
            }
        }

        state.phase = Phase::Opened;
        Ok(())
    }

    /// Close every device in list order, then the session.
    ///
    /// Endpoints must not stay live against a pipeline that no longer
    /// exists. The first failure aborts the sequence; the phase is left
    /// unchanged so the caller can retry the full teardown.
    pub fn close(&self) -> Result<()> {
        let mut state = self.control.lock();
        let ctx = snapshot(&state);
        debug!(devices = state.devices.len(), "closing stream");

        for i in 0..state.devices.len() {
            if let Err(e) = state.devices[i].close() {
                let id = state.devices[i].id();
                error!(?id, %e, "device close failed");
                return Err(e.into());
            }
        }

        self.session.lock().close(&ctx).map_err(|e| {
            error!(%e, "session close failed");
            StreamError::from(e)
        })?;

        state.phase = Phase::Closed;
        Ok(())
    }

    /// Start the stream in its direction-dependent order.
    ///
    /// An unsupported direction is rejected before any collaborator is
    /// touched. The first failing sub-operation aborts the sequence; steps
    /// that already completed are unwound with compensating stops (best
    /// effort, logged) before the original error is returned.
    pub fn start(&self) -> Result<()> {
        let mut state = self.control.lock();
        let topology = self.classify(&state, "start")?;
        let ctx = snapshot(&state);
        debug!(?topology, devices = state.devices.len(), "starting stream");

        match topology {
            Topology::Output => self.start_output(&mut state, &ctx)?,
            Topology::Input => self.start_input(&mut state, &ctx)?,
            Topology::Loopback => self.start_loopback(&mut state, &ctx)?,
        }

        state.phase = Phase::Running;
        Ok(())
    }

    /// Stop the stream in the reverse-role order of `start`.
    ///
    /// Teardown is not unwound: on the first failure the error is returned
    /// and the phase is left unchanged so the caller can retry.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.control.lock();
        let topology = self.classify(&state, "stop")?;
        let ctx = snapshot(&state);
        debug!(?topology, devices = state.devices.len(), "stopping stream");

        match topology {
            Topology::Output => {
                self.stop_session(&ctx)?;
                stop_devices(&mut state, |_| true)?;
            }
            Topology::Input => {
                stop_devices(&mut state, |_| true)?;
                self.stop_session(&ctx)?;
            }
            Topology::Loopback => {
                stop_devices(&mut state, DeviceId::is_input)?;
                self.stop_session(&ctx)?;
                stop_devices(&mut state, DeviceId::is_output)?;
            }
        }

        state.phase = Phase::Stopped;
        Ok(())
    }

    /// Forward to the session's prepare; devices are not touched here.
    /// The session's status is returned verbatim.
    pub fn prepare(&self) -> Result<()> {
        let mut state = self.control.lock();
        let ctx = snapshot(&state);

        self.session.lock().prepare(&ctx).map_err(|e| {
            error!(%e, "session prepare failed");
            StreamError::from(e)
        })?;

        state.phase = Phase::Prepared;
        Ok(())
    }

    /// Replace the attribute snapshot wholesale and push a module-level
    /// config update to the session, in one critical section.
    pub fn set_attributes(&self, attributes: StreamAttributes) -> Result<()> {
        let mut state = self.control.lock();
        state.attributes = attributes;
        let ctx = snapshot(&state);
        debug!("stream attributes replaced");

        self.session
            .lock()
            .set_config(&ctx, ConfigKind::Module, 0)
            .map_err(|e| {
                error!(%e, "session set_config failed");
                StreamError::from(e)
            })
    }

    /// Pull captured data from the shared-memory endpoint into `buf`.
    ///
    /// Requires the stream to be running; returns the byte count on success
    /// and the session's error verbatim otherwise.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let ctx = self.transfer_gate("read")?;
        let mut session = self.session.lock();
        match session.read(&ctx, EndpointKind::ShMem, buf) {
            Ok(bytes) => {
                debug!(bytes, "session read complete");
                Ok(bytes)
            }
            Err(e) => {
                error!(%e, "session read failed");
                Err(e.into())
            }
        }
    }

    /// Push `buf` into the shared-memory endpoint.
    ///
    /// Requires the stream to be running; returns the byte count on success
    /// and the session's error verbatim otherwise.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let ctx = self.transfer_gate("write")?;
        let mut session = self.session.lock();
        match session.write(&ctx, EndpointKind::ShMem, buf, WriteFlags::NONE) {
            Ok(bytes) => {
                debug!(bytes, "session write complete");
                Ok(bytes)
            }
            Err(e) => {
                error!(%e, "session write failed");
                Err(e.into())
            }
        }
    }

    /// Current attribute snapshot.
    pub fn attributes(&self) -> StreamAttributes {
        self.control.lock().attributes.clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.control.lock().phase
    }

    /// Device identifiers in list order.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.control.lock().devices.iter().map(|d| d.id()).collect()
    }

    fn classify(&self, state: &ControlState, operation: &'static str) -> Result<Topology> {
        state.attributes.direction.topology().ok_or_else(|| {
            let value = state.attributes.direction.bits();
            error!(value, operation, "unsupported stream direction");
            StreamError::InvalidDirection { value }
        })
    }

    /// The phase gate for data transfers: running streams only. Returns the
    /// context snapshot so the transfer itself runs off the control lock.
    fn transfer_gate(&self, operation: &'static str) -> Result<StreamContext> {
        let state = self.control.lock();
        if state.phase != Phase::Running {
            return Err(StreamError::InvalidState {
                operation,
                phase: state.phase,
            });
        }
        Ok(snapshot(&state))
    }

    fn start_output(&self, state: &mut ControlState, ctx: &StreamContext) -> Result<()> {
        let mut started = Vec::new();
        for i in 0..state.devices.len() {
            if let Err(e) = state.devices[i].start() {
                let id = state.devices[i].id();
                error!(?id, %e, "render device start failed");
                unwind_devices(state, &started);
                return Err(e.into());
            }
            started.push(i);
        }

        let mut session = self.session.lock();
        if let Err(e) = session.prepare(ctx) {
            error!(%e, "session prepare failed");
            drop(session);
            unwind_devices(state, &started);
            return Err(e.into());
        }
        if let Err(e) = session.start(ctx) {
            error!(%e, "session start failed");
            drop(session);
            unwind_devices(state, &started);
            return Err(e.into());
        }
        Ok(())
    }

    fn start_input(&self, state: &mut ControlState, ctx: &StreamContext) -> Result<()> {
        {
            let mut session = self.session.lock();
            session.prepare(ctx).map_err(|e| {
                error!(%e, "session prepare failed");
                StreamError::from(e)
            })?;
            session.start(ctx).map_err(|e| {
                error!(%e, "session start failed");
                StreamError::from(e)
            })?;
        }

        let mut started = Vec::new();
        for i in 0..state.devices.len() {
            if let Err(e) = state.devices[i].start() {
                let id = state.devices[i].id();
                error!(?id, %e, "capture device start failed");
                unwind_devices(state, &started);
                self.unwind_session(ctx);
                return Err(e.into());
            }
            started.push(i);
        }
        Ok(())
    }

    fn start_loopback(&self, state: &mut ControlState, ctx: &StreamContext) -> Result<()> {
        // render side first: the sink must be live before the pipeline runs
        let mut started_out = Vec::new();
        for i in 0..state.devices.len() {
            if !state.devices[i].id().is_output() {
                continue;
            }
            if let Err(e) = state.devices[i].start() {
                let id = state.devices[i].id();
                error!(?id, %e, "render device start failed");
                unwind_devices(state, &started_out);
                return Err(e.into());
            }
            started_out.push(i);
        }

        {
            let mut session = self.session.lock();
            if let Err(e) = session.prepare(ctx) {
                error!(%e, "session prepare failed");
                drop(session);
                unwind_devices(state, &started_out);
                return Err(e.into());
            }
            if let Err(e) = session.start(ctx) {
                error!(%e, "session start failed");
                drop(session);
                unwind_devices(state, &started_out);
                return Err(e.into());
            }
        }

        // capture side last; ids outside both ranges are skipped silently
        let mut started_in = Vec::new();
        for i in 0..state.devices.len() {
            if !state.devices[i].id().is_input() {
                continue;
            }
            if let Err(e) = state.devices[i].start() {
                let id = state.devices[i].id();
                error!(?id, %e, "capture device start failed");
                // inside-out: capture side, then pipeline, then render side
                unwind_devices(state, &started_in);
                self.unwind_session(ctx);
                unwind_devices(state, &started_out);
                return Err(e.into());
            }
            started_in.push(i);
        }
        Ok(())
    }

    fn stop_session(&self, ctx: &StreamContext) -> Result<()> {
        self.session.lock().stop(ctx).map_err(|e| {
            error!(%e, "session stop failed");
            StreamError::from(e)
        })
    }

    /// Compensating session stop after a partial start.
    fn unwind_session(&self, ctx: &StreamContext) {
        if let Err(e) = self.session.lock().stop(ctx) {
            warn!(%e, "unwind: session stop failed");
        }
    }

    /// Compensating device closes after a partial open: the `opened` devices
    /// in reverse order, then the session.
    fn unwind_open(&self, state: &mut ControlState, opened: usize, ctx: &StreamContext) {
        warn!(opened, "unwinding partially opened stream");
        for i in (0..opened).rev() {
            let id = state.devices[i].id();
            if let Err(e) = state.devices[i].close() {
                warn!(?id, %e, "unwind: device close failed");
            }
        }
        if let Err(e) = self.session.lock().close(ctx) {
            warn!(%e, "unwind: session close failed");
        }
    }
}

/// Snapshot of attributes and routing handed to session calls.
fn snapshot(state: &ControlState) -> StreamContext {
    StreamContext::new(
        state.attributes.clone(),
        state.devices.iter().map(|d| d.id()).collect(),
    )
}

/// Compensating device stops after a partial start, in reverse start order.
fn unwind_devices(state: &mut ControlState, started: &[usize]) {
    for &i in started.iter().rev() {
        let id = state.devices[i].id();
        if let Err(e) = state.devices[i].stop() {
            warn!(?id, %e, "unwind: device stop failed");
        }
    }
}

/// Stop every device matching `filter`, in list order; first failure aborts.
fn stop_devices(state: &mut ControlState, filter: impl Fn(DeviceId) -> bool) -> Result<()> {
    for i in 0..state.devices.len() {
        let id = state.devices[i].id();
        if !filter(id) {
            continue;
        }
        if let Err(e) = state.devices[i].stop() {
            error!(?id, %e, "device stop failed");
            return Err(e.into());
        }
    }
    Ok(())
}
