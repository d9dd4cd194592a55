//! Device endpoint capability contract and identifier classification.

use std::sync::Arc;

use crate::error::DeviceError;
use crate::resource::ResourceManager;
use crate::types::MediaConfig;

/// Physical endpoint identifiers.
///
/// The numeric bands are load-bearing: `1..=99` is the output range and
/// `101..=199` the input range. Loopback streams partition their device list
/// at runtime by testing each id against these two disjoint bands, so no
/// separate output/input index is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DeviceId {
    None = 0,
    // output range
    Earpiece = 1,
    Speaker = 2,
    WiredHeadset = 3,
    WiredHeadphone = 4,
    LineOut = 5,
    HdmiOut = 6,
    BluetoothSco = 7,
    BluetoothA2dp = 8,
    UsbHeadsetOut = 9,
    ProxyOut = 10,
    // input range
    HandsetMic = 101,
    HeadsetMic = 102,
    SpeakerMic = 103,
    LineIn = 104,
    BluetoothScoMic = 105,
    UsbHeadsetIn = 106,
    VaMic = 107,
    ProxyIn = 108,
}

impl DeviceId {
    const OUT_MIN: u32 = DeviceId::Earpiece as u32;
    const OUT_MAX: u32 = DeviceId::ProxyOut as u32;
    const IN_MIN: u32 = DeviceId::HandsetMic as u32;
    const IN_MAX: u32 = DeviceId::ProxyIn as u32;

    /// Whether this id falls in the output (render endpoint) range.
    pub fn is_output(self) -> bool {
        (Self::OUT_MIN..=Self::OUT_MAX).contains(&(self as u32))
    }

    /// Whether this id falls in the input (capture endpoint) range.
    pub fn is_input(self) -> bool {
        (Self::IN_MIN..=Self::IN_MAX).contains(&(self as u32))
    }

    /// Resolve a symbolic device name from the platform capability tables.
    pub fn from_name(name: &str) -> Option<DeviceId> {
        match name {
            "earpiece" => Some(Self::Earpiece),
            "speaker" => Some(Self::Speaker),
            "wired-headset" => Some(Self::WiredHeadset),
            "wired-headphone" => Some(Self::WiredHeadphone),
            "line-out" => Some(Self::LineOut),
            "hdmi-out" => Some(Self::HdmiOut),
            "bt-sco" => Some(Self::BluetoothSco),
            "bt-a2dp" => Some(Self::BluetoothA2dp),
            "usb-headset-out" => Some(Self::UsbHeadsetOut),
            "proxy-out" => Some(Self::ProxyOut),
            "handset-mic" => Some(Self::HandsetMic),
            "headset-mic" => Some(Self::HeadsetMic),
            "speaker-mic" => Some(Self::SpeakerMic),
            "line-in" => Some(Self::LineIn),
            "bt-sco-mic" => Some(Self::BluetoothScoMic),
            "usb-headset-in" => Some(Self::UsbHeadsetIn),
            "va-mic" => Some(Self::VaMic),
            "proxy-in" => Some(Self::ProxyIn),
            _ => None,
        }
    }
}

/// Construction-time request for one device endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub media: MediaConfig,
}

impl DeviceDescriptor {
    pub fn new(id: DeviceId, media: MediaConfig) -> Self {
        Self { id, media }
    }
}

/// One physical audio endpoint.
///
/// The stream owns its devices exclusively and drives the whole lifecycle;
/// implementations only need to fail when called out of order.
pub trait Device: Send {
    fn id(&self) -> DeviceId;
    fn open(&mut self) -> Result<(), DeviceError>;
    fn close(&mut self) -> Result<(), DeviceError>;
    fn start(&mut self) -> Result<(), DeviceError>;
    fn stop(&mut self) -> Result<(), DeviceError>;
}

/// Creates device endpoints for a stream under construction.
pub trait DeviceFactory: Send + Sync {
    fn create(
        &self,
        descriptor: &DeviceDescriptor,
        resources: &Arc<ResourceManager>,
    ) -> Result<Box<dyn Device>, DeviceError>;
}
