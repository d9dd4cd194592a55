//! Capture profile and sound model config records.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{PlatformError, Result};

/// Device post-processing key, from the platform key/value tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevicePpKey {
    /// Capture-path post-processing chain selector
    Tx,
}

impl DevicePpKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DEVICEPP_TX" => Some(Self::Tx),
            _ => None,
        }
    }
}

/// Device post-processing value, from the platform key/value tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevicePpValue {
    /// Fluence front-field noise suppression
    VoiceUiFluenceFfns,
    /// Fluence front-field echo cancellation and noise suppression
    VoiceUiFluenceFfecns,
}

impl DevicePpValue {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DEVICEPP_TX_VOICE_UI_FLUENCE_FFNS" => Some(Self::VoiceUiFluenceFfns),
            "DEVICEPP_TX_VOICE_UI_FLUENCE_FFECNS" => Some(Self::VoiceUiFluenceFfecns),
            _ => None,
        }
    }
}

/// One capture profile: the capture endpoint and front-end configuration a
/// detection path runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureProfile {
    /// Profile name, the key sound model configs reference it by
    pub name: String,
    /// Symbolic capture device id (e.g. "handset-mic")
    pub device_id: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_width: u16,
    /// ALSA-facing device name
    pub snd_name: String,
    /// Device post-processing key/value pair pushed with this profile
    pub device_pp: (DevicePpKey, DevicePpValue),
}

impl CaptureProfile {
    /// New profile with platform defaults; XML attributes overwrite fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_id: "handset-mic".to_string(),
            sample_rate: 16000,
            channels: 1,
            bit_width: 16,
            snd_name: "va-mic".to_string(),
            device_pp: (DevicePpKey::Tx, DevicePpValue::VoiceUiFluenceFfns),
        }
    }
}

/// Power/performance mode a detection session operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingMode {
    LowPower,
    HighPerf,
    HighPerfAndCharging,
}

/// Input transducer class the capture runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMode {
    Handset,
    Headset,
}

/// Per-vendor sound model configuration, keyed by vendor UUID.
#[derive(Debug, Clone)]
pub struct SoundModelConfig {
    pub vendor_uuid: Uuid,
    pub merge_first_stage_sound_models: bool,
    pub sample_rate: u32,
    pub bit_width: u16,
    pub out_channels: u16,
    /// Keyword capture duration, milliseconds
    pub capture_keyword_ms: u32,
    /// Client read start delay, milliseconds
    pub client_capture_read_delay_ms: u32,
    /// Capture profile per (operating mode, input mode), resolved at parse time
    op_modes: HashMap<(OperatingMode, InputMode), Arc<CaptureProfile>>,
}

impl SoundModelConfig {
    pub fn new(vendor_uuid: Uuid) -> Self {
        Self {
            vendor_uuid,
            merge_first_stage_sound_models: false,
            sample_rate: 16000,
            bit_width: 16,
            out_channels: 1,
            capture_keyword_ms: 2000,
            client_capture_read_delay_ms: 2000,
            op_modes: HashMap::new(),
        }
    }

    /// The capture profile for one operating/input mode, if configured.
    pub fn capture_profile_for(
        &self,
        mode: OperatingMode,
        input: InputMode,
    ) -> Option<Arc<CaptureProfile>> {
        self.op_modes.get(&(mode, input)).cloned()
    }

    /// Bind a capture profile name to an operating/input mode, resolving it
    /// against the already-declared profiles.
    pub(crate) fn bind_profile(
        &mut self,
        mode: OperatingMode,
        input: InputMode,
        name: &str,
        profiles: &HashMap<String, Arc<CaptureProfile>>,
    ) -> Result<()> {
        let profile = profiles
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownProfile {
                name: name.to_string(),
            })?;
        self.op_modes.insert((mode, input), profile);
        Ok(())
    }
}
