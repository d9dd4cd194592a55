//! The parsed platform capability table and its process-wide accessor.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use uuid::Uuid;

use crate::error::Result;
use crate::parser::Parser;
use crate::profile::{CaptureProfile, SoundModelConfig};

static GLOBAL: OnceCell<Arc<PlatformInfo>> = OnceCell::new();

/// Immutable snapshot of the sound-trigger platform configuration.
///
/// Constructed at most once per process through the `init_*` accessors;
/// every later `init_*` call returns the already-built instance.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub version: u32,
    pub enable_failure_detection: bool,
    pub support_device_switch: bool,
    pub transit_to_non_lpi_on_charging: bool,
    pub dedicated_sva_path: bool,
    pub dedicated_headset_path: bool,
    pub lpi_enable: bool,
    pub enable_debug_dumps: bool,
    pub non_lpi_without_ec: bool,
    pub concurrent_capture: bool,
    pub concurrent_voice_call: bool,
    pub concurrent_voip_call: bool,
    pub(crate) capture_profiles: HashMap<String, Arc<CaptureProfile>>,
    pub(crate) sound_models: HashMap<Uuid, Arc<SoundModelConfig>>,
}

impl Default for PlatformInfo {
    fn default() -> Self {
        Self {
            version: 0,
            enable_failure_detection: false,
            support_device_switch: false,
            transit_to_non_lpi_on_charging: false,
            dedicated_sva_path: true,
            dedicated_headset_path: false,
            lpi_enable: true,
            enable_debug_dumps: false,
            non_lpi_without_ec: false,
            concurrent_capture: false,
            concurrent_voice_call: false,
            concurrent_voip_call: false,
            capture_profiles: HashMap::new(),
            sound_models: HashMap::new(),
        }
    }
}

impl PlatformInfo {
    /// Parse a platform config document without touching the global.
    pub fn from_xml_str(xml: &str) -> Result<PlatformInfo> {
        Parser::new().parse(xml)
    }

    /// Initialize the process-wide instance from an XML string.
    ///
    /// The first caller parses and installs the table; later callers get the
    /// installed instance back regardless of their argument.
    pub fn init_from_str(xml: &str) -> Result<Arc<PlatformInfo>> {
        GLOBAL
            .get_or_try_init(|| Self::from_xml_str(xml).map(Arc::new))
            .cloned()
    }

    /// Initialize the process-wide instance from a config file.
    pub fn init_from_file(path: impl AsRef<Path>) -> Result<Arc<PlatformInfo>> {
        if let Some(info) = GLOBAL.get() {
            return Ok(info.clone());
        }
        let xml = std::fs::read_to_string(path)?;
        Self::init_from_str(&xml)
    }

    /// The process-wide instance, if one has been initialized.
    pub fn global() -> Option<Arc<PlatformInfo>> {
        GLOBAL.get().cloned()
    }

    /// Look up a capture profile by name.
    pub fn capture_profile(&self, name: &str) -> Option<Arc<CaptureProfile>> {
        self.capture_profiles.get(name).cloned()
    }

    /// Look up a sound model config by vendor UUID.
    pub fn sound_model_config(&self, uuid: &Uuid) -> Option<Arc<SoundModelConfig>> {
        self.sound_models.get(uuid).cloned()
    }

    /// Number of declared capture profiles.
    pub fn capture_profile_count(&self) -> usize {
        self.capture_profiles.len()
    }

    /// Number of declared sound model configs.
    pub fn sound_model_count(&self) -> usize {
        self.sound_models.len()
    }
}
