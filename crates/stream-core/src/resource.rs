//! Process-wide resource manager handed to device factories.
//!
//! A read-only holder of the parsed platform capability tables. Sharing and
//! arbitration policy across streams is out of scope here; the manager only
//! gives backends access to what the platform declared.

use std::sync::Arc;

use opal_platform_info::{CaptureProfile, PlatformInfo};

use crate::device::DeviceId;

#[derive(Debug)]
pub struct ResourceManager {
    platform: Arc<PlatformInfo>,
}

impl ResourceManager {
    pub fn new(platform: Arc<PlatformInfo>) -> Arc<Self> {
        Arc::new(Self { platform })
    }

    /// Build from the already-initialized platform-info global, if any.
    pub fn from_global() -> Option<Arc<Self>> {
        PlatformInfo::global().map(Self::new)
    }

    /// Build with an empty platform table (useful for tests and hosts that
    /// have no platform config to load).
    pub fn with_defaults() -> Arc<Self> {
        Self::new(Arc::new(PlatformInfo::default()))
    }

    pub fn platform(&self) -> &Arc<PlatformInfo> {
        &self.platform
    }

    /// Look up a capture profile by name.
    pub fn capture_profile(&self, name: &str) -> Option<Arc<CaptureProfile>> {
        self.platform.capture_profile(name)
    }

    /// Resolve a capture profile's symbolic device id to a device identifier.
    pub fn capture_device(&self, profile: &CaptureProfile) -> Option<DeviceId> {
        DeviceId::from_name(&profile.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_profile_device_resolution() {
        let xml = r#"
        <sound_trigger_platform_info>
            <capture_profile name="FFNS">
                <param device_id="va-mic" sample_rate="16000"/>
            </capture_profile>
        </sound_trigger_platform_info>
        "#;
        let platform = Arc::new(PlatformInfo::from_xml_str(xml).unwrap());
        let resources = ResourceManager::new(platform);

        let profile = resources.capture_profile("FFNS").unwrap();
        assert_eq!(resources.capture_device(&profile), Some(DeviceId::VaMic));
        assert!(resources.capture_profile("missing").is_none());
    }

    #[test]
    fn test_defaults_have_empty_tables() {
        let resources = ResourceManager::with_defaults();
        assert_eq!(resources.platform().capture_profile_count(), 0);
    }
}
