//! Event-driven parser for the platform config XML.
//!
//! An explicit state machine over `quick-xml` events: the element currently
//! being built sits on a stack of typed contexts, and each start/end tag is
//! dispatched against the top of that stack. Unknown tags and attributes are
//! logged and skipped so newer platform files stay loadable.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;
use uuid::Uuid;

use crate::error::{PlatformError, Result};
use crate::info::PlatformInfo;
use crate::profile::{
    CaptureProfile, DevicePpKey, DevicePpValue, InputMode, OperatingMode, SoundModelConfig,
};

const ROOT_TAG: &str = "sound_trigger_platform_info";

/// Element context currently under construction.
enum Context {
    CaptureProfile(CaptureProfile),
    SoundModel {
        config: SoundModelConfig,
        saw_uuid: bool,
    },
    /// Unrecognized subtree being skipped; counts nested unknown elements.
    Unknown { depth: usize },
}

pub(crate) struct Parser {
    info: PlatformInfo,
    stack: Vec<Context>,
}

impl Parser {
    pub(crate) fn new() -> Self {
        Self {
            info: PlatformInfo::default(),
            stack: Vec::new(),
        }
    }

    pub(crate) fn parse(mut self, xml: &str) -> Result<PlatformInfo> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => self.handle_start(e, false)?,
                Event::Empty(ref e) => self.handle_start(e, true)?,
                Event::End(ref e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.handle_end(&tag)?;
                }
                Event::Eof => break,
                // Character data carries nothing in this format
                _ => {}
            }
            buf.clear();
        }

        if !self.stack.is_empty() {
            return Err(PlatformError::malformed("unterminated element"));
        }
        Ok(self.info)
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        // A skipped subtree swallows everything nested inside it.
        if let Some(Context::Unknown { depth }) = self.stack.last_mut() {
            if !empty {
                *depth += 1;
            }
            return Ok(());
        }

        let attrs = attr_pairs(e)?;
        match self.stack.last_mut() {
            Some(Context::CaptureProfile(profile)) => match tag.as_str() {
                "param" => apply_profile_params(profile, &attrs)?,
                "kvpair" => apply_profile_kvpair(profile, &attrs),
                _ => self.push_unknown(&tag, empty),
            },
            Some(Context::SoundModel { config, saw_uuid }) => match tag.as_str() {
                "param" => apply_sound_model_params(config, saw_uuid, &attrs)?,
                "low_power" => {
                    bind_op_mode(config, OperatingMode::LowPower, &attrs, &self.info)?
                }
                "high_performance" => {
                    bind_op_mode(config, OperatingMode::HighPerf, &attrs, &self.info)?
                }
                "high_performance_and_charging" => bind_op_mode(
                    config,
                    OperatingMode::HighPerfAndCharging,
                    &attrs,
                    &self.info,
                )?,
                _ => self.push_unknown(&tag, empty),
            },
            _ => match tag.as_str() {
                ROOT_TAG => {}
                "param" => self.apply_root_params(&attrs),
                "capture_profile" => {
                    let name = require_attr(&tag, "name", &attrs)?;
                    self.stack
                        .push(Context::CaptureProfile(CaptureProfile::new(name)));
                    // a self-closing element is complete as soon as it starts
                    if empty {
                        self.handle_end(&tag)?;
                    }
                }
                "sound_model_config" => {
                    self.stack.push(Context::SoundModel {
                        config: SoundModelConfig::new(Uuid::nil()),
                        saw_uuid: false,
                    });
                    if empty {
                        self.handle_end(&tag)?;
                    }
                }
                _ => self.push_unknown(&tag, empty),
            },
        }
        Ok(())
    }

    fn handle_end(&mut self, tag: &str) -> Result<()> {
        if let Some(Context::Unknown { depth }) = self.stack.last_mut() {
            if *depth > 0 {
                *depth -= 1;
            } else {
                self.stack.pop();
            }
            return Ok(());
        }

        match tag {
            "capture_profile" => {
                if let Some(Context::CaptureProfile(profile)) = self.stack.pop() {
                    if self.info.capture_profiles.contains_key(&profile.name) {
                        warn!(name = %profile.name, "duplicate capture profile, keeping first");
                    } else {
                        self.info
                            .capture_profiles
                            .insert(profile.name.clone(), profile.into());
                    }
                }
            }
            "sound_model_config" => {
                if let Some(Context::SoundModel { config, saw_uuid }) = self.stack.pop() {
                    if !saw_uuid {
                        return Err(PlatformError::missing_attribute(
                            "sound_model_config",
                            "vendor_uuid",
                        ));
                    }
                    if self.info.sound_models.contains_key(&config.vendor_uuid) {
                        warn!(uuid = %config.vendor_uuid, "duplicate sound model config, keeping first");
                    } else {
                        self.info
                            .sound_models
                            .insert(config.vendor_uuid, config.into());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_unknown(&mut self, tag: &str, empty: bool) {
        warn!(tag, "skipping unknown platform config element");
        if !empty {
            self.stack.push(Context::Unknown { depth: 0 });
        }
    }

    fn apply_root_params(&mut self, attrs: &[(String, String)]) {
        for (key, value) in attrs {
            match key.as_str() {
                "version" => match value.parse::<u32>() {
                    Ok(version) => self.info.version = version,
                    Err(_) => warn!(value = %value, "bad platform version, keeping default"),
                },
                "enable_failure_detection" => {
                    self.info.enable_failure_detection = parse_bool(value)
                }
                "support_device_switch" => self.info.support_device_switch = parse_bool(value),
                "transit_to_non_lpi_on_charging" => {
                    self.info.transit_to_non_lpi_on_charging = parse_bool(value)
                }
                "dedicated_sva_path" => self.info.dedicated_sva_path = parse_bool(value),
                "dedicated_headset_path" => self.info.dedicated_headset_path = parse_bool(value),
                "lpi_enable" => self.info.lpi_enable = parse_bool(value),
                "enable_debug_dumps" => self.info.enable_debug_dumps = parse_bool(value),
                "non_lpi_without_ec" => self.info.non_lpi_without_ec = parse_bool(value),
                "concurrent_capture" => self.info.concurrent_capture = parse_bool(value),
                // Call concurrency only means anything with concurrent capture
                // on, so these require concurrent_capture earlier in the element.
                "concurrent_voice_call" if self.info.concurrent_capture => {
                    self.info.concurrent_voice_call = parse_bool(value)
                }
                "concurrent_voip_call" if self.info.concurrent_capture => {
                    self.info.concurrent_voip_call = parse_bool(value)
                }
                _ => warn!(attribute = %key, "unknown platform param attribute"),
            }
        }
    }
}

fn apply_profile_params(profile: &mut CaptureProfile, attrs: &[(String, String)]) -> Result<()> {
    for (key, value) in attrs {
        match key.as_str() {
            "device_id" => profile.device_id = value.clone(),
            "sample_rate" => profile.sample_rate = parse_u32("param", key, value)?,
            "bit_width" => profile.bit_width = parse_u32("param", key, value)? as u16,
            "channels" => profile.channels = parse_u32("param", key, value)? as u16,
            "snd_name" => profile.snd_name = value.clone(),
            _ => warn!(attribute = %key, "unknown capture_profile param attribute"),
        }
    }
    Ok(())
}

fn apply_profile_kvpair(profile: &mut CaptureProfile, attrs: &[(String, String)]) {
    let mut pp_key = None;
    let mut pp_value = None;
    for (key, value) in attrs {
        match key.as_str() {
            "key" => match DevicePpKey::from_name(value) {
                Some(k) => pp_key = Some(k),
                None => warn!(value = %value, "unknown device pp key"),
            },
            "value" => match DevicePpValue::from_name(value) {
                Some(v) => pp_value = Some(v),
                None => warn!(value = %value, "unknown device pp value"),
            },
            _ => warn!(attribute = %key, "unknown kvpair attribute"),
        }
    }
    if let (Some(k), Some(v)) = (pp_key, pp_value) {
        profile.device_pp = (k, v);
    }
}

fn apply_sound_model_params(
    config: &mut SoundModelConfig,
    saw_uuid: &mut bool,
    attrs: &[(String, String)],
) -> Result<()> {
    for (key, value) in attrs {
        match key.as_str() {
            "vendor_uuid" => {
                config.vendor_uuid =
                    Uuid::parse_str(value).map_err(|_| PlatformError::InvalidUuid {
                        value: value.clone(),
                    })?;
                *saw_uuid = true;
            }
            "merge_first_stage_sound_models" => {
                config.merge_first_stage_sound_models = parse_bool(value)
            }
            "sample_rate" => config.sample_rate = parse_u32("param", key, value)?,
            "bit_width" => config.bit_width = parse_u32("param", key, value)? as u16,
            "out_channels" => config.out_channels = parse_u32("param", key, value)? as u16,
            "capture_keyword" => config.capture_keyword_ms = parse_u32("param", key, value)?,
            "client_capture_read_delay" => {
                config.client_capture_read_delay_ms = parse_u32("param", key, value)?
            }
            _ => warn!(attribute = %key, "unknown sound_model_config param attribute"),
        }
    }
    Ok(())
}

fn bind_op_mode(
    config: &mut SoundModelConfig,
    mode: OperatingMode,
    attrs: &[(String, String)],
    info: &PlatformInfo,
) -> Result<()> {
    for (key, value) in attrs {
        match key.as_str() {
            "capture_profile_handset" => {
                config.bind_profile(mode, InputMode::Handset, value, &info.capture_profiles)?
            }
            "capture_profile_headset" => {
                config.bind_profile(mode, InputMode::Headset, value, &info.capture_profiles)?
            }
            _ => warn!(attribute = %key, "unknown operating mode attribute"),
        }
    }
    Ok(())
}

fn attr_pairs(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PlatformError::malformed(err.to_string()))?;
        pairs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    Ok(pairs)
}

fn require_attr(tag: &str, name: &str, attrs: &[(String, String)]) -> Result<String> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
        .ok_or_else(|| PlatformError::missing_attribute(tag, name))
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_u32(tag: &str, attribute: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        PlatformError::malformed(format!("bad numeric attribute {attribute}='{value}' on <{tag}>"))
    })
}
