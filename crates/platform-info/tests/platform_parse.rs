//! Parsing and singleton behavior for the platform capability tables.

use opal_platform_info::{
    InputMode, OperatingMode, PlatformError, PlatformInfo,
};
use serial_test::serial;
use uuid::Uuid;

const SAMPLE: &str = r#"
<sound_trigger_platform_info>
    <param version="2" lpi_enable="true" enable_failure_detection="true"
           concurrent_capture="true" concurrent_voice_call="true"
           dedicated_sva_path="false"/>
    <capture_profile name="FFNS">
        <param device_id="handset-mic" sample_rate="16000" bit_width="16"
               channels="1" snd_name="va-mic"/>
        <kvpair key="DEVICEPP_TX" value="DEVICEPP_TX_VOICE_UI_FLUENCE_FFNS"/>
    </capture_profile>
    <capture_profile name="FFECNS">
        <param device_id="headset-mic" sample_rate="48000" bit_width="24"
               channels="2" snd_name="va-headset-mic"/>
        <kvpair key="DEVICEPP_TX" value="DEVICEPP_TX_VOICE_UI_FLUENCE_FFECNS"/>
    </capture_profile>
    <sound_model_config>
        <param vendor_uuid="68ab2d40-e860-11e3-95ef-0002a5d5c51b"
               merge_first_stage_sound_models="true" sample_rate="16000"
               bit_width="16" out_channels="1" capture_keyword="2500"
               client_capture_read_delay="2000"/>
        <low_power capture_profile_handset="FFNS" capture_profile_headset="FFECNS"/>
        <high_performance capture_profile_handset="FFECNS" capture_profile_headset="FFECNS"/>
    </sound_model_config>
</sound_trigger_platform_info>
"#;

fn vendor_uuid() -> Uuid {
    Uuid::parse_str("68ab2d40-e860-11e3-95ef-0002a5d5c51b").unwrap()
}

#[test]
fn parses_root_params() {
    let info = PlatformInfo::from_xml_str(SAMPLE).unwrap();
    assert_eq!(info.version, 2);
    assert!(info.lpi_enable);
    assert!(info.enable_failure_detection);
    assert!(info.concurrent_capture);
    assert!(info.concurrent_voice_call);
    assert!(!info.concurrent_voip_call);
    assert!(!info.dedicated_sva_path);
    // untouched attributes keep their platform defaults
    assert!(!info.support_device_switch);
    assert!(!info.enable_debug_dumps);
}

#[test]
fn parses_capture_profiles() {
    let info = PlatformInfo::from_xml_str(SAMPLE).unwrap();
    assert_eq!(info.capture_profile_count(), 2);

    let ffns = info.capture_profile("FFNS").unwrap();
    assert_eq!(ffns.device_id, "handset-mic");
    assert_eq!(ffns.sample_rate, 16000);
    assert_eq!(ffns.channels, 1);
    assert_eq!(ffns.snd_name, "va-mic");

    let ffecns = info.capture_profile("FFECNS").unwrap();
    assert_eq!(ffecns.sample_rate, 48000);
    assert_eq!(ffecns.bit_width, 24);
    assert_eq!(ffecns.channels, 2);

    assert!(info.capture_profile("NOPE").is_none());
}

#[test]
fn resolves_sound_model_op_modes() {
    let info = PlatformInfo::from_xml_str(SAMPLE).unwrap();
    assert_eq!(info.sound_model_count(), 1);

    let config = info.sound_model_config(&vendor_uuid()).unwrap();
    assert!(config.merge_first_stage_sound_models);
    assert_eq!(config.capture_keyword_ms, 2500);

    let low_handset = config
        .capture_profile_for(OperatingMode::LowPower, InputMode::Handset)
        .unwrap();
    assert_eq!(low_handset.name, "FFNS");

    let perf_headset = config
        .capture_profile_for(OperatingMode::HighPerf, InputMode::Headset)
        .unwrap();
    assert_eq!(perf_headset.name, "FFECNS");

    // high_performance_and_charging was never declared
    assert!(config
        .capture_profile_for(OperatingMode::HighPerfAndCharging, InputMode::Handset)
        .is_none());
}

#[test]
fn tolerates_unknown_tags_and_attributes() {
    let xml = r#"
    <sound_trigger_platform_info>
        <param version="3" future_knob="whatever"/>
        <shiny_new_section>
            <nested><param a="b"/></nested>
        </shiny_new_section>
        <capture_profile name="P">
            <param sample_rate="16000"/>
        </capture_profile>
    </sound_trigger_platform_info>
    "#;
    let info = PlatformInfo::from_xml_str(xml).unwrap();
    assert_eq!(info.version, 3);
    assert!(info.capture_profile("P").is_some());
}

#[test]
fn rejects_unknown_profile_reference() {
    let xml = r#"
    <sound_trigger_platform_info>
        <sound_model_config>
            <param vendor_uuid="68ab2d40-e860-11e3-95ef-0002a5d5c51b"/>
            <low_power capture_profile_handset="MISSING"/>
        </sound_model_config>
    </sound_trigger_platform_info>
    "#;
    let err = PlatformInfo::from_xml_str(xml).unwrap_err();
    assert!(matches!(err, PlatformError::UnknownProfile { name } if name == "MISSING"));
}

#[test]
fn rejects_bad_vendor_uuid() {
    let xml = r#"
    <sound_trigger_platform_info>
        <sound_model_config>
            <param vendor_uuid="not-a-uuid"/>
        </sound_model_config>
    </sound_trigger_platform_info>
    "#;
    let err = PlatformInfo::from_xml_str(xml).unwrap_err();
    assert!(matches!(err, PlatformError::InvalidUuid { .. }));
}

#[test]
fn rejects_sound_model_without_uuid() {
    let xml = r#"
    <sound_trigger_platform_info>
        <sound_model_config>
            <param sample_rate="16000"/>
        </sound_model_config>
    </sound_trigger_platform_info>
    "#;
    let err = PlatformInfo::from_xml_str(xml).unwrap_err();
    assert!(matches!(err, PlatformError::MissingAttribute { .. }));
}

#[test]
fn rejects_profile_without_name() {
    let xml = r#"
    <sound_trigger_platform_info>
        <capture_profile>
            <param sample_rate="16000"/>
        </capture_profile>
    </sound_trigger_platform_info>
    "#;
    let err = PlatformInfo::from_xml_str(xml).unwrap_err();
    assert!(
        matches!(err, PlatformError::MissingAttribute { ref attribute, .. } if attribute == "name")
    );
}

#[test]
fn duplicate_profile_keeps_first() {
    let xml = r#"
    <sound_trigger_platform_info>
        <capture_profile name="P">
            <param sample_rate="16000"/>
        </capture_profile>
        <capture_profile name="P">
            <param sample_rate="48000"/>
        </capture_profile>
    </sound_trigger_platform_info>
    "#;
    let info = PlatformInfo::from_xml_str(xml).unwrap();
    assert_eq!(info.capture_profile_count(), 1);
    assert_eq!(info.capture_profile("P").unwrap().sample_rate, 16000);
}

#[test]
#[serial]
fn global_init_happens_at_most_once() {
    let first = PlatformInfo::init_from_str(SAMPLE).unwrap();
    assert_eq!(first.version, 2);

    // A second init with a different document must not replace the instance.
    let second = PlatformInfo::init_from_str("<sound_trigger_platform_info/>").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(second.version, 2);
}

#[test]
#[serial]
fn global_accessor_returns_initialized_instance() {
    let installed = PlatformInfo::init_from_str(SAMPLE).unwrap();
    let fetched = PlatformInfo::global().expect("global platform info");
    assert!(std::sync::Arc::ptr_eq(&installed, &fetched));
}
