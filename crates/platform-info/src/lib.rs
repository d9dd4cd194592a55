//! Platform capability tables for the OPAL audio abstraction layer.
//!
//! This crate loads the sound-trigger platform configuration XML into
//! immutable typed records: capture profiles (which capture device a
//! detection path runs on, and with which post-processing chain) and
//! per-vendor sound model configs (keyed by vendor UUID, with an operating
//! mode table selecting a capture profile per power/input mode).
//!
//! The tables are parsed once per process via [`PlatformInfo::init_from_str`]
//! or [`PlatformInfo::init_from_file`] and are immutable afterwards;
//! [`PlatformInfo::global`] is the shared read accessor.

mod error;
mod info;
mod parser;
mod profile;

pub use error::{PlatformError, Result};
pub use info::PlatformInfo;
pub use profile::{
    CaptureProfile, DevicePpKey, DevicePpValue, InputMode, OperatingMode, SoundModelConfig,
};
