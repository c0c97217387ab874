//! Sound bank: music and effect clips whose end is reported through the scheduler.
//!
//! # Invariants
//! - Mute flags survive restarts through [`Settings`].
//! - A missing clip or a muted category plays nothing and schedules nothing.

mod bank;
pub mod settings;

pub use bank::{
    AudioDevice, Category, Clip, LogDevice, PLAY_MUSIC_KEY, PLAY_SOUND_KEY, SoundBank, SourceId,
};
pub use settings::{JsonSettings, MemorySettings, Settings, SettingsError};

pub fn crate_info() -> &'static str {
    "tickpool-audio v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("audio"));
    }
}
