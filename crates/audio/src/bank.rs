use std::collections::HashMap;
use std::time::Duration;

use tickpool_scheduler::{Callback, Scheduler};

use crate::settings::{Settings, SettingsError};

/// Settings key of the sound effects flag (1 = enabled).
pub const PLAY_SOUND_KEY: &str = "PlaySound";
/// Settings key of the music flag (1 = enabled).
pub const PLAY_MUSIC_KEY: &str = "PlayMusic";

/// A named audio clip and how long it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    pub length: Duration,
}

impl Clip {
    pub fn new(name: impl Into<String>, length: Duration) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Music,
    Sfx,
}

/// Output device owned by the host engine. One source per clip.
pub trait AudioDevice {
    fn play(&mut self, source: SourceId, clip: &Clip);

    fn stop(&mut self, source: SourceId);
}

/// Device that only logs what it is asked to do.
#[derive(Debug, Default)]
pub struct LogDevice;

impl AudioDevice for LogDevice {
    fn play(&mut self, source: SourceId, clip: &Clip) {
        tracing::info!(?source, clip = %clip.name, length = ?clip.length, "play");
    }

    fn stop(&mut self, source: SourceId) {
        tracing::info!(?source, "stop");
    }
}

struct Source {
    clip: Clip,
    category: Category,
}

/// Music and sound effect clips with persisted mute flags.
///
/// Playing a clip schedules the caller's callback for when the clip ends.
/// Unknown clip names and muted categories are not errors; they play nothing.
pub struct SoundBank<D, S> {
    device: D,
    settings: S,
    sources: Vec<Source>,
    by_name: HashMap<(Category, String), SourceId>,
    sound_enabled: bool,
    music_enabled: bool,
}

impl<D: AudioDevice, S: Settings> SoundBank<D, S> {
    pub fn new(
        device: D,
        settings: S,
        music: impl IntoIterator<Item = Clip>,
        sfx: impl IntoIterator<Item = Clip>,
    ) -> Self {
        let sound_enabled = settings.get_int(PLAY_SOUND_KEY, 1) != 0;
        let music_enabled = settings.get_int(PLAY_MUSIC_KEY, 1) != 0;
        let mut bank = Self {
            device,
            settings,
            sources: Vec::new(),
            by_name: HashMap::new(),
            sound_enabled,
            music_enabled,
        };
        for clip in music {
            bank.add(Category::Music, clip);
        }
        for clip in sfx {
            bank.add(Category::Sfx, clip);
        }
        tracing::debug!(
            sources = bank.sources.len(),
            sound_enabled,
            music_enabled,
            "sound bank ready"
        );
        bank
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Play a sound effect; `callback` fires once the clip has played out.
    pub fn play_sound<C: 'static>(
        &mut self,
        scheduler: &mut Scheduler<C>,
        name: &str,
        callback: Option<Callback<C>>,
    ) -> Option<SourceId> {
        if !self.sound_enabled {
            return None;
        }
        self.play(Category::Sfx, scheduler, name, callback)
    }

    /// Play a music clip; `callback` fires once the clip has played out.
    pub fn play_music<C: 'static>(
        &mut self,
        scheduler: &mut Scheduler<C>,
        name: &str,
        callback: Option<Callback<C>>,
    ) -> Option<SourceId> {
        if !self.music_enabled {
            return None;
        }
        self.play(Category::Music, scheduler, name, callback)
    }

    /// Persist the sound effects flag. Disabling stops every effect.
    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<(), SettingsError> {
        self.sound_enabled = enabled;
        self.settings.set_int(PLAY_SOUND_KEY, i64::from(enabled))?;
        if !enabled {
            self.stop_all(Category::Sfx);
        }
        Ok(())
    }

    /// Persist the music flag. Disabling stops all music.
    pub fn set_music_enabled(&mut self, enabled: bool) -> Result<(), SettingsError> {
        self.music_enabled = enabled;
        self.settings.set_int(PLAY_MUSIC_KEY, i64::from(enabled))?;
        if !enabled {
            self.stop_all(Category::Music);
        }
        Ok(())
    }

    fn add(&mut self, category: Category, clip: Clip) {
        let id = SourceId(self.sources.len() as u32);
        if self
            .by_name
            .insert((category, clip.name.clone()), id)
            .is_some()
        {
            tracing::warn!(clip = %clip.name, ?category, "duplicate clip name, last one wins");
        }
        self.sources.push(Source { clip, category });
    }

    fn play<C: 'static>(
        &mut self,
        category: Category,
        scheduler: &mut Scheduler<C>,
        name: &str,
        callback: Option<Callback<C>>,
    ) -> Option<SourceId> {
        let Some(&id) = self.by_name.get(&(category, name.to_string())) else {
            tracing::debug!(clip = name, ?category, "no such clip");
            return None;
        };
        let clip = &self.sources[id.0 as usize].clip;
        self.device.play(id, clip);
        if let Some(callback) = callback {
            scheduler.after_duration(clip.length, callback);
        }
        Some(id)
    }

    fn stop_all(&mut self, category: Category) {
        for (i, source) in self.sources.iter().enumerate() {
            if source.category == category {
                self.device.stop(SourceId(i as u32));
            }
        }
    }
}
