use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub &'static str);

/// Fire-and-forget playback. Implementations must not block the frame.
pub trait AudioSink: Send + Sync {
    fn play(&self, sound: SoundId);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudioSink;

impl AudioSink for TracingAudioSink {
    fn play(&self, sound: SoundId) {
        debug!(sound = sound.0, "sound_played");
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingAudioSink {
    played: Arc<Mutex<Vec<SoundId>>>,
}

impl RecordingAudioSink {
    pub fn played(&self) -> Vec<SoundId> {
        self.lock().clone()
    }

    pub fn play_count(&self, sound: SoundId) -> usize {
        self.lock().iter().filter(|played| **played == sound).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SoundId>> {
        match self.played.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("audio recording lock poisoned; recovered inner value");
                poisoned.into_inner()
            }
        }
    }
}

impl AudioSink for RecordingAudioSink {
    fn play(&self, sound: SoundId) {
        self.lock().push(sound);
    }
}
