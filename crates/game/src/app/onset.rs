use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use engine::{Event, EventSender};
use tracing::{debug, info, warn};

use super::config::OnsetSettings;
use super::gameplay::{Hit, HIT_EVENT};
use super::pitch::{detect_pitch_hz, midi_note};

const SILENT_ENERGY: f32 = 1e-12;
const INPUT_QUEUE_CHUNKS: usize = 64;

/// Energy-based onset detection over consecutive mono sample chunks.
#[derive(Debug, Clone)]
pub(crate) struct OnsetDetector {
    settings: OnsetSettings,
    previous_energy: f32,
    cooldown: u32,
}

impl OnsetDetector {
    pub(crate) fn new(settings: OnsetSettings) -> Self {
        Self {
            settings,
            previous_energy: 0.0,
            cooldown: 0,
        }
    }

    /// Returns the chunk level in dB when the chunk starts a new note.
    pub(crate) fn process(&mut self, chunk: &[f32]) -> Option<f32> {
        if chunk.is_empty() {
            return None;
        }
        let energy = chunk.iter().map(|sample| sample * sample).sum::<f32>() / chunk.len() as f32;
        let level_db = 10.0 * energy.max(SILENT_ENERGY).log10();
        let previous = std::mem::replace(&mut self.previous_energy, energy);

        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }
        if level_db < self.settings.silence_db {
            return None;
        }
        let rise = (energy - previous) / previous.max(SILENT_ENERGY);
        if rise <= self.settings.threshold {
            return None;
        }
        self.cooldown = self.settings.refractory_chunks;
        Some(level_db)
    }
}

/// Producer handle for the worker's chunk queue; safe to move into an audio callback.
#[derive(Debug, Clone)]
pub(crate) struct ChunkFeed {
    samples: SyncSender<Vec<f32>>,
    dropped: Arc<AtomicU64>,
}

impl ChunkFeed {
    /// Queues a chunk without blocking; returns `false` and counts the chunk as dropped when
    /// the worker is backed up or gone.
    pub(crate) fn push(&self, chunk: Vec<f32>) -> bool {
        let queued = self.samples.try_send(chunk).is_ok();
        if !queued {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queued
    }
}

/// A running onset worker. It stops once this input and every feed cloned from it are dropped.
pub(crate) struct OnsetInput {
    feed: ChunkFeed,
    worker: JoinHandle<u64>,
}

impl OnsetInput {
    pub(crate) fn feeder(&self) -> ChunkFeed {
        self.feed.clone()
    }

    /// Closes this input's feed and waits for the worker. Returns how many hits it posted.
    pub(crate) fn shutdown(self) -> u64 {
        let dropped = self.feed.dropped.load(Ordering::Relaxed);
        drop(self.feed);
        let hits = match self.worker.join() {
            Ok(hits) => hits,
            Err(_) => {
                warn!("onset worker panicked");
                0
            }
        };
        info!(hits, dropped_chunks = dropped, "onset_input_closed");
        hits
    }
}

/// Runs `detector` on its own thread over chunks sampled at `sample_rate`. Every detected
/// onset becomes a `Hit` event posted through `events`; no game state is touched from the
/// worker.
pub(crate) fn spawn_onset_worker(
    detector: OnsetDetector,
    sample_rate: u32,
    events: EventSender,
) -> io::Result<OnsetInput> {
    let (samples, receiver) = mpsc::sync_channel(INPUT_QUEUE_CHUNKS);
    let worker = thread::Builder::new()
        .name("onset".to_string())
        .spawn(move || run_worker(detector, sample_rate, receiver, events))?;
    info!(sample_rate, "onset_worker_started");
    let feed = ChunkFeed {
        samples,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    Ok(OnsetInput { feed, worker })
}

fn run_worker(
    mut detector: OnsetDetector,
    sample_rate: u32,
    receiver: Receiver<Vec<f32>>,
    events: EventSender,
) -> u64 {
    let mut hits = 0u64;
    for chunk in receiver {
        let Some(level_db) = detector.process(&chunk) else {
            continue;
        };
        hits += 1;
        let midi_note = detect_pitch_hz(&chunk, sample_rate).and_then(midi_note);
        debug!(level_db, ?midi_note, "onset_detected");
        events.post(Event::custom(
            HIT_EVENT,
            Hit {
                level_db: Some(level_db),
                midi_note,
            },
        ));
    }
    info!(hits, "onset_worker_stopped");
    hits
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use engine::{EventBus, EventKind};

    use super::*;

    const RATE: u32 = 44_100;

    fn settings(refractory_chunks: u32) -> OnsetSettings {
        OnsetSettings {
            threshold: 0.2,
            silence_db: -40.0,
            refractory_chunks,
        }
    }

    fn tone(amplitude: f32) -> Vec<f32> {
        (0..256)
            .map(|index| if index % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn energy_jump_after_silence_is_an_onset() {
        let mut detector = OnsetDetector::new(settings(0));

        assert_eq!(detector.process(&tone(0.0)), None);
        let level = detector.process(&tone(0.5)).expect("onset");
        assert!((level - (-6.02)).abs() < 0.1);
        assert_eq!(detector.process(&tone(0.5)), None);
    }

    #[test]
    fn quiet_attack_below_silence_floor_is_ignored() {
        let mut detector = OnsetDetector::new(settings(0));
        detector.process(&tone(0.0));

        assert_eq!(detector.process(&tone(0.001)), None);
    }

    #[test]
    fn refractory_period_suppresses_immediate_retrigger() {
        let mut detector = OnsetDetector::new(settings(2));
        detector.process(&tone(0.0));
        assert!(detector.process(&tone(0.2)).is_some());

        assert_eq!(detector.process(&tone(0.6)), None);
        assert_eq!(detector.process(&tone(0.9)), None);
        detector.process(&tone(0.0));
        assert!(detector.process(&tone(0.9)).is_some());
    }

    #[test]
    fn empty_chunk_is_ignored() {
        let mut detector = OnsetDetector::new(settings(0));
        assert_eq!(detector.process(&[]), None);
    }

    fn concert_a(amplitude: f32) -> Vec<f32> {
        (0..1024)
            .map(|index| amplitude * (TAU * 440.0 * index as f32 / RATE as f32).sin())
            .collect()
    }

    fn hits(drained: &[Event]) -> Vec<Hit> {
        drained
            .iter()
            .map(|event| {
                assert_eq!(event.kind(), EventKind::Custom);
                let Event::Custom(custom) = event else {
                    panic!("expected custom event");
                };
                assert_eq!(custom.name(), HIT_EVENT);
                *custom.payload::<Hit>().expect("hit payload")
            })
            .collect()
    }

    #[test]
    fn worker_posts_hits_with_level_and_note() {
        let bus = EventBus::new();
        let input = spawn_onset_worker(OnsetDetector::new(settings(0)), RATE, bus.sender())
            .expect("spawn");
        let feed = input.feeder();

        for chunk in [concert_a(0.0), concert_a(0.5), concert_a(0.0), concert_a(0.5)] {
            assert!(feed.push(chunk));
        }
        drop(feed);

        assert_eq!(input.shutdown(), 2);
        let hits = hits(&bus.drain_translated(Vec::new()));
        assert_eq!(hits.len(), 2);
        for hit in hits {
            assert!(hit.level_db.is_some());
            assert_eq!(hit.midi_note, Some(69));
        }
    }

    #[test]
    fn full_or_closed_queue_counts_dropped_chunks() {
        let (samples, receiver) = mpsc::sync_channel(1);
        let feed = ChunkFeed {
            samples,
            dropped: Arc::new(AtomicU64::new(0)),
        };

        assert!(feed.push(concert_a(0.0)));
        assert!(!feed.push(concert_a(0.0)));
        drop(receiver);
        assert!(!feed.push(concert_a(0.5)));

        assert_eq!(feed.dropped.load(Ordering::Relaxed), 2);
    }
}
