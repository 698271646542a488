const MIN_PITCH_HZ: f32 = 70.0;
const MAX_PITCH_HZ: f32 = 1500.0;
/// Correlation below this means the chunk has no clear period.
const MIN_CLARITY: f32 = 0.6;
/// The first peak within this share of the strongest one is the fundamental.
const PEAK_RATIO: f32 = 0.9;

/// Estimates the fundamental of a mono chunk from its normalized autocorrelation.
/// Periods longer than half the chunk are not considered.
pub(crate) fn detect_pitch_hz(chunk: &[f32], sample_rate: u32) -> Option<f32> {
    let rate = sample_rate as f32;
    let min_lag = ((rate / MAX_PITCH_HZ) as usize).max(2);
    let max_lag = ((rate / MIN_PITCH_HZ).ceil() as usize).min(chunk.len() / 2);
    if min_lag + 2 > max_lag {
        return None;
    }

    // index i holds lag `min_lag - 1 + i`
    let correlation: Vec<f32> = (min_lag - 1..=max_lag + 1)
        .map(|lag| normalized_correlation(chunk, lag))
        .collect();
    let strongest = correlation.iter().copied().fold(f32::MIN, f32::max);
    if strongest < MIN_CLARITY {
        return None;
    }

    let peak = (1..correlation.len() - 1).find(|&index| {
        let value = correlation[index];
        value >= PEAK_RATIO * strongest
            && value >= correlation[index - 1]
            && value >= correlation[index + 1]
    })?;
    let (left, centre, right) = (correlation[peak - 1], correlation[peak], correlation[peak + 1]);
    let curvature = left - 2.0 * centre + right;
    let shift = if curvature.abs() > f32::EPSILON {
        0.5 * (left - right) / curvature
    } else {
        0.0
    };
    let lag = (min_lag - 1 + peak) as f32 + shift;
    Some(rate / lag)
}

/// Nearest MIDI note number, A4 = 440Hz = 69.
pub(crate) fn midi_note(frequency_hz: f32) -> Option<u8> {
    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
        return None;
    }
    let note = (69.0 + 12.0 * (frequency_hz / 440.0).log2()).round();
    (0.0..=127.0).contains(&note).then_some(note as u8)
}

fn normalized_correlation(chunk: &[f32], lag: usize) -> f32 {
    let mut cross = 0.0f32;
    let mut energy = 0.0f32;
    for (early, late) in chunk.iter().zip(&chunk[lag..]) {
        cross += early * late;
        energy += early * early + late * late;
    }
    if energy <= f32::EPSILON {
        0.0
    } else {
        2.0 * cross / energy
    }
}
