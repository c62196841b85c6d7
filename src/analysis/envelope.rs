//! Windowed energy helpers shared by the extraction backends

/// Window length for the beat/onset energy envelope
pub const ENVELOPE_WINDOW: usize = 1024;
/// Hop between envelope windows
pub const ENVELOPE_HOP: usize = 512;

/// Root-mean-square energy of each full window
///
/// Trailing samples that do not fill a window are ignored.
pub fn energy_envelope(samples: &[f32], window_size: usize, hop_size: usize) -> Vec<f32> {
    if window_size == 0 || hop_size == 0 || samples.len() < window_size {
        return Vec::new();
    }

    let num_windows = (samples.len() - window_size) / hop_size + 1;
    let mut envelope = Vec::with_capacity(num_windows);

    for i in 0..num_windows {
        let start = i * hop_size;
        envelope.push(rms(&samples[start..start + window_size]));
    }

    envelope
}

/// Root-mean-square of a slice (0 for an empty slice)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Positive-only frame-to-frame delta; the first entry is always 0
pub fn positive_flux(series: &[f32]) -> Vec<f32> {
    let mut flux = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        if i == 0 {
            flux.push(0.0);
        } else {
            flux.push((series[i] - series[i - 1]).max(0.0));
        }
    }
    flux
}

/// Nearest-rank percentile, `fraction` in [0, 1]. Non-finite values are ignored.
pub fn percentile(values: &[f32], fraction: f32) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }

    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let index = (sorted.len() as f32 * fraction.clamp(0.0, 1.0)) as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Indices that strictly exceed both neighbours and `threshold`
///
/// The first and last entries have only one neighbour and are never peaks.
pub fn peaks_above(series: &[f32], threshold: f32) -> Vec<usize> {
    if series.len() < 3 {
        return Vec::new();
    }

    (1..series.len() - 1)
        .filter(|&i| {
            series[i] > series[i - 1] && series[i] > series[i + 1] && series[i] > threshold
        })
        .collect()
}

/// Start time in seconds of window `index`
pub fn window_time(index: usize, hop_size: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (index * hop_size) as f64 / sample_rate as f64
}
