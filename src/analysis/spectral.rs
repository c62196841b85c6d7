//! Spectral flux onset function
//!
//! Sum of positive magnitude differences between consecutive Hann-windowed
//! real FFT frames. Used by the optimized backend in place of the energy proxy.

use realfft::RealFftPlanner;

/// Spectral flux per frame; the first frame has no predecessor and is 0
pub fn spectral_flux(samples: &[f32], window_size: usize, hop_size: usize) -> Vec<f32> {
    if window_size < 2 || hop_size == 0 || samples.len() < window_size {
        return Vec::new();
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(window_size);
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();
    let mut scratch = fft.make_scratch_vec();
    let window = hann_window(window_size);

    let num_frames = (samples.len() - window_size) / hop_size + 1;
    let mut flux = Vec::with_capacity(num_frames);
    let mut previous: Option<Vec<f32>> = None;

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop_size;
        let frame = &samples[start..start + window_size];

        for ((slot, sample), w) in input.iter_mut().zip(frame).zip(&window) {
            *slot = sample * w;
        }

        if let Err(e) = fft.process_with_scratch(&mut input, &mut spectrum, &mut scratch) {
            log::warn!("FFT failed at frame {}: {}", frame_idx, e);
            flux.push(0.0);
            continue;
        }

        let magnitudes: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();

        let frame_flux = match previous {
            Some(ref prev) => magnitudes
                .iter()
                .zip(prev)
                .map(|(curr, prev)| (curr - prev).max(0.0))
                .sum(),
            None => 0.0,
        };

        flux.push(frame_flux);
        previous = Some(magnitudes);
    }

    flux
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / len as f32).cos()))
        .collect()
}
