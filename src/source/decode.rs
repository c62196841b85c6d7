//! Audio decoding via symphonia

use super::PcmBuffer;
use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an in-memory audio file into interleaved f32 samples
///
/// `hint` is an optional file extension ("mp3", "flac", ...) used to speed up probing.
pub fn decode_bytes(bytes: Vec<u8>, hint: Option<&str>) -> Result<PcmBuffer> {
    decode_source(Box::new(Cursor::new(bytes)), hint)
}

/// Decode an audio file on disk
pub fn decode_file(path: &Path) -> Result<PcmBuffer> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {:?}", path))?;
    let ext = path.extension().and_then(|e| e.to_str());

    decode_source(Box::new(file), ext).with_context(|| format!("Failed to decode {:?}", path))
}

fn decode_source(source: Box<dyn MediaSource>, ext: Option<&str>) -> Result<PcmBuffer> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("No sample rate in audio track")?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut bad_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                log::warn!("Error reading packet: {:?}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                bad_packets += 1;
                log::debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e).context("Audio decoding failed"),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if bad_packets > 0 {
        log::warn!("Skipped {} undecodable packets", bad_packets);
    }

    let pcm = PcmBuffer::new(samples, channels, sample_rate);
    log::debug!(
        "Decoded {} frames ({:.1}s) at {}Hz, {} channel(s)",
        pcm.frame_count(),
        pcm.duration_secs(),
        sample_rate,
        pcm.channels
    );

    Ok(pcm)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV file
    fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut out = Vec::with_capacity(44 + data_len as usize);

        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_wav_bytes() {
        let samples: Vec<i16> = (0..8000).map(|i| if i % 2 == 0 { 16384 } else { -16384 }).collect();
        let pcm = decode_bytes(wav_bytes(&samples, 2, 8000), Some("wav")).unwrap();

        assert_eq!(pcm.sample_rate, 8000);
        assert_eq!(pcm.channels, 2);
        assert_eq!(pcm.frame_count(), 4000);
        assert!((pcm.samples[0] - 0.5).abs() < 1e-3);
        assert!((pcm.samples[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = decode_bytes(b"definitely not audio".to_vec(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(decode_file(Path::new("/nonexistent/track.mp3")).is_err());
    }
}
