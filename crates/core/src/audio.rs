//! Audio utilities
//!
//! PCM conversion helpers plus WAV decode/encode used at the transport and
//! stage boundaries. Streaming chunks travel as 16-bit little-endian mono
//! PCM; stages work on f32 samples in [-1.0, 1.0].

use crate::error::{Error, Result};
use std::io::Cursor;

/// Convert 16-bit little-endian PCM bytes to f32 samples.
///
/// A trailing odd byte is ignored.
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Convert f32 samples in [-1.0, 1.0] to 16-bit little-endian PCM bytes
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s * 32767.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Root-mean-square amplitude of a sample window
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Peak absolute amplitude of a sample window
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Duration in seconds of a sample buffer at the given rate
pub fn duration_secs(sample_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f64 / sample_rate as f64
}

/// True if `bytes` starts with a RIFF/WAVE header
pub fn looks_like_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode a WAV container into mono f32 samples and its sample rate.
///
/// Multi-channel input is downmixed by averaging channels.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| Error::Validation(format!("unreadable WAV container: {}", e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|v| v as f32 / max)
                        .map_err(|e| Error::Validation(format!("corrupt WAV data: {}", e)))
                })
                .collect::<Result<Vec<f32>>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(|e| Error::Validation(format!("corrupt WAV data: {}", e))))
            .collect::<Result<Vec<f32>>>()?,
    };

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }

    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Encode mono f32 samples as a 16-bit WAV container
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Other(format!("WAV encode error: {}", e)))?;
        for &s in samples {
            let v = (s * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(v)
                .map_err(|e| Error::Other(format!("WAV encode error: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Other(format!("WAV encode error: {}", e)))?;
    }
    Ok(cursor.into_inner())
}

/// Decode incoming audio bytes into mono f32 samples.
///
/// WAV containers are decoded; anything else is treated as raw PCM16LE at
/// `default_rate`.
pub fn decode_audio(bytes: &[u8], default_rate: u32) -> Result<(Vec<f32>, u32)> {
    if bytes.is_empty() {
        return Err(Error::validation("empty audio payload"));
    }
    if looks_like_wav(bytes) {
        decode_wav(bytes)
    } else {
        Ok((pcm16_to_f32(bytes), default_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_roundtrip() {
        let samples = vec![0.0f32, 0.5, -0.5, 0.25];
        let bytes = f32_to_pcm16(&samples);
        let back = pcm16_to_f32(&bytes);
        assert_eq!(back.len(), samples.len());
        for (a, b) in samples.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_rms_and_peak() {
        assert_eq!(rms(&[]), 0.0);
        let samples = vec![0.5f32, -0.5, 0.5, -0.5];
        assert!((rms(&samples) - 0.5).abs() < 1e-6);
        assert!((peak(&samples) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_wav_roundtrip() {
        let samples: Vec<f32> = (0..160).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        let wav = encode_wav(&samples, 16000).unwrap();
        assert!(looks_like_wav(&wav));

        let (decoded, rate) = decode_wav(&wav).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_decode_audio_rejects_empty() {
        assert!(decode_audio(&[], 16000).is_err());
    }

    #[test]
    fn test_decode_audio_raw_pcm_fallback() {
        let bytes = f32_to_pcm16(&[0.1, 0.2, 0.3]);
        let (samples, rate) = decode_audio(&bytes, 16000).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(samples.len(), 3);
    }
}
