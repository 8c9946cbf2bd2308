//! Rendered audio to WAV.

use std::path::Path;

use hound::{SampleFormat, WavWriter};

use crate::Result;

/// Layout of a WAV file to write.
///
/// 32 bits means IEEE float; 16 and 24 bits are integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// 16, 24 or 32.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        let sample_format = match spec.bits_per_sample {
            32 => SampleFormat::Float,
            _ => SampleFormat::Int,
        };
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format,
        }
    }
}

/// Write interleaved `samples` to `path`.
///
/// For integer formats, samples are scaled to full scale and clipped rather
/// than wrapped.
///
/// ```no_run
/// use sintetico_io::{WavSpec, write_wav};
///
/// let silence = vec![0.0f32; 2 * 48000];
/// write_wav("silence.wav", &silence, WavSpec::default())?;
/// # Ok::<(), sintetico_io::Error>(())
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    match spec.bits_per_sample {
        32 => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
        bits => {
            let full_scale = (1i32 << (bits - 1)) as f32;
            for &s in samples {
                let clipped = (s * full_scale).clamp(-full_scale, full_scale - 1.0);
                writer.write_sample(clipped as i32)?;
            }
        }
    }

    writer.finalize()?;
    tracing::debug!(
        frames = samples.len() / usize::from(spec.channels.max(1)),
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "wav written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use tempfile::tempdir;

    #[test]
    fn writes_16_bit_pcm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let samples = [0.0, 0.5, -0.5, 1.0, -1.0, 2.0];
        write_wav(&path, &samples, WavSpec::default()).unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().channels, 2);
        let read: Vec<i32> = reader.into_samples::<i32>().map(|s| s.unwrap()).collect();
        assert_eq!(read[0], 0);
        assert_eq!(read[1], 16384);
        assert_eq!(read[2], -16384);
        assert_eq!(read[3], 32767);
        assert_eq!(read[4], -32768);
        // Out-of-range input is clipped, not wrapped.
        assert_eq!(read[5], 32767);
    }

    #[test]
    fn writes_32_bit_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
        };
        write_wav(&path, &[0.25, -0.75], spec).unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_format, SampleFormat::Float);
        assert_eq!(reader.spec().sample_rate, 44100);
        let read: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, vec![0.25, -0.75]);
    }
}
