//! WAV file I/O via hound

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Planar audio: one `Vec` per channel, samples nominally in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Frames in the shortest channel
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Sample of `channel` at `frame`; 0 past the end or for a missing channel
    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        self.channels
            .get(channel)
            .and_then(|c| c.get(frame))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Load a WAV file, normalizing integer formats to [-1, 1]
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        bail!("{} has no channels", path.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>(),
    }
    .with_context(|| format!("decoding {}", path.display()))?;

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, sample) in channels.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    log::debug!(
        "Read {}: {} ch, {} Hz, {} frames",
        path.display(),
        channel_count,
        spec.sample_rate,
        channels[0].len()
    );
    Ok(AudioBuffer::new(spec.sample_rate, channels))
}

/// Write a WAV file; 32-bit is float, 16 and 24 are integer with clipping
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, bit_depth: u16) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        },
    };

    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;

    for frame in 0..buffer.frames() {
        for channel in 0..buffer.channel_count() {
            let sample = buffer.sample(channel, frame);
            match bit_depth {
                16 => writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?,
                24 => writer.write_sample((sample.clamp(-1.0, 1.0) * 8_388_607.0) as i32)?,
                32 => writer.write_sample(sample)?,
                other => bail!("unsupported bit depth {other}"),
            }
        }
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}
