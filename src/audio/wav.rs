//! WAV audio file processing

use std::path::Path;
use hound::SampleFormat;
use ndarray::Array2;
use crate::audio::stream::{HoundSink, HoundSource, PcmFrames, WaveParams, WaveSink, WaveSource};
use crate::error::{NormalizerError, Result};

/// Sample width and encoding of a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Int8,
    Int16,
    Int24,
    Int32,
    Float32,
}

impl AudioFormat {
    pub fn from_spec(bits_per_sample: u16, sample_format: SampleFormat) -> Result<Self> {
        match (sample_format, bits_per_sample) {
            (SampleFormat::Int, 8) => Ok(AudioFormat::Int8),
            (SampleFormat::Int, 16) => Ok(AudioFormat::Int16),
            (SampleFormat::Int, 24) => Ok(AudioFormat::Int24),
            (SampleFormat::Int, 32) => Ok(AudioFormat::Int32),
            (SampleFormat::Float, 32) => Ok(AudioFormat::Float32),
            (format, bits) => Err(NormalizerError::format(
                format!("Unsupported sample width: {} bit {:?}", bits, format)
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::Int8 => "int8",
            AudioFormat::Int16 => "int16",
            AudioFormat::Int24 => "int24",
            AudioFormat::Int32 => "int32",
            AudioFormat::Float32 => "float32",
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            AudioFormat::Int8 => 8,
            AudioFormat::Int16 => 16,
            AudioFormat::Int24 => 24,
            AudioFormat::Int32 | AudioFormat::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample() / 8
    }

    pub fn is_float(&self) -> bool {
        matches!(self, AudioFormat::Float32)
    }

    pub fn to_sample_format(self) -> SampleFormat {
        if self.is_float() { SampleFormat::Float } else { SampleFormat::Int }
    }

    /// Inclusive integer range of one sample; meaningless for float formats
    pub fn int_range(&self) -> (i64, i64) {
        let bits = self.bits_per_sample() as u32;
        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
    }

    /// Divisor that maps integer samples into [-1.0, 1.0)
    pub fn full_scale(&self) -> f64 {
        if self.is_float() {
            1.0
        } else {
            (1u64 << (self.bits_per_sample() - 1)) as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
    pub total_frames: usize,
    pub duration: f64,
}

impl AudioHeader {
    pub fn new(sample_rate: u32, channels: u16, format: AudioFormat, total_frames: usize) -> Self {
        let duration = if sample_rate == 0 {
            0.0
        } else {
            total_frames as f64 / sample_rate as f64
        };

        Self {
            sample_rate,
            channels,
            format,
            total_frames,
            duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(NormalizerError::format("Sample rate cannot be 0"));
        }

        if self.channels == 0 {
            return Err(NormalizerError::format("Channel count cannot be 0"));
        }

        Ok(())
    }

    pub fn params(&self) -> WaveParams {
        WaveParams {
            channels: self.channels,
            sample_rate: self.sample_rate,
            format: self.format,
        }
    }
}

/// Decoded audio held in memory, one row per frame and one column per channel.
/// Samples are normalized to [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub header: AudioHeader,
    pub data: Array2<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, format: AudioFormat, data: Array2<f32>) -> Result<Self> {
        let channels = u16::try_from(data.ncols())
            .map_err(|_| NormalizerError::format("Too many channels"))?;
        let header = AudioHeader::new(sample_rate, channels, format, data.nrows());
        header.validate()?;
        Ok(Self { header, data })
    }

    /// Decode interleaved PCM into a normalized buffer
    pub fn from_pcm(params: WaveParams, frames: &PcmFrames) -> Result<Self> {
        let channels = params.channels as usize;
        if channels == 0 {
            return Err(NormalizerError::format("Channel count cannot be 0"));
        }
        if frames.len() % channels != 0 {
            return Err(NormalizerError::format(format!(
                "{} samples do not divide into {} channels", frames.len(), channels
            )));
        }

        let samples: Vec<f32> = match (frames, params.format.is_float()) {
            (PcmFrames::Float(samples), true) => samples.clone(),
            (PcmFrames::Int(samples), false) => {
                let scale = params.format.full_scale();
                samples.iter().map(|&s| (s as f64 / scale) as f32).collect()
            }
            _ => return Err(NormalizerError::format(format!(
                "Sample data does not match {} format", params.format.name()
            ))),
        };

        let data = Array2::from_shape_vec((frames.len() / channels, channels), samples)
            .map_err(|e| NormalizerError::format(format!("Cannot shape audio data: {}", e)))?;

        Self::new(params.sample_rate, params.format, data)
    }

    /// Encode back to interleaved PCM in this buffer's sample width
    pub fn to_pcm(&self) -> PcmFrames {
        if self.header.format.is_float() {
            PcmFrames::Float(self.data.iter().map(|&s| s.clamp(-1.0, 1.0)).collect())
        } else {
            let scale = self.header.format.full_scale();
            let (min, max) = self.header.format.int_range();
            PcmFrames::Int(
                self.data
                    .iter()
                    .map(|&s| {
                        let s = if s.is_finite() { s as f64 } else { 0.0 };
                        (s * scale).round().clamp(min as f64, max as f64) as i32
                    })
                    .collect(),
            )
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut source = HoundSource::open(path)?;
        let frames = source.read_frames()?;
        Self::from_pcm(source.params(), &frames)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut sink = Box::new(HoundSink::create(path, self.params())?);
        sink.write_frames(&self.to_pcm())?;
        sink.close()
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn total_frames(&self) -> usize {
        self.header.total_frames
    }

    pub fn duration(&self) -> f64 {
        self.header.duration
    }

    pub fn format(&self) -> AudioFormat {
        self.header.format
    }

    pub fn params(&self) -> WaveParams {
        self.header.params()
    }

    pub fn validate(&self) -> Result<()> {
        self.header.validate()?;

        if self.data.nrows() != self.header.total_frames {
            return Err(NormalizerError::format(
                format!("Data length mismatch: header shows {} frames, actual {} frames",
                       self.header.total_frames, self.data.nrows())
            ));
        }

        if self.data.ncols() != self.header.channels as usize {
            return Err(NormalizerError::format(
                format!("Channel count mismatch: header shows {} channels, actual {} channels",
                       self.header.channels, self.data.ncols())
            ));
        }

        let invalid = self.data.iter().filter(|s| !s.is_finite()).count();
        if invalid > 0 {
            log::warn!("Audio contains {} non-finite samples, they will be written as silence", invalid);
        }

        Ok(())
    }
}
