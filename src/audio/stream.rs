//! Raw WAV streams
//!
//! A stream is an opened WAV file, either for reading (`WaveSource`) or for
//! writing (`WaveSink`). Samples pass through untouched as interleaved PCM so
//! that copying a file never changes its sample values or width.
//!
//! Streams own their file handles. A sink that is dropped without `close`
//! still finalizes the WAV header, so handles are released on every exit path.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use hound::{WavReader, WavSpec, WavWriter};
use crate::audio::AudioFormat;
use crate::error::{NormalizerError, Result};

/// Format parameters shared by every frame of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveParams {
    pub channels: u16,
    pub sample_rate: u32,
    pub format: AudioFormat,
}

impl WaveParams {
    pub fn from_wav_spec(spec: WavSpec) -> Result<Self> {
        if spec.channels == 0 {
            return Err(NormalizerError::format("Channel count cannot be 0"));
        }
        if spec.sample_rate == 0 {
            return Err(NormalizerError::format("Invalid sample rate"));
        }

        Ok(Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            format: AudioFormat::from_spec(spec.bits_per_sample, spec.sample_format)?,
        })
    }

    pub fn to_wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.format.bits_per_sample(),
            sample_format: self.format.to_sample_format(),
        }
    }

    pub fn with_channels(self, channels: u16) -> Self {
        Self { channels, ..self }
    }
}

/// Interleaved samples exactly as stored in the file
#[derive(Debug, Clone, PartialEq)]
pub enum PcmFrames {
    /// 8, 16, 24 or 32 bit integer PCM, sign-extended
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl PcmFrames {
    /// Total sample count across all channels
    pub fn len(&self) -> usize {
        match self {
            PcmFrames::Int(s) => s.len(),
            PcmFrames::Float(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame_count(&self, channels: u16) -> usize {
        if channels == 0 { 0 } else { self.len() / channels as usize }
    }

    pub fn read_all<R: Read>(reader: &mut WavReader<R>, format: AudioFormat) -> Result<Self> {
        if format.is_float() {
            let samples = reader.samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| NormalizerError::format(format!("Failed to read sample: {}", e)))?;
            Ok(PcmFrames::Float(samples))
        } else {
            let samples = reader.samples::<i32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| NormalizerError::format(format!("Failed to read sample: {}", e)))?;
            Ok(PcmFrames::Int(samples))
        }
    }

    pub fn write_all<W: Write + Seek>(&self, writer: &mut WavWriter<W>) -> Result<()> {
        let float_sink = writer.spec().sample_format == hound::SampleFormat::Float;

        match self {
            PcmFrames::Float(samples) if float_sink => {
                for &sample in samples {
                    writer.write_sample(sample)
                        .map_err(|e| NormalizerError::io(format!("Failed to write sample: {}", e)))?;
                }
            }
            PcmFrames::Int(samples) if !float_sink => {
                for &sample in samples {
                    writer.write_sample(sample).map_err(|e| match e {
                        hound::Error::IoError(io) => NormalizerError::io(format!("Failed to write sample: {}", io)),
                        other => NormalizerError::format(format!("Failed to write sample: {}", other)),
                    })?;
                }
            }
            _ => {
                return Err(NormalizerError::format(
                    "Sample data does not match the output sample format"
                ));
            }
        }

        Ok(())
    }
}

/// A WAV stream opened for reading
pub trait WaveSource: Send {
    fn params(&self) -> WaveParams;

    /// Frame count announced by the header
    fn frame_count(&self) -> usize;

    /// Read every remaining frame
    fn read_frames(&mut self) -> Result<PcmFrames>;
}

/// A WAV stream opened for writing
pub trait WaveSink: Send {
    fn params(&self) -> WaveParams;

    fn write_frames(&mut self, frames: &PcmFrames) -> Result<()>;

    /// Finalize the header and release the file
    fn close(self: Box<Self>) -> Result<()>;
}

pub struct HoundSource {
    path: PathBuf,
    params: WaveParams,
    reader: WavReader<BufReader<File>>,
}

impl HoundSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let reader = WavReader::open(path).map_err(|e| match e {
            hound::Error::IoError(io) => NormalizerError::io(
                format!("Cannot open audio file {}: {}", path.display(), io)
            ),
            other => NormalizerError::format(
                format!("Cannot read WAV header of {}: {}", path.display(), other)
            ),
        })?;

        let params = WaveParams::from_wav_spec(reader.spec())?;
        log::debug!("Opened {} ({} ch, {} Hz, {})",
                    path.display(), params.channels, params.sample_rate, params.format.name());

        Ok(Self { path: path.to_path_buf(), params, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WaveSource for HoundSource {
    fn params(&self) -> WaveParams {
        self.params
    }

    fn frame_count(&self) -> usize {
        self.reader.duration() as usize
    }

    fn read_frames(&mut self) -> Result<PcmFrames> {
        let frames = PcmFrames::read_all(&mut self.reader, self.params.format)?;
        if frames.len() % self.params.channels as usize != 0 {
            return Err(NormalizerError::format(format!(
                "{} ends with a partial frame", self.path.display()
            )));
        }
        Ok(frames)
    }
}

pub struct HoundSink {
    path: PathBuf,
    params: WaveParams,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl HoundSink {
    pub fn create<P: AsRef<Path>>(path: P, params: WaveParams) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| NormalizerError::io(format!("Cannot create output directory: {}", e)))?;
        }

        let writer = WavWriter::create(path, params.to_wav_spec())
            .map_err(|e| NormalizerError::io(
                format!("Cannot create output file {}: {}", path.display(), e)
            ))?;

        Ok(Self { path: path.to_path_buf(), params, writer: Some(writer) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WaveSink for HoundSink {
    fn params(&self) -> WaveParams {
        self.params
    }

    fn write_frames(&mut self, frames: &PcmFrames) -> Result<()> {
        let writer = self.writer.as_mut()
            .ok_or_else(|| NormalizerError::io("Stream already closed"))?;
        frames.write_all(writer)
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        match self.writer.take() {
            Some(writer) => writer.finalize()
                .map_err(|e| NormalizerError::io(format!("Failed to finalize WAV writing: {}", e))),
            None => Ok(()),
        }
    }
}

impl Drop for HoundSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                log::warn!("Failed to finalize {}: {}", self.path.display(), e);
            }
        }
    }
}
