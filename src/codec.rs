//! Audio codec capability
//!
//! Everything the pipeline needs from an audio library sits behind
//! [`AudioCodec`]: opening raw streams, decoding a whole file into an
//! [`AudioBuffer`], converting its sample rate and exporting it again.

use std::path::Path;
use crate::audio::{AudioBuffer, AudioConverter, HoundSink, HoundSource, WaveParams, WaveSink, WaveSource};
use crate::error::{NormalizerError, Result};

pub trait AudioCodec: Send + Sync {
    fn open_source(&self, path: &Path) -> Result<Box<dyn WaveSource>>;

    fn create_sink(&self, path: &Path, params: WaveParams) -> Result<Box<dyn WaveSink>>;

    /// Decode a WAV file. When `expected_rate` is given, a file with any other
    /// frame rate is rejected.
    fn load(&self, path: &Path, expected_rate: Option<u32>) -> Result<AudioBuffer>;

    fn resample(&self, buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer>;

    /// Write `buffer` as WAV, replacing any existing file
    fn export(&self, buffer: &AudioBuffer, path: &Path) -> Result<()>;
}

/// `hound` for the container, linear interpolation for rate conversion
#[derive(Debug, Default, Clone, Copy)]
pub struct HoundCodec;

impl AudioCodec for HoundCodec {
    fn open_source(&self, path: &Path) -> Result<Box<dyn WaveSource>> {
        Ok(Box::new(HoundSource::open(path)?))
    }

    fn create_sink(&self, path: &Path, params: WaveParams) -> Result<Box<dyn WaveSink>> {
        Ok(Box::new(HoundSink::create(path, params)?))
    }

    fn load(&self, path: &Path, expected_rate: Option<u32>) -> Result<AudioBuffer> {
        let buffer = AudioBuffer::from_file(path)?;

        if let Some(rate) = expected_rate {
            if buffer.sample_rate() != rate {
                return Err(NormalizerError::format(format!(
                    "{} has frame rate {} Hz, expected {} Hz",
                    path.display(), buffer.sample_rate(), rate
                )));
            }
        }

        Ok(buffer)
    }

    fn resample(&self, buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
        AudioConverter::convert_sample_rate(buffer, target_rate)
    }

    fn export(&self, buffer: &AudioBuffer, path: &Path) -> Result<()> {
        buffer.validate()?;
        buffer.save_to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, PcmFrames};
    use crate::error::ErrorKind;
    use ndarray::Array2;
    use tempfile::tempdir;

    #[test]
    fn test_load_checks_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.wav");
        let buffer = AudioBuffer::new(11025, AudioFormat::Int16, Array2::zeros((10, 1))).unwrap();

        let codec = HoundCodec;
        codec.export(&buffer, &path).unwrap();

        assert_eq!(codec.load(&path, Some(11025)).unwrap().total_frames(), 10);
        assert_eq!(codec.load(&path, None).unwrap().sample_rate(), 11025);
        let err = codec.load(&path, Some(44100)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_streams_through_codec() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.wav");
        let params = WaveParams { channels: 1, sample_rate: 8000, format: AudioFormat::Int8 };

        let codec = HoundCodec;
        let mut sink = codec.create_sink(&path, params).unwrap();
        sink.write_frames(&PcmFrames::Int(vec![-128, 0, 127])).unwrap();
        sink.close().unwrap();

        let mut source = codec.open_source(&path).unwrap();
        assert_eq!(source.params(), params);
        assert_eq!(source.read_frames().unwrap(), PcmFrames::Int(vec![-128, 0, 127]));
    }
}
