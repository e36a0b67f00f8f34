//! Downmix-then-resample pipeline

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::audio::{downmix_stereo, AudioBuffer, IntoTargetRate, MixWeights, TargetRate, WaveParams};
use crate::codec::{AudioCodec, HoundCodec};
use crate::error::{NormalizerError, Result, Stage};

/// What a successful normalize call did
#[derive(Debug, Clone)]
pub struct NormalizeReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub source: WaveParams,
    pub source_frames: usize,
    pub output: WaveParams,
    pub output_frames: usize,
    pub downmixed: bool,
    pub processing_time: Duration,
}

impl NormalizeReport {
    pub fn input_duration(&self) -> f64 {
        self.source_frames as f64 / self.source.sample_rate as f64
    }

    pub fn output_duration(&self) -> f64 {
        self.output_frames as f64 / self.output.sample_rate as f64
    }

    pub fn real_time_factor(&self) -> f64 {
        let duration = self.input_duration();
        if duration > 0.0 {
            self.processing_time.as_secs_f64() / duration
        } else {
            0.0
        }
    }
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {}ch {}Hz ({} frames) -> {}ch {}Hz ({} frames){}",
            self.input_path.display(),
            self.output_path.display(),
            self.source.channels,
            self.source.sample_rate,
            self.source_frames,
            self.output.channels,
            self.output.sample_rate,
            self.output_frames,
            if self.downmixed { ", downmixed" } else { "" },
        )
    }
}

/// Which legacy entry point to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Downmix, then resample
    #[default]
    Mono,
    /// Resample the output file in place
    Stereo,
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMode::Mono => write!(f, "mono"),
            ChannelMode::Stereo => write!(f, "stereo"),
        }
    }
}

#[derive(Debug)]
struct DownmixOutcome {
    source: WaveParams,
    source_frames: usize,
    downmixed: bool,
}

#[derive(Debug)]
struct ResampleOutcome {
    loaded: WaveParams,
    loaded_frames: usize,
    output: AudioBuffer,
}

/// Converts WAV files to mono at a target sample rate.
///
/// The audio library is injected as an [`AudioCodec`]; [`HoundCodec`] is used
/// unless another one is supplied with [`AudioNormalizer::with_codec`].
#[derive(Debug, Clone)]
pub struct AudioNormalizer<C: AudioCodec = HoundCodec> {
    codec: C,
    weights: MixWeights,
}

impl AudioNormalizer<HoundCodec> {
    pub fn new() -> Self {
        Self::with_codec(HoundCodec)
    }
}

impl Default for AudioNormalizer<HoundCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: AudioCodec> AudioNormalizer<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec, weights: MixWeights::default() }
    }

    pub fn with_mix_weights(mut self, weights: MixWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn mix_weights(&self) -> MixWeights {
        self.weights
    }

    /// Downmix `input_path` into `output_path`, then resample `output_path` in place.
    ///
    /// Only two-channel input is downmixed; mono and other layouts are copied
    /// as they are. If the resample step fails, `output_path` is left holding
    /// the downmixed audio at the original rate and the error reports
    /// [`Stage::Resample`].
    pub fn resample_mono<R>(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        target_rate: R,
    ) -> Result<NormalizeReport>
    where
        R: IntoTargetRate,
    {
        let start = Instant::now();
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        let target = target_rate.into_target_rate()?;

        log::info!("Normalizing {} -> {} at {}", input_path.display(), output_path.display(), target);

        let downmix = self.downmix_step(input_path, output_path)
            .map_err(|e| e.in_stage(Stage::Downmix))?;

        let resampled = self.resample_step(output_path, Some(downmix.source.sample_rate), target)
            .map_err(|e| e.in_stage(Stage::Resample))?;

        Ok(NormalizeReport {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            source: downmix.source,
            source_frames: downmix.source_frames,
            output: resampled.output.params(),
            output_frames: resampled.output.total_frames(),
            downmixed: downmix.downmixed,
            processing_time: start.elapsed(),
        })
    }

    /// Resample `output_path` in place. No downmix happens.
    ///
    /// `input_path` is not read: the file already at `output_path` is the
    /// source, and its own header supplies the source frame rate. Callers that
    /// want a fresh conversion of `input_path` should use [`Self::resample_mono`].
    pub fn resample_stereo<R>(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        target_rate: R,
    ) -> Result<NormalizeReport>
    where
        R: IntoTargetRate,
    {
        let start = Instant::now();
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        let target = target_rate.into_target_rate()?;

        if input_path != output_path {
            log::warn!("resample_stereo ignores {} and resamples {} in place",
                       input_path.display(), output_path.display());
        }

        let resampled = self.resample_step(output_path, None, target)
            .map_err(|e| e.in_stage(Stage::Resample))?;

        Ok(NormalizeReport {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            source: resampled.loaded,
            source_frames: resampled.loaded_frames,
            output: resampled.output.params(),
            output_frames: resampled.output.total_frames(),
            downmixed: false,
            processing_time: start.elapsed(),
        })
    }

    pub fn normalize(
        &self,
        mode: ChannelMode,
        input_path: &Path,
        output_path: &Path,
        target_rate: TargetRate,
    ) -> Result<NormalizeReport> {
        match mode {
            ChannelMode::Mono => self.resample_mono(input_path, output_path, target_rate),
            ChannelMode::Stereo => self.resample_stereo(input_path, output_path, target_rate),
        }
    }

    fn downmix_step(&self, input_path: &Path, output_path: &Path) -> Result<DownmixOutcome> {
        let mut source = self.codec.open_source(input_path)?;
        let params = source.params();
        let frames = source.read_frames()?;
        // input is fully read before the output is truncated, so both may be the same file
        drop(source);

        let source_frames = frames.frame_count(params.channels);
        log::debug!("Input: {} frames, {}ch, {}Hz, {}",
                    source_frames, params.channels, params.sample_rate, params.format.name());

        let (out_params, out_frames, downmixed) = if params.channels == 2 {
            (params.with_channels(1), downmix_stereo(&frames, params.format, self.weights)?, true)
        } else {
            if params.channels > 2 {
                log::info!("{} has {} channels, copying without downmix",
                           input_path.display(), params.channels);
            }
            (params, frames, false)
        };

        let mut sink = self.codec.create_sink(output_path, out_params)?;
        sink.write_frames(&out_frames)?;
        sink.close()?;

        Ok(DownmixOutcome { source: params, source_frames, downmixed })
    }

    fn resample_step(&self, path: &Path, expected_rate: Option<u32>, target: TargetRate) -> Result<ResampleOutcome> {
        let buffer = self.codec.load(path, expected_rate)?;
        let loaded = buffer.params();
        let loaded_frames = buffer.total_frames();

        let output = self.codec.resample(&buffer, target.hz())?;
        if output.sample_rate() != target.hz() {
            return Err(NormalizerError::conversion(format!(
                "Resampler produced {} Hz instead of {}", output.sample_rate(), target
            )));
        }

        self.codec.export(&output, path)?;
        log::debug!("Resampled {}: {} -> {} frames", path.display(), loaded_frames, output.total_frames());

        Ok(ResampleOutcome { loaded, loaded_frames, output })
    }
}
