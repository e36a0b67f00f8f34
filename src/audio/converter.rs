//! Sample rate conversion

use std::fmt;
use std::str::FromStr;
use ndarray::{Array1, Array2, ArrayView1};
use crate::audio::AudioBuffer;
use crate::error::{NormalizerError, Result};

/// Highest output sample rate accepted
pub const MAX_SAMPLE_RATE: u32 = 192000;

/// A validated output sample rate in Hz, in `1..=MAX_SAMPLE_RATE`.
///
/// Built from whatever the caller has at hand: integers, floats (truncated
/// toward zero) or numeric strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetRate(u32);

impl TargetRate {
    pub fn hz(self) -> u32 {
        self.0
    }

    fn from_wide(value: i128) -> Result<Self> {
        if value <= 0 {
            return Err(NormalizerError::conversion(format!(
                "Target sample rate must be positive, got {}", value
            )));
        }
        if value > MAX_SAMPLE_RATE as i128 {
            return Err(NormalizerError::conversion(format!(
                "Target sample rate cannot exceed {} Hz, got {}", MAX_SAMPLE_RATE, value
            )));
        }
        Ok(TargetRate(value as u32))
    }
}

impl fmt::Display for TargetRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

impl TryFrom<u32> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: u32) -> Result<Self> { Self::from_wide(value as i128) }
}

impl TryFrom<i32> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: i32) -> Result<Self> { Self::from_wide(value as i128) }
}

impl TryFrom<u64> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: u64) -> Result<Self> { Self::from_wide(value as i128) }
}

impl TryFrom<i64> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: i64) -> Result<Self> { Self::from_wide(value as i128) }
}

impl TryFrom<f64> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(NormalizerError::conversion(format!(
                "Target sample rate must be a finite number, got {}", value
            )));
        }
        if value.trunc() > MAX_SAMPLE_RATE as f64 {
            return Err(NormalizerError::conversion(format!(
                "Target sample rate cannot exceed {} Hz, got {}", MAX_SAMPLE_RATE, value
            )));
        }
        Self::from_wide(value.trunc() as i128)
    }
}

impl TryFrom<&str> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: &str) -> Result<Self> { value.parse() }
}

impl TryFrom<String> for TargetRate {
    type Error = NormalizerError;
    fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl FromStr for TargetRate {
    type Err = NormalizerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i128>() {
            return Self::from_wide(v);
        }
        match s.parse::<f64>() {
            Ok(v) => Self::try_from(v),
            Err(_) => Err(NormalizerError::conversion(format!(
                "Target sample rate is not a number: {:?}", s
            ))),
        }
    }
}

/// Anything a caller may pass as a target rate
pub trait IntoTargetRate {
    fn into_target_rate(self) -> Result<TargetRate>;
}

impl IntoTargetRate for TargetRate {
    fn into_target_rate(self) -> Result<TargetRate> {
        Ok(self)
    }
}

macro_rules! into_target_rate_via_try_from {
    ($($t:ty),*) => {
        $(
            impl IntoTargetRate for $t {
                fn into_target_rate(self) -> Result<TargetRate> {
                    TargetRate::try_from(self)
                }
            }
        )*
    };
}

into_target_rate_via_try_from!(u32, i32, u64, i64, f64, &str, String);

pub struct AudioConverter;

impl AudioConverter {
    /// Number of output frames for `frames` input frames, rounded to nearest
    pub fn output_length(frames: usize, source_rate: u32, target_rate: u32) -> usize {
        let source = source_rate as u128;
        ((frames as u128 * target_rate as u128 + source / 2) / source) as usize
    }

    /// Convert sample rate using linear interpolation, channel by channel
    pub fn convert_sample_rate(audio: &AudioBuffer, target_sample_rate: u32) -> Result<AudioBuffer> {
        if target_sample_rate == 0 {
            return Err(NormalizerError::conversion("Target sample rate cannot be 0"));
        }
        if target_sample_rate > MAX_SAMPLE_RATE {
            return Err(NormalizerError::conversion(format!(
                "Target sample rate cannot exceed {} Hz", MAX_SAMPLE_RATE
            )));
        }
        if audio.sample_rate() == 0 {
            return Err(NormalizerError::format("Source sample rate cannot be 0"));
        }
        if audio.sample_rate() == target_sample_rate {
            return Ok(audio.clone());
        }

        let new_length = Self::output_length(audio.total_frames(), audio.sample_rate(), target_sample_rate);
        let step = audio.sample_rate() as f64 / target_sample_rate as f64;

        let channels = audio.data().ncols();
        let mut new_data = Array2::zeros((new_length, channels));
        for (c, column) in audio.data().columns().into_iter().enumerate() {
            let resampled = Self::resample_channel(column, new_length, step);
            new_data.column_mut(c).assign(&resampled);
        }

        log::debug!("Resampled {} -> {} frames ({} Hz -> {} Hz)",
                    audio.total_frames(), new_length, audio.sample_rate(), target_sample_rate);

        AudioBuffer::new(target_sample_rate, audio.format(), new_data)
    }

    fn resample_channel(data: ArrayView1<f32>, new_length: usize, step: f64) -> Array1<f32> {
        let old_length = data.len();
        if old_length == 0 {
            return Array1::zeros(new_length);
        }

        let mut new_data = Array1::zeros(new_length);

        for i in 0..new_length {
            let old_pos = i as f64 * step;
            let old_index = old_pos.floor() as usize;
            let fraction = old_pos - old_index as f64;

            new_data[i] = if old_index >= old_length - 1 {
                data[old_length - 1]
            } else {
                data[old_index] + (data[old_index + 1] - data[old_index]) * fraction as f32
            };
        }

        new_data
    }
}
