//! Channel mixing (stereo to mono)

use serde::{Deserialize, Serialize};
use crate::audio::AudioFormat;
use crate::audio::stream::PcmFrames;
use crate::error::{NormalizerError, Result};

/// Gain applied to each side of a stereo pair before summing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixWeights {
    pub left: f64,
    pub right: f64,
}

impl Default for MixWeights {
    fn default() -> Self {
        Self { left: 0.5, right: 0.5 }
    }
}

impl MixWeights {
    pub fn new(left: f64, right: f64) -> Result<Self> {
        let weights = Self { left, right };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.left.is_finite() || !self.right.is_finite() {
            return Err(NormalizerError::config("Mix weights must be finite"));
        }
        if self.left < 0.0 || self.right < 0.0 {
            return Err(NormalizerError::config("Mix weights cannot be negative"));
        }
        if self.left + self.right == 0.0 {
            return Err(NormalizerError::config("At least one mix weight must be non-zero"));
        }
        Ok(())
    }
}

/// Mix interleaved stereo frames down to one channel, keeping the sample width
pub fn downmix_stereo(frames: &PcmFrames, format: AudioFormat, weights: MixWeights) -> Result<PcmFrames> {
    if frames.len() % 2 != 0 {
        return Err(NormalizerError::format(format!(
            "Stereo data has an odd sample count ({})", frames.len()
        )));
    }

    log::debug!("Downmixing {} stereo frames ({}, weights {}/{})",
                frames.len() / 2, format.name(), weights.left, weights.right);

    match frames {
        PcmFrames::Float(samples) => {
            let (l, r) = (weights.left as f32, weights.right as f32);
            Ok(PcmFrames::Float(
                samples.chunks_exact(2).map(|pair| pair[0] * l + pair[1] * r).collect()
            ))
        }
        PcmFrames::Int(samples) => {
            if format.is_float() {
                return Err(NormalizerError::format("Integer samples in a float stream"));
            }
            let (min, max) = format.int_range();
            Ok(PcmFrames::Int(
                samples
                    .chunks_exact(2)
                    .map(|pair| {
                        let mixed = pair[0] as f64 * weights.left + pair[1] as f64 * weights.right;
                        (mixed.trunc() as i64).clamp(min, max) as i32
                    })
                    .collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_weight_average() {
        let frames = PcmFrames::Int(vec![100, 200, -100, -301, 32767, 32767]);
        let mono = downmix_stereo(&frames, AudioFormat::Int16, MixWeights::default()).unwrap();
        assert_eq!(mono, PcmFrames::Int(vec![150, -200, 32767]));
    }

    #[test]
    fn test_float_average() {
        let frames = PcmFrames::Float(vec![0.5, -0.5, 1.0, 0.0]);
        let mono = downmix_stereo(&frames, AudioFormat::Float32, MixWeights::default()).unwrap();
        assert_eq!(mono, PcmFrames::Float(vec![0.0, 0.5]));
    }

    #[test]
    fn test_weights_clamp_to_range() {
        let frames = PcmFrames::Int(vec![127, 127, -128, -128]);
        let weights = MixWeights::new(1.0, 1.0).unwrap();
        let mono = downmix_stereo(&frames, AudioFormat::Int8, weights).unwrap();
        assert_eq!(mono, PcmFrames::Int(vec![127, -128]));
    }

    #[test]
    fn test_left_only() {
        let frames = PcmFrames::Int(vec![10, 99, 20, 99]);
        let weights = MixWeights::new(1.0, 0.0).unwrap();
        let mono = downmix_stereo(&frames, AudioFormat::Int16, weights).unwrap();
        assert_eq!(mono, PcmFrames::Int(vec![10, 20]));
    }

    #[test]
    fn test_odd_sample_count() {
        let frames = PcmFrames::Int(vec![1, 2, 3]);
        assert!(downmix_stereo(&frames, AudioFormat::Int16, MixWeights::default()).is_err());
    }

    #[test]
    fn test_invalid_weights() {
        assert!(MixWeights::new(-0.5, 0.5).is_err());
        assert!(MixWeights::new(0.0, 0.0).is_err());
        assert!(MixWeights::new(f64::NAN, 0.5).is_err());
        assert!(MixWeights::new(0.7, 0.3).is_ok());
    }
}
