//! Audio Module
//!
//! WAV reading and writing, raw PCM streams, channel mixing and sample rate
//! conversion.

pub mod wav;
pub mod stream;
pub mod mixer;
pub mod converter;

pub use wav::{AudioBuffer, AudioFormat, AudioHeader};
pub use stream::{HoundSink, HoundSource, PcmFrames, WaveParams, WaveSink, WaveSource};
pub use mixer::{downmix_stereo, MixWeights};
pub use converter::{AudioConverter, IntoTargetRate, TargetRate, MAX_SAMPLE_RATE};
