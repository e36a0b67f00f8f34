//! monowave - WAV downmix and resample library
//!
//! Converts stereo WAV files to mono and resamples them to a target rate.
//! The audio library doing the work is injected through [`codec::AudioCodec`].

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod processing;

pub use audio::{AudioBuffer, IntoTargetRate, MixWeights, TargetRate};
pub use codec::{AudioCodec, HoundCodec};
pub use config::{Args, Config};
pub use error::{ErrorKind, NormalizerError, Result, Stage};
pub use processing::{AudioNormalizer, BatchProcessor, ChannelMode, NormalizeReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Info level by default, debug when verbose. `RUST_LOG` takes precedence.
pub fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .ok();
}

pub fn get_library_info() -> LibraryInfo {
    LibraryInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl std::fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} - {}", self.name, self.version, self.description)
    }
}
