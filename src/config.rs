//! Configuration management for audio normalization

use crate::audio::{MixWeights, TargetRate};
use crate::error::{NormalizerError, Result};
use crate::processing::ChannelMode;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::audio::MAX_SAMPLE_RATE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub audio: AudioConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub target_rate: u32,
    pub mode: ChannelMode,
    pub mix: MixWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub workers: usize,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("input.wav"),
            output_path: PathBuf::from("output.wav"),
            audio: AudioConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_rate: 16000,
            mode: ChannelMode::Mono,
            mix: MixWeights::default(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: utils::default_workers(),
            verbose: false,
        }
    }
}

impl Config {
    /// Target rate as a validated value
    pub fn target_rate(&self) -> Result<TargetRate> {
        TargetRate::try_from(self.audio.target_rate)
    }

    pub fn mode(&self) -> ChannelMode {
        self.audio.mode
    }

    pub fn mix_weights(&self) -> MixWeights {
        self.audio.mix
    }

    pub fn workers(&self) -> usize {
        self.processing.workers
    }

    pub fn verbose(&self) -> bool {
        self.processing.verbose
    }

    /// Batch mode is selected by pointing the input at a directory
    pub fn is_batch(&self) -> bool {
        self.input_path.is_dir()
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "monowave", about = "Downmix WAV files to mono and resample them", version, author)]
pub struct Args {
    #[arg(short = 'i', long = "input", required_unless_present = "init_config",
          help = "Input WAV file, or a directory of WAV files")]
    pub input: Option<PathBuf>,

    #[arg(short = 'o', long = "output",
          help = "Output WAV file, or a directory in batch mode [default: output.wav]")]
    pub output: Option<PathBuf>,

    #[arg(short = 'r', long = "rate", help = "Target sample rate (Hz)")]
    pub rate: Option<TargetRate>,

    #[arg(short = 'm', long = "mode", value_enum, help = "mono: downmix then resample; stereo: resample the output file in place")]
    pub mode: Option<ChannelMode>,

    #[arg(short = 'j', long = "jobs", help = "Worker threads for batch mode")]
    pub jobs: Option<usize>,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output mode")]
    pub verbose: bool,

    #[arg(short = 'c', long = "config", help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[arg(long = "init-config", help = "Write the default config to this path and exit")]
    pub init_config: Option<PathBuf>,
}

impl Config {
    /// Create config from command line arguments and config file
    pub fn from_args_and_config(args: Args) -> Result<Self> {
        // First load config file (if provided)
        let mut config = if let Some(config_path) = &args.config_file {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        // Command line arguments override config file settings
        if let Some(input) = args.input {
            config.input_path = input;
        }
        if let Some(output) = args.output {
            config.output_path = output;
        }
        if let Some(rate) = args.rate {
            config.audio.target_rate = rate.hz();
        }
        if let Some(mode) = args.mode {
            config.audio.mode = mode;
        }
        if let Some(jobs) = args.jobs {
            config.processing.workers = jobs;
        }
        config.processing.verbose |= args.verbose;

        config.validate()?;

        Ok(config)
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NormalizerError::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| NormalizerError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Validate configuration parameter validity
    pub fn validate(&self) -> Result<()> {
        if self.audio.target_rate == 0 {
            return Err(NormalizerError::config("Target sample rate must be greater than 0"));
        }
        if self.audio.target_rate > MAX_SAMPLE_RATE {
            return Err(NormalizerError::config(format!(
                "Target sample rate cannot exceed {} Hz", MAX_SAMPLE_RATE
            )));
        }

        self.audio.mix.validate()?;

        if self.processing.workers == 0 {
            return Err(NormalizerError::config("Worker count must be greater than 0"));
        }
        if self.processing.workers > utils::cpu_count() * 2 {
            return Err(NormalizerError::config("Worker count cannot exceed 2x logical CPU cores"));
        }

        Ok(())
    }

    /// Save config to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NormalizerError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| NormalizerError::config(format!("Failed to write config file: {}", e)))
    }

    /// Create default config file
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}

pub mod utils {
    pub fn cpu_count() -> usize {
        num_cpus::get()
    }

    /// One worker per logical core, at most 8
    pub fn default_workers() -> usize {
        cpu_count().clamp(1, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.target_rate, 16000);
        assert_eq!(config.mode(), ChannelMode::Mono);
        assert_eq!(config.mix_weights(), MixWeights::default());
        assert!(config.workers() >= 1);
        assert!(!config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.audio.target_rate = 0;
        assert!(config.validate().is_err());
        config.audio.target_rate = 384000;
        assert!(config.validate().is_err());
        config.audio.target_rate = 16000;

        config.audio.mix = MixWeights { left: -1.0, right: 0.5 };
        assert!(config.validate().is_err());
        config.audio.mix = MixWeights::default();

        config.processing.workers = 0;
        assert!(config.validate().is_err());
        config.processing.workers = utils::cpu_count() * 2 + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.audio.mode = ChannelMode::Stereo;
        config.audio.target_rate = 22050;

        assert!(config.save_to_file(&config_path).is_ok());
        let loaded = Config::from_file(&config_path).unwrap();
        assert_eq!(loaded.audio.target_rate, 22050);
        assert_eq!(loaded.mode(), ChannelMode::Stereo);
        assert_eq!(loaded.mix_weights(), config.mix_weights());
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        std::fs::write(&config_path, "input_path = \"a.wav\"\n\n[audio]\ntarget_rate = 8000\n").unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.audio.target_rate, 8000);
        assert_eq!(config.mode(), ChannelMode::Mono);
        assert_eq!(config.input_path, PathBuf::from("a.wav"));
        assert_eq!(config.output_path, PathBuf::from("output.wav"));
    }

    #[test]
    fn test_bad_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        std::fs::write(&config_path, "[audio\n").unwrap();

        let err = Config::from_file(&config_path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(Config::from_file(temp_dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_args_override_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let mut file_config = Config::default();
        file_config.audio.target_rate = 8000;
        file_config.audio.mode = ChannelMode::Stereo;
        file_config.save_to_file(&config_path).unwrap();

        let args = Args::parse_from([
            "monowave", "-i", "in.wav", "-o", "out.wav", "-r", "22050",
            "-c", config_path.to_str().unwrap(),
        ]);
        let config = Config::from_args_and_config(args).unwrap();

        assert_eq!(config.audio.target_rate, 22050);
        assert_eq!(config.mode(), ChannelMode::Stereo);
        assert_eq!(config.input_path, PathBuf::from("in.wav"));
        assert_eq!(config.output_path, PathBuf::from("out.wav"));
    }

    #[test]
    fn test_file_output_path_kept_without_flag() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "output_path = \"custom_out.wav\"\n").unwrap();

        let args = Args::parse_from(["monowave", "-i", "in.wav", "-c", config_path.to_str().unwrap()]);
        let config = Config::from_args_and_config(args).unwrap();
        assert_eq!(config.output_path, PathBuf::from("custom_out.wav"));

        let args = Args::parse_from(["monowave", "-i", "in.wav"]);
        let config = Config::from_args_and_config(args).unwrap();
        assert_eq!(config.output_path, PathBuf::from("output.wav"));
    }

    #[test]
    fn test_file_verbose_survives_cli() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[processing]\nverbose = true\n").unwrap();

        let args = Args::parse_from(["monowave", "-i", "in.wav", "-c", config_path.to_str().unwrap()]);
        assert!(!args.verbose);
        assert!(Config::from_args_and_config(args).unwrap().verbose());
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["monowave", "-i", "x.wav", "-m", "stereo", "-r", "44100.0", "-j", "1"]);
        assert_eq!(args.mode, Some(ChannelMode::Stereo));
        assert_eq!(args.rate.map(TargetRate::hz), Some(44100));
        assert_eq!(args.jobs, Some(1));
        assert_eq!(args.output, None);

        assert!(Args::try_parse_from(["monowave", "-i", "x.wav", "-r", "-5"]).is_err());
        assert!(Args::try_parse_from(["monowave", "-i", "x.wav", "-r", "fast"]).is_err());
        assert!(Args::try_parse_from(["monowave"]).is_err());
        assert!(Args::try_parse_from(["monowave", "--init-config", "c.toml"]).is_ok());
    }
}
