//! Audio Processing Pipeline

pub mod normalizer;
pub mod batch;

pub use normalizer::{AudioNormalizer, ChannelMode, NormalizeReport};
pub use batch::{collect_jobs, BatchJob, BatchOutcome, BatchProcessor, BatchSummary};
