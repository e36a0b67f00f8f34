//! Batch Processing - one independent normalize call per file

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use rayon::prelude::*;
use crate::audio::TargetRate;
use crate::codec::AudioCodec;
use crate::error::{NormalizerError, Result};
use super::{AudioNormalizer, ChannelMode, NormalizeReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Pair every `.wav` file in `input_dir` with the same file name in `output_dir`
pub fn collect_jobs(input_dir: &Path, output_dir: &Path) -> Result<Vec<BatchJob>> {
    let entries = std::fs::read_dir(input_dir)
        .map_err(|e| NormalizerError::io(format!("Cannot read directory {}: {}", input_dir.display(), e)))?;

    let mut jobs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

        if path.is_file() && is_wav {
            if let Some(name) = path.file_name() {
                jobs.push(BatchJob { output: output_dir.join(name), input: path.clone() });
            }
        }
    }

    jobs.sort_by(|a, b| a.input.cmp(&b.input));
    Ok(jobs)
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub job: BatchJob,
    pub result: Result<NormalizeReport>,
}

#[derive(Debug)]
pub struct BatchSummary {
    pub outcomes: Vec<BatchOutcome>,
    pub worker_count: usize,
    pub processing_time: Duration,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

pub struct BatchProcessor<C: AudioCodec> {
    normalizer: AudioNormalizer<C>,
    workers: usize,
}

impl<C: AudioCodec> BatchProcessor<C> {
    pub fn new(normalizer: AudioNormalizer<C>, workers: usize) -> Self {
        Self { normalizer, workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn process_dir(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        mode: ChannelMode,
        target_rate: TargetRate,
    ) -> Result<BatchSummary> {
        if input_dir == output_dir && mode == ChannelMode::Mono {
            log::warn!("Input and output directory are the same, files will be converted in place");
        }

        std::fs::create_dir_all(output_dir)
            .map_err(|e| NormalizerError::io(format!("Cannot create output directory: {}", e)))?;

        let jobs = collect_jobs(input_dir, output_dir)?;
        log::info!("Found {} WAV files in {}", jobs.len(), input_dir.display());
        self.run(jobs, mode, target_rate)
    }

    pub fn run(&self, jobs: Vec<BatchJob>, mode: ChannelMode, target_rate: TargetRate) -> Result<BatchSummary> {
        let start = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| NormalizerError::config(format!("Cannot build worker pool: {}", e)))?;

        let outcomes: Vec<BatchOutcome> = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    let result = self.normalizer.normalize(mode, &job.input, &job.output, target_rate);
                    if let Err(e) = &result {
                        log::error!("{}: {}", job.input.display(), e);
                    }
                    BatchOutcome { job, result }
                })
                .collect()
        });

        Ok(BatchSummary {
            outcomes,
            worker_count: self.workers,
            processing_time: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Stage};
    use tempfile::tempdir;

    fn write_stereo(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample((i % 100) as i16).unwrap();
            writer.write_sample(-((i % 100) as i16)).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_collect_jobs_filters_and_sorts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.WAV"), b"").unwrap();
        std::fs::write(dir.path().join("a.wav"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub.wav")).unwrap();

        let out = Path::new("/out");
        let jobs = collect_jobs(dir.path(), out).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].input, dir.path().join("a.wav"));
        assert_eq!(jobs[0].output, out.join("a.wav"));
        assert_eq!(jobs[1].output, out.join("b.WAV"));
    }

    #[test]
    fn test_collect_jobs_missing_dir() {
        let dir = tempdir().unwrap();
        let err = collect_jobs(&dir.path().join("nope"), dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_process_dir() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_stereo(&input.path().join("one.wav"), 4410);
        write_stereo(&input.path().join("two.wav"), 2000);
        std::fs::write(input.path().join("broken.wav"), b"RIFF\x24\x00\x00\x00NOPEfmt ").unwrap();

        let processor = BatchProcessor::new(AudioNormalizer::new(), 2);
        let rate = TargetRate::try_from(16000u32).unwrap();
        let summary = processor.process_dir(input.path(), output.path(), ChannelMode::Mono, rate).unwrap();

        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.succeeded(), 2);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.worker_count, 2);

        let failed: Vec<_> = summary.failed().collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].job.input.ends_with("broken.wav"));
        let err = failed[0].result.as_ref().unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Downmix));
        assert_eq!(err.kind(), ErrorKind::Format);

        let reader = hound::WavReader::open(output.path().join("one.wav")).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.duration(), 1600);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let processor = BatchProcessor::new(AudioNormalizer::new(), 0);
        assert_eq!(processor.workers(), 1);
    }
}
