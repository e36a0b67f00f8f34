//! monowave - WAV downmix and resample tool

use anyhow::{Context, bail};
use clap::Parser;
use std::process;
use monowave::{init_logging, Args, AudioNormalizer, BatchProcessor, ChannelMode, Config};

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if let Some(path) = &args.init_config {
        init_logging(args.verbose);
        Config::create_default_config(path)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    let config = Config::from_args_and_config(args).context("invalid configuration")?;
    init_logging(config.verbose());

    if config.verbose() {
        println!("{}", monowave::get_library_info());
        println!();
    }

    let target_rate = config.target_rate()?;
    let normalizer = AudioNormalizer::new().with_mix_weights(config.mix_weights());

    // stereo mode reads the output file, so the input may legitimately be absent
    if config.mode() == ChannelMode::Mono && !config.input_path.exists() {
        bail!("Input does not exist: {}", config.input_path.display());
    }

    println!("=== monowave ===");
    println!("Input: {}", config.input_path.display());
    println!("Output: {}", config.output_path.display());
    println!("Target: {} ({})", target_rate, config.mode());

    if config.is_batch() {
        let processor = BatchProcessor::new(normalizer, config.workers());
        println!("Mode: Batch ({} workers)", processor.workers());
        println!("================\n");

        let summary = processor
            .process_dir(&config.input_path, &config.output_path, config.mode(), target_rate)
            .context("batch processing failed")?;

        for outcome in &summary.outcomes {
            match &outcome.result {
                Ok(report) if config.verbose() => println!("  ok   {}", report),
                Ok(_) => println!("  ok   {}", outcome.job.input.display()),
                Err(e) => println!("  FAIL {}: {}", outcome.job.input.display(), e),
            }
        }

        println!("\n=== Batch Complete ===");
        println!("Files: {}/{} converted", summary.succeeded(), summary.outcomes.len());
        println!("Time: {:.2}s", summary.processing_time.as_secs_f64());

        if !summary.all_succeeded() {
            bail!("{} file(s) failed", summary.outcomes.len() - summary.succeeded());
        }
    } else {
        println!("================\n");

        let report = normalizer
            .normalize(config.mode(), &config.input_path, &config.output_path, target_rate)
            .with_context(|| format!("converting {}", config.input_path.display()))?;

        println!("=== Processing Complete ===");
        println!("{}", report);
        println!("Duration: {:.3}s -> {:.3}s", report.input_duration(), report.output_duration());
        if config.verbose() {
            println!("Time: {:.3}s", report.processing_time.as_secs_f64());
            println!("RTF: {:.4}", report.real_time_factor());
        }
    }

    Ok(())
}
