use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use doc_shadow_synth::{DatasetSynthesizer, IntensityRange, SynthesisConfig, report::JsonReport};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Synthesize shadowed document images from shadow masks",
    long_about = None
)]
struct Args {
    /// Directory of shadow mask images to pick from.
    #[arg(long)]
    mask_library: PathBuf,

    /// Directory of shadow-free document images.
    #[arg(long)]
    shadow_free: PathBuf,

    /// Where resized masks are written.
    #[arg(long, default_value = "output/shadow_masks")]
    out_masks: PathBuf,

    /// Where shadowed documents are written.
    #[arg(long, default_value = "output/shadow_images")]
    out_images: PathBuf,

    /// Where intensity-adjusted visualization masks are written.
    #[arg(long, default_value = "output/adjusted_masks")]
    out_adjusted: PathBuf,

    #[arg(long, default_value_t = 0.15)]
    intensity_low: f64,

    #[arg(long, default_value_t = 0.8)]
    intensity_high: f64,

    /// Base seed; each document's randomness is derived from it and the file name.
    #[arg(long)]
    seed: Option<u64>,

    /// Process documents in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker threads (implies --parallel).
    #[arg(long)]
    threads: Option<usize>,

    /// Write a JSON report of the batch to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log sampled values and library details.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> SynthesisConfig {
        SynthesisConfig {
            shadow_mask_library_dir: self.mask_library.clone(),
            shadow_free_images_dir: self.shadow_free.clone(),
            output_shadow_masks_dir: self.out_masks.clone(),
            output_shadow_images_dir: self.out_images.clone(),
            output_adjusted_masks_dir: self.out_adjusted.clone(),
            shadow_intensity_range: IntensityRange::new(self.intensity_low, self.intensity_high),
            seed: self.seed,
            parallel: self.parallel || self.threads.is_some(),
            threads: self.threads,
        }
    }

    fn log_filter(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    let config = args.to_config();

    let synthesizer = match DatasetSynthesizer::new(config) {
        Ok(synthesizer) => synthesizer,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let report = match synthesizer.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let config = synthesizer.config();

    println!("{}", "=".repeat(80));
    println!("Data processing completed!");
    println!("Number of generated shadowed images: {}", report.records.len());
    println!("Output file locations:");
    println!("  - Shadow masks: {}", config.output_shadow_masks_dir.display());
    println!(
        "  - Synthetic shadow images: {}",
        config.output_shadow_images_dir.display()
    );
    println!("  - Adjusted masks: {}", config.output_adjusted_masks_dir.display());

    if let Some(path) = &args.report {
        if let Err(e) = JsonReport::new(&report, config).write(path) {
            eprintln!("Error: could not write report {}: {e}", path.display());
            return ExitCode::from(e.exit_code());
        }
        println!("Report written to {}", path.display());
    }

    if !report.is_success() {
        println!("Failed files ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  - {}: {}", failure.file_name, failure.reason);
        }
    }

    ExitCode::from(report.exit_code())
}
