use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam::channel::unbounded;
use image_batcher_core::config::{ExecutorKind, LogLevel, Sample};
use image_batcher_core::{logging, Config, ImageBatcher, Outcome, Progress};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

#[derive(Parser)]
#[command(name = "image-batcher")]
#[command(about = "Run an image program over a directory tree without losing originals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shrink every image below a directory
    Shrink {
        /// Root directory to process
        directory: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Named profile to apply
        #[arg(short, long, conflicts_with = "scheme")]
        profile: Option<String>,

        /// Named scheme of profiles to apply
        #[arg(short, long)]
        scheme: Option<String>,

        /// Write results below this directory instead of replacing originals
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Move displaced originals below this directory
        #[arg(long)]
        trash: Option<PathBuf>,

        /// Keep displaced originals next to their results
        #[arg(long)]
        cuddle: bool,

        /// Run without making changes
        #[arg(long)]
        dry_run: bool,

        /// Only process this many files per directory
        #[arg(long)]
        sample: Option<usize>,

        /// Sample the last files of each directory instead of the first
        #[arg(long, requires = "sample")]
        last: bool,

        /// Number of worker threads (0 = one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Stop dispatching after the first failure
        #[arg(long)]
        abort_on_error: bool,

        /// Run the fake executor instead of the real program
        #[arg(long)]
        fake: bool,

        #[arg(long)]
        gaussian_blur: Option<String>,

        #[arg(long)]
        sampling_factor: Option<String>,

        #[arg(long)]
        interlace: Option<String>,

        #[arg(long)]
        quality: Option<u8>,

        /// Strip profiles and comments
        #[arg(long)]
        strip: bool,

        /// Verbosity level
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Write logs to a rolling file in this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        path: Option<PathBuf>,
    },
}

fn main() -> Result<(), anyhow::Error> {
    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Shrink {
            directory,
            config,
            profile,
            scheme,
            output,
            trash,
            cuddle,
            dry_run,
            sample,
            last,
            workers,
            abort_on_error,
            fake,
            gaussian_blur,
            sampling_factor,
            interlace,
            quality,
            strip,
            verbose,
            log_dir,
        } => {
            // Set up configuration
            let mut config = match config.or_else(|| Config::default_path().filter(|p| p.exists())) {
                Some(path) => Config::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => Config::default(),
            };

            // Override config with command line arguments
            config.dry_run |= dry_run;
            config.cuddle |= cuddle;
            config.abort_on_error |= abort_on_error;
            config.profile = profile.or(config.profile);
            config.scheme = scheme.or(config.scheme);
            config.output = output.or(config.output);
            config.trash = trash.or(config.trash);
            if let Some(files) = sample {
                config.sample = Some(Sample { files, last });
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if fake {
                config.executor = ExecutorKind::Fake;
            }

            if let Some(value) = gaussian_blur {
                config.flags.set("gaussian-blur", value);
            }
            if let Some(value) = sampling_factor {
                config.flags.set("sampling-factor", value);
            }
            if let Some(value) = interlace {
                config.flags.set("interlace", value);
            }
            if let Some(value) = quality {
                config.flags.set("quality", value.to_string());
            }
            if strip {
                config.flags.set("strip", "");
            }

            // Set log level based on verbosity
            if verbose > 0 {
                config.log_level = match verbose {
                    1 => LogLevel::Debug,
                    _ => LogLevel::Trace,
                };
            }
            let level = config.log_level.to_level_filter();
            match &log_dir {
                Some(dir) => logging::init_logger(dir, level)
                    .map_err(|e| anyhow::anyhow!("could not start logging: {}", e))?,
                None => env_logger::Builder::new()
                    .filter_level(level)
                    .parse_env(logging::LOG_ENV)
                    .init(),
            }

            let batcher = ImageBatcher::new(config)?;

            let cancel = batcher.cancel_flag();
            ctrlc::set_handler(move || {
                cancel.store(true, Ordering::SeqCst);
            })?;

            // Draw progress from the run's events on a separate thread
            let (tx, rx) = unbounded::<Progress>();
            let show_bar = log_dir.is_some();
            let drawer = thread::Builder::new()
                .name("progress".to_string())
                .spawn(move || {
                    let bar = ProgressBar::hidden();
                    let mut failed = 0usize;
                    for event in rx {
                        match event {
                            Progress::Started { total } => {
                                if show_bar {
                                    bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                                }
                                bar.set_length(total as u64);
                                bar.set_style(
                                    ProgressStyle::default_bar()
                                        .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                                        .progress_chars("##-"),
                                );
                            }
                            Progress::Item { path, outcome } => {
                                if let Outcome::Failed(message) = &outcome {
                                    failed += 1;
                                    bar.println(format!("failed: {}: {}", path.display(), message));
                                }
                                bar.set_message(format!("{} failed", failed));
                                bar.inc(1);
                            }
                            Progress::Finished => bar.finish_with_message(format!("{} failed", failed)),
                        }
                    }
                })?;

            info!("Starting batch run...");
            let summary = batcher.run(&directory, Some(tx))?;
            join_drawer(drawer);

            println!(
                "{} processed, {} failed, {} skipped, {} cancelled",
                summary.processed.len(),
                summary.failed.len(),
                summary.skipped.len(),
                summary.cancelled.len()
            );
            for (path, e) in &summary.failed {
                error!("{}: {}", path.display(), e);
            }
            if !summary.skipped.is_empty() {
                warn!(
                    "{} items still carry journal markers from an earlier run",
                    summary.skipped.len()
                );
            }

            if summary.is_success() {
                Ok(())
            } else {
                anyhow::bail!("batch run did not complete cleanly")
            }
        }

        Commands::GenerateConfig { path } => {
            let path = path
                .or_else(Config::default_path)
                .unwrap_or_else(|| PathBuf::from("image-batcher.json"));
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

/// Wait for the progress thread, reporting whether it ended cleanly
fn join_drawer(drawer: JoinHandle<()>) -> bool {
    match drawer.join() {
        Ok(()) => true,
        Err(_) => {
            warn!("Progress display thread panicked");
            false
        }
    }
}
