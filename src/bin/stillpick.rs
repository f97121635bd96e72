use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use stillpick::{
    AttemptOutcome, FfmpegEngine, ProgressCallback, ProgressInfo, QualityScore, RunOptions,
    Session, Verdict, extract::artifact_name, quality,
};
use tracing_subscriber::EnvFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  stillpick pick input.mkv\n  stillpick pick input.mkv --out stills --progress\n  stillpick probe input.mkv --json\n  stillpick score frame.png other.png\n  stillpick completions zsh > _stillpick";

#[derive(Debug, Parser)]
#[command(
    name = "stillpick",
    version,
    about = "Pick sharp, well-lit still frames from a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show pipeline logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar instead of per-attempt lines.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// Path to the ffmpeg binary (default: $STILLPICK_FFMPEG or `ffmpeg`).
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample ten frames and keep the clear ones.
    #[command(
        about = "Sample frames and keep the clear ones",
        after_help = "Examples:\n  stillpick pick input.mkv\n  stillpick pick input.mkv --out stills --seed 7 --json"
    )]
    Pick {
        /// Input video path.
        input: PathBuf,
        /// Directory to write clear frames into.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Seed the timestamp sampler for a reproducible run.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report duration and HDR status without extracting anything.
    #[command(about = "Probe duration and HDR status", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Score existing image files.
    #[command(about = "Score image files for darkness and blur")]
    Score {
        /// Images to score.
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Print the scores as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "stillpick=info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_engine(global: &GlobalOptions) -> Result<FfmpegEngine, Box<dyn std::error::Error>> {
    let engine = FfmpegEngine::new()?;
    Ok(match &global.ffmpeg {
        Some(binary) => engine.with_binary(binary),
        None => engine,
    })
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// An output directory may be missing or empty. A populated one needs
/// `--overwrite`. Nothing is created here.
fn check_output_dir(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(format!("output path is not a directory: {}", path.display()).into());
    }
    if !overwrite && fs::read_dir(path)?.next().is_some() {
        return Err(format!(
            "output directory is not empty: {} (use --overwrite)",
            path.display()
        )
        .into());
    }
    Ok(())
}

fn colored_verdict(verdict: Verdict) -> String {
    let label = verdict.to_string();
    match verdict {
        Verdict::Valid => label.green().bold().to_string(),
        Verdict::Dark => label.blue().to_string(),
        Verdict::Blurry => label.magenta().to_string(),
        Verdict::DarkAndBlurry => label.red().to_string(),
    }
}

fn score_json(score: &QualityScore) -> serde_json::Value {
    json!({
        "mean_intensity": score.mean_intensity,
        "blur_variance": score.blur_variance,
        "is_dark": score.is_dark,
        "is_blurry": score.is_blurry,
        "verdict": score.verdict().to_string(),
    })
}

fn describe_attempt(info: &ProgressInfo) -> String {
    let position = format!("[{}/{}]", info.current, info.total).cyan().bold();
    match &info.outcome {
        AttemptOutcome::Scored(score) => format!(
            "{position} {:>6}s  {}  brightness {:.1}, variance {:.1}",
            info.timestamp,
            colored_verdict(score.verdict()),
            score.mean_intensity,
            score.blur_variance,
        ),
        AttemptOutcome::Skipped { reason } => format!(
            "{position} {:>6}s  {} {}",
            info.timestamp,
            "skipped:".yellow().bold(),
            reason.yellow()
        ),
    }
}

struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let line = describe_attempt(info);
        match &self.bar {
            Some(bar) => {
                bar.println(line);
                bar.set_position(info.current as u64);
                bar.set_message(info.tally.to_string());
            }
            None => eprintln!("{line}"),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Pick {
            input,
            out,
            seed,
            json,
        } => {
            if let Some(directory) = &out {
                check_output_dir(directory, cli.global.overwrite)?;
            }

            let bar = if cli.global.progress {
                let bar = ProgressBar::new(stillpick::ATTEMPT_BUDGET as u64);
                let style =
                    ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
                bar.set_style(style.progress_chars("##-"));
                Some(bar)
            } else {
                None
            };

            let mut options = RunOptions::new().with_progress(Arc::new(TerminalProgress {
                bar: bar.clone(),
            }));
            if let Some(seed) = seed {
                options = options.with_seed(seed);
            }

            let mut session = Session::with_options(open_engine(&cli.global)?, options);
            let report = session.run(&input)?;

            if let Some(bar) = bar {
                bar.finish_with_message("done");
            }

            let mut written = Vec::new();
            if let Some(directory) = &out {
                fs::create_dir_all(directory)?;
                for retained in &report.frames {
                    let path = directory.join(artifact_name(
                        retained.frame.attempt,
                        retained.frame.timestamp,
                    ));
                    ensure_writable_path(&path, cli.global.overwrite)?;
                    fs::write(&path, &retained.frame.bytes)?;
                    written.push(path);
                }
            }

            if json {
                let payload = json!({
                    "duration_seconds": report.duration_seconds,
                    "hdr": report.probe.is_hdr,
                    "filter_graph": report.filter_graph.as_str(),
                    "tally": {
                        "attempts": report.tally.attempts,
                        "valid": report.tally.valid,
                        "blurry": report.tally.blurry,
                        "dark": report.tally.dark,
                        "skipped": report.tally.skipped,
                    },
                    "frames": report.frames.iter().map(|retained| json!({
                        "attempt": retained.frame.attempt,
                        "timestamp_seconds": retained.frame.timestamp,
                        "score": score_json(&retained.score),
                    })).collect::<Vec<_>>(),
                    "written": written.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", report.tally);
                for path in &written {
                    println!("{} {}", "saved".green().bold(), path.display());
                }
                if report.tally.valid == 0 {
                    println!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        "no clear frames found".yellow()
                    );
                }
            }
        }
        Commands::Probe { input, json } => {
            let mut session = Session::new(open_engine(&cli.global)?);
            let probe = session.probe(&input)?;
            let graph = stillpick::FilterGraph::for_probe(&probe);

            if json {
                let payload = json!({
                    "duration_seconds": probe.duration_seconds,
                    "hdr": probe.is_hdr,
                    "filter_graph": graph.as_str(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                match probe.duration_seconds {
                    Some(seconds) => println!("Duration: {seconds} seconds"),
                    None => println!("Duration: {}", "unknown".red()),
                }
                println!("HDR (PQ): {}", if probe.is_hdr { "yes" } else { "no" });
                println!("Filter graph: {graph}");
            }
        }
        Commands::Score { images, json } => {
            let mut results = Vec::new();
            for path in &images {
                let image = image::open(path)?;
                let score = quality::score(&image)?;
                results.push((path, score));
            }

            if json {
                let payload: Vec<_> = results
                    .iter()
                    .map(|(path, score)| {
                        json!({
                            "path": path.display().to_string(),
                            "score": score_json(score),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (path, score) in &results {
                    println!(
                        "{}: {} (brightness {:.1}, variance {:.1})",
                        path.display(),
                        colored_verdict(score.verdict()),
                        score.mean_intensity,
                        score.blur_variance
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillpick", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
