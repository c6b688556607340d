use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::Context;
use clap::Parser;
use geotag_core::{CancellationToken, CancelledError, ProcessControl, ProcessOptions, Progress};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geotag-cli", version, about = "Geotag photos from a location timeline export")]
struct Cli {
    /// Location-history JSON (Google Maps Timeline export)
    #[arg(short, long)]
    timeline: Option<PathBuf>,

    /// Folder scanned recursively for .jpg/.jpeg photos
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Output folder; the source folder layout is mirrored here
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Replace GPS tags that photos already have
    #[arg(long, overrides_with = "no_overwrite")]
    overwrite: bool,

    /// Keep existing GPS tags even if the config file sets overwrite
    #[arg(long, overrides_with = "overwrite")]
    no_overwrite: bool,

    /// Number of worker threads
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Load options from a JSON file; flags given here take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Options file for `--config`. Any key may be left out and supplied as a
/// flag instead.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    timeline: Option<PathBuf>,
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    overwrite: Option<bool>,
    jobs: Option<usize>,
}

impl ConfigFile {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

impl Cli {
    /// Merge flags over the config file. A flag always wins.
    fn into_options(self) -> anyhow::Result<ProcessOptions> {
        let config = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let pick = |flag: Option<PathBuf>, from_config: Option<PathBuf>, name: &str| {
            flag.or(from_config)
                .with_context(|| format!("--{name} is required (or set it in --config)"))
        };

        let overwrite = if self.overwrite {
            true
        } else if self.no_overwrite {
            false
        } else {
            config.overwrite.unwrap_or(false)
        };

        Ok(ProcessOptions {
            timeline: pick(self.timeline, config.timeline, "timeline")?,
            source: pick(self.source, config.source, "source")?,
            destination: pick(self.destination, config.destination, "destination")?,
            overwrite,
            jobs: self.jobs.or(config.jobs),
        })
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let options = cli.into_options()?;
    let t_total = std::time::Instant::now();

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nCancelling after the photos in progress...");
            token.cancel();
        })?;
    }

    let (tx, rx) = mpsc::channel::<Progress>();
    let reporter = std::thread::spawn(move || -> anyhow::Result<()> {
        let pb = ProgressBar::hidden();
        pb.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);
        for p in rx {
            if p.stage == "photos" {
                if pb.is_hidden() {
                    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                }
                pb.set_length(p.total);
                pb.set_position(p.current);
                pb.set_message(p.message);
            }
        }
        pb.finish_and_clear();
        Ok(())
    });

    let control = ProcessControl::new().with_cancel_token(token).with_progress(tx);
    let outcome = geotag_core::process_with_control(&options, &control);
    drop(control);
    if let Ok(Err(e)) = reporter.join() {
        tracing::debug!("progress display failed: {e:#}");
    }

    let result = match outcome {
        Err(e) if e.downcast_ref::<CancelledError>().is_some() => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        other => other?,
    };

    for failure in &result.failures {
        eprintln!("  failed: {} ({})", failure.path.display(), failure.error);
    }
    eprintln!(
        "Done! {} photos, {} geotagged, {} copied, {} failed ({:.2}s)",
        result.total_photos,
        result.geotagged,
        result.copied,
        result.failed(),
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
