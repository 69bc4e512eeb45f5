//! Command-line interface: segment a recorded event file and narrate it.

use std::fs;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::{info, warn};

use inputlens::{narrative, segment_batch, RawEvent, SegmentationConfig, SettingsStore};

/// Turn a recording of raw input events into a readable list of interactions
#[derive(Parser, Debug)]
#[command(name = "inputlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recording file: a JSON array of raw input events
    recording: PathBuf,

    /// Settings file with segmentation thresholds
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print interactions as JSON instead of sentences
    #[arg(long)]
    json: bool,

    /// Override the double-click window, in seconds
    #[arg(long)]
    double_click_window: Option<f64>,

    /// Override the typing gap threshold, in seconds
    #[arg(long)]
    typing_gap: Option<f64>,
}

impl Cli {
    fn segmentation_config(&self) -> Result<SegmentationConfig> {
        let mut config = match &self.settings {
            Some(path) => SettingsStore::new(path.clone())?.segmentation(),
            None => SegmentationConfig::default(),
        };
        if let Some(window) = self.double_click_window {
            ensure!(
                window.is_finite() && window >= 0.0,
                "--double-click-window must be a non-negative number of seconds, got {window}"
            );
            config.double_click_window_secs = window;
        }
        if let Some(gap) = self.typing_gap {
            ensure!(
                gap.is_finite() && gap >= 0.0,
                "--typing-gap must be a non-negative number of seconds, got {gap}"
            );
            config.typing_gap_secs = gap;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    inputlens::init_logging();
    let cli = Cli::parse();
    let config = cli.segmentation_config()?;

    let contents = fs::read_to_string(&cli.recording)
        .with_context(|| format!("Failed to read recording {}", cli.recording.display()))?;
    let events: Vec<RawEvent> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse recording {}", cli.recording.display()))?;
    info!("Loaded {} events from {}", events.len(), cli.recording.display());

    let outcome = segment_batch(events, &config)?;
    if outcome.skipped > 0 {
        warn!("{} malformed events were skipped", outcome.skipped);
    }
    if !outcome.unmatched.is_empty() {
        warn!(
            "{} presses had no release before the recording ended",
            outcome.unmatched.len()
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome.interactions)?);
    } else {
        for line in narrative::render(&outcome.interactions) {
            println!("{line}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("inputlens").chain(args.iter().copied()))
    }

    #[test]
    fn threshold_overrides_replace_defaults() {
        let config = parse(&["--double-click-window", "0.3", "--typing-gap", "2", "rec.json"])
            .segmentation_config()
            .unwrap();
        assert_eq!(config.double_click_window_secs, 0.3);
        assert_eq!(config.typing_gap_secs, 2.0);
    }

    #[test]
    fn negative_or_nan_thresholds_are_rejected() {
        assert!(parse(&["--double-click-window=-0.5", "rec.json"])
            .segmentation_config()
            .is_err());
        assert!(parse(&["--typing-gap", "NaN", "rec.json"])
            .segmentation_config()
            .is_err());
        assert!(parse(&["--typing-gap", "inf", "rec.json"])
            .segmentation_config()
            .is_err());
    }
}
