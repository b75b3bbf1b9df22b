use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "watchtrack",
    version,
    about = "Record video watch progress as merged watched segments"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed playback-position samples into a stored progress record.
    Record(RecordArgs),
    /// Print the stored progress for one video.
    Show(VideoKey),
    /// List every tracked video.
    List,
    /// Forget the stored progress for one video.
    Delete(VideoKey),
    Tui,
}

#[derive(Debug, Clone, Args)]
pub struct VideoKey {
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub skill: String,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub key: VideoKey,

    /// Video length in seconds; required the first time a video is recorded.
    #[arg(long)]
    pub duration: Option<f64>,

    /// Read samples from a file, or `-` for stdin.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Close the open interval after the last sample.
    #[arg(long)]
    pub finish: bool,

    /// Report the skill once this percentage is reached.
    #[arg(long, value_name = "PERCENT")]
    pub report_at: Option<i64>,

    /// Skills service base URL; defaults to WATCHTRACK_SERVICE_URL.
    #[arg(long, value_name = "URL")]
    pub service_url: Option<String>,

    /// Treat a total within this many seconds of the duration as complete.
    #[arg(long, value_name = "SECONDS")]
    pub snap_to_end: Option<f64>,

    /// Samples such as `0 1 2`, `0..50` or `80..99:0.5`.
    #[arg(value_name = "SAMPLES", allow_hyphen_values = true)]
    pub samples: Vec<String>,
}
