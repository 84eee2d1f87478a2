//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;

/// Generate a numbered synthetic image for every line of a prompt file.
///
/// Existing `fakeNNN.jpg` files are skipped, so re-running resumes where
/// the last run stopped.
#[derive(Parser, Debug)]
#[command(name = "fakegen", version, about)]
pub struct Cli {
    /// Prompt file, one prompt per non-blank line [default: prompts.txt].
    #[arg(short, long)]
    pub prompts: Option<PathBuf>,

    /// Directory receiving the generated images [default: fakes].
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Model name or short alias [default: gemini-2.5-flash-image].
    #[arg(short, long)]
    pub model: Option<String>,

    /// Seconds to wait after each generation attempt [default: 10].
    #[arg(long)]
    pub delay_secs: Option<u64>,

    /// Seconds to wait after a rate-limited attempt [default: 30].
    #[arg(long)]
    pub rate_limit_delay_secs: Option<u64>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}
