use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jdelta",
    about = "jdelta: structural diff and patch for JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Native delta encoding
    #[default]
    Delta,
    /// RFC 6902 JSON Patch
    JsonPatch,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the delta between two JSON files
    Diff(DiffArgs),
    /// Apply a delta to a JSON file
    Patch(PatchArgs),
    /// Check whether two JSON files are equal (exit code 1 if not)
    Equal(EqualArgs),
}

/// Options shared by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct OptionArgs {
    /// Compare scalars semantically (1 == 1.0, dates as instants)
    #[arg(long)]
    pub semantic: bool,
    /// Report reordered array items as delete + add
    #[arg(long)]
    pub no_moves: bool,
    /// Store moved values in move entries
    #[arg(long)]
    pub include_moved_value: bool,
    /// Minimum string length for text diffs (0 disables them)
    #[arg(long, value_name = "N")]
    pub text_min: Option<usize>,
    /// TOML file with diff settings; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    #[command(flatten)]
    pub options: OptionArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Delta)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct PatchArgs {
    pub target: PathBuf,
    pub delta: PathBuf,
    /// Undo the delta instead of applying it
    #[arg(short, long)]
    pub reverse: bool,
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Args)]
pub struct EqualArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    #[command(flatten)]
    pub options: OptionArgs,
}
