use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use jdelta::{ComparisonMode, Delta, DiffOptions, DiffSettings};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::*;

/// What a command prints to stdout and whether it succeeded.
#[derive(Debug)]
pub struct Output {
    pub stdout: Option<String>,
    pub success: bool,
}

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let output = match cli.command {
        Command::Diff(args) => cmd_diff(&args, cli.pretty)?,
        Command::Patch(args) => cmd_patch(&args, cli.pretty)?,
        Command::Equal(args) => cmd_equal(&args, cli.pretty)?,
    };
    if let Some(text) = output.stdout {
        println!("{text}");
    }
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn cmd_diff(args: &DiffArgs, pretty: bool) -> anyhow::Result<Output> {
    let options = load_options(&args.options)?;
    let left = read_json(&args.left)?;
    let right = read_json(&args.right)?;

    let Some(delta) = jdelta::diff_values(&left, &right, &options) else {
        eprintln!("{} No differences.", "✓".green());
        return Ok(Output {
            stdout: None,
            success: true,
        });
    };
    debug!(kind = ?delta.kind(), "delta computed");

    let text = match args.format {
        OutputFormat::Delta => render(&delta, pretty)?,
        OutputFormat::JsonPatch => {
            let ops = jdelta::to_json_patch(&left, &delta, &options)
                .context("failed to render delta as JSON Patch")?;
            render(&ops, pretty)?
        }
    };
    Ok(Output {
        stdout: Some(text),
        success: true,
    })
}

pub fn cmd_patch(args: &PatchArgs, pretty: bool) -> anyhow::Result<Output> {
    let options = load_options(&args.options)?;
    let mut target = read_json(&args.target)?;
    let delta_value = read_json(&args.delta)?;
    let delta = Delta::from_value(delta_value)
        .with_context(|| format!("{} does not contain a delta", args.delta.display()))?;

    if args.reverse {
        jdelta::reverse_patch(&mut target, &delta, &options)
    } else {
        jdelta::patch(&mut target, &delta, &options)
    }
    .with_context(|| format!("failed to apply {}", args.delta.display()))?;

    Ok(Output {
        stdout: Some(render(&target, pretty)?),
        success: true,
    })
}

pub fn cmd_equal(args: &EqualArgs, pretty: bool) -> anyhow::Result<Output> {
    let options = load_options(&args.options)?;
    let left = read_json(&args.left)?;
    let right = read_json(&args.right)?;

    match jdelta::check_equal(&left, &right, &options) {
        Ok(()) => {
            eprintln!("{} Equal.", "✓".green().bold());
            Ok(Output {
                stdout: None,
                success: true,
            })
        }
        Err(mismatch) => {
            eprintln!("{} Documents differ.", "✗".red().bold());
            Ok(Output {
                stdout: Some(render(&mismatch.delta, pretty)?),
                success: false,
            })
        }
    }
}

/// Settings from `--config` (or defaults), overridden by flags.
fn load_settings(args: &OptionArgs) -> anyhow::Result<DiffSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str::<DiffSettings>(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => DiffSettings::default(),
    };
    if args.semantic {
        settings.mode = ComparisonMode::Semantic;
    }
    if args.no_moves {
        settings.detect_array_moves = false;
    }
    if args.include_moved_value {
        settings.include_value_on_move = true;
    }
    if let Some(min) = args.text_min {
        settings.text_diff_min_length = min;
    }
    Ok(settings)
}

fn load_options(args: &OptionArgs) -> anyhow::Result<DiffOptions> {
    let settings = load_settings(args)?;
    debug!(?settings, "diff settings");
    Ok(settings.into_options())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn render(value: &impl Serialize, pretty: bool) -> anyhow::Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}
