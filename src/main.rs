//! Diagnostic comparison driver.
//!
//! Reads two snapshot JSON files, runs every enabled detector, and prints
//! one line per change. Rendering, notification, and storage live in their
//! own services; this binary exists to eyeball a comparison locally.

use std::path::PathBuf;
use std::process::ExitCode;

use sheetdiff::config::DetectionConfig;
use sheetdiff::core::change::Priority;
use sheetdiff::core::context::DetectionContext;
use sheetdiff::core::detect::DiffEngine;
use sheetdiff::core::document::CharacterDocument;

const USAGE: &str = "usage: sheetdiff <old.json> <new.json> [--config <path>] [--high-only]";

struct Args {
    old_path: PathBuf,
    new_path: PathBuf,
    config_path: Option<PathBuf>,
    high_only: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut config_path = None;
    let mut high_only = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "--high-only" => high_only = true,
            "--help" | "-h" => return Err(USAGE.to_string()),
            other if other.starts_with('-') => {
                return Err(format!("unknown flag: {other}\n{USAGE}"));
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    if positional.len() != 2 {
        return Err(USAGE.to_string());
    }
    let mut positional = positional.into_iter();
    Ok(Args {
        old_path: positional.next().expect("checked length"),
        new_path: positional.next().expect("checked length"),
        config_path,
        high_only,
    })
}

fn load_snapshot(path: &PathBuf) -> Result<CharacterDocument, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    CharacterDocument::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let config = match &args.config_path {
        Some(path) => DetectionConfig::load(path),
        None => DetectionConfig::default(),
    };

    let (old, new) = match (load_snapshot(&args.old_path), load_snapshot(&args.new_path)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(message), _) | (_, Err(message)) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let engine = DiffEngine::new(config);
    let ctx = DetectionContext::default();
    let changes = if args.high_only {
        engine.run_filtered(&old, &new, &ctx, Priority::High)
    } else {
        engine.run(&old, &new, &ctx)
    };

    if changes.is_empty() {
        println!("No changes detected.");
        return ExitCode::SUCCESS;
    }

    for change in &changes {
        let marker = if change.is_secondary() { "  ↳" } else { "•" };
        println!(
            "{marker} [{}] {} {}: {}",
            change.priority, change.change_kind, change.field_path, change.description
        );
    }
    println!("{} change(s) detected.", changes.len());
    ExitCode::SUCCESS
}
