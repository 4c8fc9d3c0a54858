//! digitize: frame and mask a specimen photo from a JSON edit script.

mod script;

use anyhow::{Context, Result};
use app_settings::EditorSettings;
use clap::Parser;
use core_types::PinPosition;
use engine::ImageEngine;
use script::EditScript;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "digitize")]
#[command(about = "Frame a specimen photo, mask out its background and export a transparent PNG")]
#[command(version)]
struct Cli {
    /// Source photo (PNG, JPEG, TIFF, WebP or BMP).
    #[arg(long)]
    source: PathBuf,

    /// Edit script (JSON): framing transform, masking steps and optional pin.
    #[arg(long)]
    script: PathBuf,

    /// Where to write the exported PNG.
    #[arg(long)]
    out: PathBuf,

    /// Settings file to use instead of the per-user settings location.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(pin) = run(&cli)? {
        println!("{}", serde_json::to_string(&pin)?);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<Option<PinPosition>> {
    let mut settings = load_settings(cli);

    let bytes = std::fs::read(&cli.source)
        .with_context(|| format!("failed to read source image {}", cli.source.display()))?;
    let script_text = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("failed to read edit script {}", cli.script.display()))?;
    let script = EditScript::from_json(&script_text)?;

    let engine = ImageEngine::with_options(settings.editor_options());
    let mut editor = engine
        .open_session(&bytes)
        .with_context(|| format!("failed to open {}", cli.source.display()))?;

    let outcome = script::replay(&mut editor, &script)?;
    let png = editor.export_png().context("failed to encode output")?;
    std::fs::write(&cli.out, png)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;
    info!(
        "wrote {} ({} history entries)",
        cli.out.display(),
        outcome.history_len
    );

    settings.set_last_source(cli.source.clone());
    let saved = match &cli.settings {
        Some(path) => settings.save_to(path),
        None => settings.save(),
    };
    if let Err(err) = saved {
        warn!("failed to save settings: {err}");
    }

    Ok(outcome.pin)
}

fn load_settings(cli: &Cli) -> EditorSettings {
    let loaded = match &cli.settings {
        Some(path) => EditorSettings::load_from(path),
        None => EditorSettings::load(),
    };
    loaded.unwrap_or_else(|err| {
        warn!("failed to load settings, using defaults: {err}");
        EditorSettings::default()
    })
}
