use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use swatch_engine::PaletteStore;
use swatch_util::{JsonFileRecordStore, StorageConfig, UuidGenerator, expand_tilde};
use tracing::debug;

mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = StorageConfig::from_env();
    if let Some(path) = cli.store.as_deref() {
        config.path = expand_tilde(path);
    }
    let mut store = open_store(config.path.clone(), config.expiry_days)?;

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    commands::run(cli.command, &mut store, &mut out, &mut err)?;
    out.flush()?;
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn open_store(path: PathBuf, expiry_days: u32) -> Result<PaletteStore> {
    let records = Arc::new(
        JsonFileRecordStore::new(path.clone(), expiry_days).with_context(|| format!("open record store {}", path.display()))?,
    );
    let (store, report) = PaletteStore::open(records.clone(), Arc::new(UuidGenerator))
        .with_context(|| format!("load palettes from {}", path.display()))?;
    debug!(
        path = %records.path().display(),
        palettes = store.palettes().len(),
        skipped = report.skipped.len(),
        "record store opened"
    );
    Ok(store.with_expiry_days(expiry_days))
}
