//! Command handlers driving the palette store.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use swatch_engine::{PaletteStore, WriteOutcome};
use swatch_types::{ColorEntry, ColorFormat, Palette, PersistedColor, format_hex, parse_hex};

use crate::cli::{ColorCommand, ColorValues, Command, FormatCommand, PaletteCommand};

pub fn run(command: Command, store: &mut PaletteStore, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    match command {
        Command::Palette(command) => run_palette(command, store, out, err),
        Command::Color(command) => run_color(command, store, err),
        Command::Format(command) => run_format(command, store, out, err),
    }
}

fn run_palette(command: PaletteCommand, store: &mut PaletteStore, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    match command {
        PaletteCommand::List => {
            if store.palettes().is_empty() {
                writeln!(out, "no palettes")?;
            }
            for palette in store.palettes() {
                writeln!(out, "{}  {}  ({} colors)", palette.uuid, palette.name, palette.colors.len())?;
            }
        }
        PaletteCommand::Show { palette } => {
            let uuid = resolve_palette(store, &palette)?;
            let palette = store.palette(&uuid).context("palette vanished")?;
            write_palette(out, palette, store.format())?;
        }
        PaletteCommand::Create { name } => {
            let (uuid, outcome) = store.create_palette(name);
            report(err, &outcome)?;
            writeln!(out, "{uuid}")?;
        }
        PaletteCommand::Rename { palette, name } => {
            let uuid = resolve_palette(store, &palette)?;
            let colors = store.palette(&uuid).map(|palette| palette.colors.clone()).unwrap_or_default();
            let outcome = store.change_palette(&uuid, name, colors)?;
            report(err, &outcome)?;
        }
        PaletteCommand::Delete { palette } => {
            let uuid = resolve_palette(store, &palette)?;
            let outcome = store.delete_palette(&uuid)?;
            report(err, &outcome)?;
        }
    }
    Ok(())
}

fn run_color(command: ColorCommand, store: &mut PaletteStore, err: &mut impl Write) -> Result<()> {
    match command {
        ColorCommand::Add { palette, values } => {
            let uuid = resolve_palette(store, &palette)?;
            let color = color_from_values(&values, None)?;
            let (_, outcome) = store.add_color(&uuid, color)?;
            report(err, &outcome)?;
        }
        ColorCommand::Edit {
            palette,
            position,
            values,
        } => {
            let uuid = resolve_palette(store, &palette)?;
            let current = color_at(store, &uuid, position)?;
            let color = color_from_values(&values, Some(current.to_persisted()))?.unwrap_or_else(|| current.to_persisted());
            let outcome = store.edit_color(&uuid, &current.id, color)?;
            report(err, &outcome)?;
        }
        ColorCommand::Duplicate { palette, position } => {
            let uuid = resolve_palette(store, &palette)?;
            let source = color_at(store, &uuid, position)?;
            let (_, outcome) = store.clone_color(&uuid, &source.id, source.to_persisted())?;
            report(err, &outcome)?;
        }
        ColorCommand::Delete { palette, position } => {
            let uuid = resolve_palette(store, &palette)?;
            let target = color_at(store, &uuid, position)?;
            let outcome = store.delete_color(&uuid, &target.id)?;
            report(err, &outcome)?;
        }
        ColorCommand::Move { palette, from, to } => {
            let uuid = resolve_palette(store, &palette)?;
            let mut order: Vec<String> = store
                .palette(&uuid)
                .map(|palette| palette.colors.iter().map(|color| color.id.clone()).collect())
                .unwrap_or_default();
            let source = to_index(from, order.len())?;
            let target = to_index(to, order.len())?;
            let moved = order.remove(source);
            order.insert(target, moved);
            store.reorder_colors(&uuid, &order)?;
            let outcome = store.commit_reorder(&uuid, &order)?;
            report(err, &outcome)?;
        }
    }
    Ok(())
}

fn run_format(command: FormatCommand, store: &mut PaletteStore, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    match command {
        FormatCommand::Get => writeln!(out, "{}", store.format())?,
        FormatCommand::Set { format } => {
            let outcome = store.change_format(format);
            report(err, &outcome)?;
        }
    }
    Ok(())
}

/// Accept a full uuid or an unambiguous prefix of one.
fn resolve_palette(store: &PaletteStore, query: &str) -> Result<String> {
    if let Some(palette) = store.palette(query) {
        return Ok(palette.uuid.clone());
    }
    let matches: Vec<&str> = store
        .palettes()
        .iter()
        .map(|palette| palette.uuid.as_str())
        .filter(|uuid| uuid.starts_with(query))
        .collect();
    match matches.as_slice() {
        [single] => Ok((*single).to_string()),
        [] => bail!("no palette matches '{query}'"),
        _ => bail!("'{query}' matches {} palettes; use more characters", matches.len()),
    }
}

fn to_index(position: usize, len: usize) -> Result<usize> {
    if position == 0 || position > len {
        bail!("position {position} is out of range (palette has {len} colors)");
    }
    Ok(position - 1)
}

fn color_at(store: &PaletteStore, uuid: &str, position: usize) -> Result<ColorEntry> {
    let palette = store.palette(uuid).ok_or_else(|| anyhow!("no palette {uuid}"))?;
    let index = to_index(position, palette.colors.len())?;
    Ok(palette.colors[index].clone())
}

/// Build the color to store from flags, filling gaps from `base`.
/// Returns `None` when no flag was given and there is no base.
fn color_from_values(values: &ColorValues, base: Option<PersistedColor>) -> Result<Option<PersistedColor>> {
    let hex = match values.hex.as_deref() {
        Some(raw) => Some(parse_hex(raw).with_context(|| format!("invalid color '{raw}'"))?.to_hex()),
        None => None,
    };
    if values.name.is_none() && hex.is_none() {
        return Ok(base);
    }
    let base = base.unwrap_or_else(|| swatch_types::DEFAULT_COLOR.into());
    Ok(Some(PersistedColor {
        name: values.name.clone().unwrap_or(base.name),
        hex: hex.unwrap_or(base.hex),
    }))
}

fn write_palette(out: &mut impl Write, palette: &Palette, format: ColorFormat) -> Result<()> {
    writeln!(out, "{} ({})", palette.name, palette.uuid)?;
    for (index, color) in palette.colors.iter().enumerate() {
        let rendered = format_hex(&color.hex, format).unwrap_or_else(|_| color.hex.clone());
        writeln!(out, "  {}. {}  {}", index + 1, color.name, rendered)?;
    }
    Ok(())
}

fn report(err: &mut impl Write, outcome: &WriteOutcome) -> Result<()> {
    if let WriteOutcome::NotPersisted { key, reason } = outcome {
        writeln!(err, "warning: change to '{key}' was not saved and may be lost: {reason}")?;
    }
    Ok(())
}
