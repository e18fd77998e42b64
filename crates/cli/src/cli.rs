//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use swatch_types::ColorFormat;

#[derive(Debug, Parser)]
#[command(name = "swatch", version, about = "Manage color palettes")]
pub struct Cli {
    /// Record file to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, list, rename and delete palettes.
    #[command(subcommand)]
    Palette(PaletteCommand),
    /// Edit the colors of a palette.
    #[command(subcommand)]
    Color(ColorCommand),
    /// Read or change the display format.
    #[command(subcommand)]
    Format(FormatCommand),
}

#[derive(Debug, Subcommand)]
pub enum PaletteCommand {
    List,
    Show {
        palette: String,
    },
    Create {
        name: String,
    },
    Rename {
        palette: String,
        name: String,
    },
    Delete {
        palette: String,
    },
}

/// Colors are addressed by their 1-based position in the palette.
#[derive(Debug, Subcommand)]
pub enum ColorCommand {
    Add {
        palette: String,
        #[command(flatten)]
        values: ColorValues,
    },
    Edit {
        palette: String,
        position: usize,
        #[command(flatten)]
        values: ColorValues,
    },
    /// Duplicate a color; the copy is placed before the original.
    #[command(name = "clone")]
    Duplicate {
        palette: String,
        position: usize,
    },
    Delete {
        palette: String,
        position: usize,
    },
    /// Move the color at `from` so it ends up at `to`.
    Move {
        palette: String,
        from: usize,
        to: usize,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ColorValues {
    #[arg(long)]
    pub name: Option<String>,
    /// `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[arg(long)]
    pub hex: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum FormatCommand {
    Get,
    Set { format: ColorFormat },
}
