//! Shared type definitions for Swatch palettes and colors.
//!
//! The palette model distinguishes between the in-session representation
//! ([`ColorEntry`], addressed by a session-local `id`) and the persisted
//! representation ([`PersistedColor`], which never carries an `id`).

pub mod color;
pub mod palette;

pub use color::{ColorFormat, ColorParseError, Rgb, UnknownColorFormat, format_hex, parse_hex};
pub use palette::{ColorEntry, ConstColor, DEFAULT_COLOR, Palette, PaletteRecord, PersistedColor};
