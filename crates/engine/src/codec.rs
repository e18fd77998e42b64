//! Record keys and the stored palette format.
//!
//! A palette record is a JSON object `{"uuid", "name", "colors": [{"name", "hex"}]}`
//! where every name is percent-encoded. Color ids are never written.

use swatch_types::{Palette, PaletteRecord, PersistedColor};
use swatch_util::{decode_component, encode_component};

use crate::error::CodecError;

/// Key of the display format record.
pub const FORMAT_KEY: &str = "format";

/// Prefix of every palette record key.
pub const PALETTE_KEY_PREFIX: &str = "palette";

pub fn palette_key(uuid: &str) -> String {
    format!("{PALETTE_KEY_PREFIX}-{uuid}")
}

/// Inverse of [`palette_key`].
pub fn uuid_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(PALETTE_KEY_PREFIX)?.strip_prefix('-')
}

/// Serialize a palette into its stored record, ids stripped and names encoded.
pub fn encode_palette(palette: &Palette) -> Result<String, CodecError> {
    let record = PaletteRecord::from(palette);
    let stored = PaletteRecord {
        uuid: record.uuid,
        name: encode_component(&record.name),
        colors: record
            .colors
            .into_iter()
            .map(|color| PersistedColor::new(encode_component(&color.name), color.hex))
            .collect(),
    };
    Ok(serde_json::to_string(&stored)?)
}

/// Parse a stored record and decode its names.
pub fn decode_palette(raw: &str) -> Result<PaletteRecord, CodecError> {
    let stored: PaletteRecord = serde_json::from_str(raw)?;
    let decode = |value: &str, field: String| decode_component(value).map_err(|_| CodecError::Encoding { field });

    let name = decode(&stored.name, "name".to_string())?;
    let colors = stored
        .colors
        .into_iter()
        .enumerate()
        .map(|(index, color)| {
            Ok(PersistedColor {
                name: decode(&color.name, format!("colors[{index}].name"))?,
                hex: color.hex,
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;

    Ok(PaletteRecord {
        uuid: stored.uuid,
        name,
        colors,
    })
}
