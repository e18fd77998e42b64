//! Start-up hydration from persisted records.

use swatch_types::{ColorEntry, ColorFormat, Palette};
use swatch_util::{IdGenerator, RecordStore, RecordStoreError};
use tracing::{debug, warn};

use crate::codec::{FORMAT_KEY, PALETTE_KEY_PREFIX, decode_palette, uuid_from_key};
use crate::error::CodecError;
use crate::store::fresh_id;

/// A record that could not be turned into a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: String,
}

/// Palettes recovered from storage, newest first, plus anything skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub palettes: Vec<Palette>,
    pub skipped: Vec<SkippedRecord>,
}

/// Read every palette record. Corrupt records are skipped, not fatal.
///
/// Colors receive fresh session-local ids; stored records never carry them.
pub fn load_palettes(records: &dyn RecordStore, ids: &dyn IdGenerator) -> Result<LoadReport, RecordStoreError> {
    let prefix = format!("{PALETTE_KEY_PREFIX}-");
    let entries = records.entries_with_prefix(&prefix)?;

    let mut report = LoadReport::default();
    // Records are listed oldest first; the palette list is newest first.
    for (key, raw) in entries.into_iter().rev() {
        match hydrate(&key, &raw, ids) {
            Ok(palette) => report.palettes.push(palette),
            Err(error) => {
                warn!(key = %key, error = %error, "Skipping corrupt palette record");
                report.skipped.push(SkippedRecord {
                    key,
                    reason: error.to_string(),
                });
            }
        }
    }

    debug!(loaded = report.palettes.len(), skipped = report.skipped.len(), "loaded palettes");
    Ok(report)
}

fn hydrate(key: &str, raw: &str, ids: &dyn IdGenerator) -> Result<Palette, CodecError> {
    let record = decode_palette(raw)?;
    if uuid_from_key(key) != Some(record.uuid.as_str()) {
        return Err(CodecError::KeyMismatch {
            key: key.to_string(),
            found: record.uuid,
        });
    }

    let mut colors: Vec<ColorEntry> = Vec::with_capacity(record.colors.len());
    for color in record.colors {
        let id = fresh_id(ids, |candidate| colors.iter().any(|existing| existing.id == candidate));
        colors.push(ColorEntry::from_persisted(id, color));
    }

    Ok(Palette {
        uuid: record.uuid,
        name: record.name,
        colors,
    })
}

/// Read the display format; absent, unrecognized or unreadable records yield `hex`.
pub fn load_format(records: &dyn RecordStore) -> ColorFormat {
    match records.get(FORMAT_KEY) {
        Ok(Some(value)) => {
            let format = ColorFormat::parse_or_default(&value);
            if format.as_str() != value.trim().to_ascii_lowercase() {
                debug!(value = %value, "Unrecognized format record; using hex");
            }
            format
        }
        Ok(None) => ColorFormat::default(),
        Err(error) => {
            warn!(error = %error, "Failed to read format record; using hex");
            ColorFormat::default()
        }
    }
}
