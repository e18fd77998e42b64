use serde::{Deserialize, Serialize};

/// Fallback color used when a new entry is added without explicit values.
pub const DEFAULT_COLOR: ConstColor = ConstColor {
    name: "White",
    hex: "#ffffff",
};

/// A single color inside a palette as held in memory during a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorEntry {
    /// Session-local identifier, unique within the owning palette.
    pub id: String,
    /// User-facing color name.
    pub name: String,
    /// Canonical `#rrggbb` value.
    pub hex: String,
}

impl ColorEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hex: hex.into(),
        }
    }

    /// Attach a session-local id to persisted color values.
    pub fn from_persisted(id: impl Into<String>, color: PersistedColor) -> Self {
        Self {
            id: id.into(),
            name: color.name,
            hex: color.hex,
        }
    }

    /// The only mapping from an in-memory entry to its stored shape.
    pub fn to_persisted(&self) -> PersistedColor {
        PersistedColor {
            name: self.name.clone(),
            hex: self.hex.clone(),
        }
    }
}

/// The stored shape of a color: display values only, never an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedColor {
    pub name: String,
    pub hex: String,
}

impl PersistedColor {
    pub fn new(name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
        }
    }
}

/// Compile-time color literal, converted into an owned [`PersistedColor`] on use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstColor {
    pub name: &'static str,
    pub hex: &'static str,
}

impl From<ConstColor> for PersistedColor {
    fn from(color: ConstColor) -> Self {
        PersistedColor::new(color.name, color.hex)
    }
}

/// A named, ordered collection of colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Identifier assigned at creation; never changes.
    pub uuid: String,
    pub name: String,
    /// Display order is the vector order.
    pub colors: Vec<ColorEntry>,
}

impl Palette {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            colors: Vec::new(),
        }
    }

    /// Position of the entry with the given id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.colors.iter().position(|color| color.id == id)
    }

    pub fn contains_color(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    /// Colors in stored shape, order preserved.
    pub fn persisted_colors(&self) -> Vec<PersistedColor> {
        self.colors.iter().map(ColorEntry::to_persisted).collect()
    }
}

/// A decoded palette record, names already percent-decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteRecord {
    pub uuid: String,
    pub name: String,
    pub colors: Vec<PersistedColor>,
}

impl From<&Palette> for PaletteRecord {
    fn from(palette: &Palette) -> Self {
        Self {
            uuid: palette.uuid.clone(),
            name: palette.name.clone(),
            colors: palette.persisted_colors(),
        }
    }
}
