//! Color display formats and hex parsing.
//!
//! Palettes always store colors as `#rrggbb`. The [`ColorFormat`] preference
//! only decides how a stored value is rendered, see [`format_hex`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a hex color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("empty color string")]
    Empty,
    #[error("invalid hex length: expected 3, 6 or 8 digits, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex digit in '{0}'")]
    InvalidDigit(String),
}

/// Process-wide display format preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    #[default]
    Hex,
    Hexa,
    Rgb,
    Rgba,
    Hsl,
    Hsla,
    Hsv,
    Hsva,
    Cmyk,
}

impl ColorFormat {
    pub const ALL: [ColorFormat; 9] = [
        Self::Hex,
        Self::Hexa,
        Self::Rgb,
        Self::Rgba,
        Self::Hsl,
        Self::Hsla,
        Self::Hsv,
        Self::Hsva,
        Self::Cmyk,
    ];

    /// Name used in the persisted format record.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Hexa => "hexa",
            Self::Rgb => "rgb",
            Self::Rgba => "rgba",
            Self::Hsl => "hsl",
            Self::Hsla => "hsla",
            Self::Hsv => "hsv",
            Self::Hsva => "hsva",
            Self::Cmyk => "cmyk",
        }
    }

    /// Lenient parse used for stored values: anything unrecognized becomes `Hex`.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a format name is not one of [`ColorFormat::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color format '{0}'")]
pub struct UnknownColorFormat(pub String);

impl FromStr for ColorFormat {
    type Err = UnknownColorFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| UnknownColorFormat(value.to_string()))
    }
}

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Canonical lower-case `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn unit(self) -> (f64, f64, f64) {
        (f64::from(self.r) / 255.0, f64::from(self.g) / 255.0, f64::from(self.b) / 255.0)
    }

    /// Hue in degrees plus the max/min channel and their delta.
    fn hue_parts(self) -> (f64, f64, f64, f64) {
        let (r, g, b) = self.unit();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        (hue, max, min, delta)
    }

    /// `(hue°, saturation, lightness)` with saturation/lightness in `0..=1`.
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let (hue, max, min, delta) = self.hue_parts();
        let lightness = (max + min) / 2.0;
        let saturation = if delta == 0.0 {
            0.0
        } else {
            delta / (1.0 - (2.0 * lightness - 1.0).abs())
        };
        (hue, saturation, lightness)
    }

    /// `(hue°, saturation, value)` with saturation/value in `0..=1`.
    pub fn to_hsv(self) -> (f64, f64, f64) {
        let (hue, max, _, delta) = self.hue_parts();
        let saturation = if max == 0.0 { 0.0 } else { delta / max };
        (hue, saturation, max)
    }

    /// `(c, m, y, k)` in `0..=1`.
    pub fn to_cmyk(self) -> (f64, f64, f64, f64) {
        let (r, g, b) = self.unit();
        let k = 1.0 - r.max(g).max(b);
        if k >= 1.0 {
            return (0.0, 0.0, 0.0, 1.0);
        }
        let scale = 1.0 - k;
        ((1.0 - r - k) / scale, (1.0 - g - k) / scale, (1.0 - b - k) / scale, k)
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional, alpha is ignored).
pub fn parse_hex(input: &str) -> Result<Rgb, ColorParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ColorParseError::Empty);
    }
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.is_ascii() {
        return Err(ColorParseError::InvalidDigit(input.to_string()));
    }

    let nibble = |c: u8| -> Result<u8, ColorParseError> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(ColorParseError::InvalidDigit(input.to_string())),
        }
    };
    let byte = |hi: u8, lo: u8| -> Result<u8, ColorParseError> { Ok(nibble(hi)? << 4 | nibble(lo)?) };

    let bytes = digits.as_bytes();
    match bytes.len() {
        3 => Ok(Rgb::new(nibble(bytes[0])? * 17, nibble(bytes[1])? * 17, nibble(bytes[2])? * 17)),
        6 | 8 => {
            if bytes.len() == 8 {
                byte(bytes[6], bytes[7])?;
            }
            Ok(Rgb::new(byte(bytes[0], bytes[1])?, byte(bytes[2], bytes[3])?, byte(bytes[4], bytes[5])?))
        }
        other => Err(ColorParseError::InvalidLength(other)),
    }
}

fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn degrees(value: f64) -> i64 {
    (value.round() as i64).rem_euclid(360)
}

/// Render a stored hex value in the requested display format.
pub fn format_hex(hex: &str, format: ColorFormat) -> Result<String, ColorParseError> {
    let rgb = parse_hex(hex)?;
    let Rgb { r, g, b } = rgb;
    let rendered = match format {
        ColorFormat::Hex => rgb.to_hex(),
        ColorFormat::Hexa => format!("{}ff", rgb.to_hex()),
        ColorFormat::Rgb => format!("rgb({r}, {g}, {b})"),
        ColorFormat::Rgba => format!("rgba({r}, {g}, {b}, 1)"),
        ColorFormat::Hsl | ColorFormat::Hsla => {
            let (h, s, l) = rgb.to_hsl();
            let (h, s, l) = (degrees(h), percent(s), percent(l));
            if format == ColorFormat::Hsl {
                format!("hsl({h}, {s}%, {l}%)")
            } else {
                format!("hsla({h}, {s}%, {l}%, 1)")
            }
        }
        ColorFormat::Hsv | ColorFormat::Hsva => {
            let (h, s, v) = rgb.to_hsv();
            let (h, s, v) = (degrees(h), percent(s), percent(v));
            if format == ColorFormat::Hsv {
                format!("hsv({h}, {s}%, {v}%)")
            } else {
                format!("hsva({h}, {s}%, {v}%, 1)")
            }
        }
        ColorFormat::Cmyk => {
            let (c, m, y, k) = rgb.to_cmyk();
            format!("cmyk({}%, {}%, {}%, {}%)", percent(c), percent(m), percent(y), percent(k))
        }
    };
    Ok(rendered)
}
