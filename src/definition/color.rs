use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::foundation::error::{PlotError, PlotResult};

/// `colors.yaml`: a default color plus friendly names for hex colors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorDoc {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub colors: Vec<NamedColor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub color: String,
}

/// Resolves the color names used in definitions.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    default: String,
    colors: HashMap<String, String>,
}

impl ColorTable {
    pub fn from_doc(doc: ColorDoc) -> Self {
        let mut colors = HashMap::with_capacity(doc.colors.len());
        for nc in doc.colors {
            if let Err(e) = parse_hex(&nc.color) {
                tracing::warn!(name = %nc.name, color = %nc.color, "color is not a hex value: {e}");
            }
            colors.insert(nc.name, nc.color);
        }
        Self {
            default: doc.default,
            colors,
        }
    }

    pub fn load(path: &Path) -> PlotResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlotError::configuration(format!("failed to read colors {}: {e}", path.display()))
        })?;
        let doc: ColorDoc = serde_yaml::from_str(&content).map_err(|e| {
            PlotError::configuration(format!("failed to unmarshal {}: {e}", path.display()))
        })?;
        Ok(Self::from_doc(doc))
    }

    /// Look up `name`; unregistered names pass through unchanged, empty means no color.
    pub fn resolve(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        Some(
            self.colors
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_owned()),
        )
    }

    /// Color for series that name none; `None` when `colors.yaml` sets no default.
    pub fn default_color(&self) -> Option<String> {
        let d = self.default.trim();
        if d.is_empty() { None } else { self.resolve(d) }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn parse_hex(s: &str) -> Result<[u8; 4], String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color \"{s}\""));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match s.len() {
        6 => Ok([
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ]),
        8 => Ok([
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ]),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}
