// Text measurement for label sizes. The solver only sees the `TextMeasure`
// trait; the measurers here are conveniences for callers that have no
// renderer-side metrics of their own.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Measured extent of a label's text.
///
/// `height` is the ascent above the baseline and `baseline` the descent
/// below it; the label box is `width x (height + baseline)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub baseline: f32,
}

impl TextSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            baseline: 0.0,
        }
    }

    pub const fn with_baseline(width: f32, height: f32, baseline: f32) -> Self {
        Self {
            width,
            height,
            baseline,
        }
    }

    pub fn box_height(&self) -> f32 {
        self.height + self.baseline
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.baseline.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.baseline >= 0.0
    }
}

/// Measurement callback handed to the solver. Must be pure: the solver
/// calls it once per registered label and caches the answer.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> TextSize;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, f32) -> TextSize,
{
    fn measure(&self, text: &str, font_size: f32) -> TextSize {
        self(text, font_size)
    }
}

/// Monospace-style estimate: every character advances `advance x font_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixedAdvance {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str, font_size: f32) -> TextSize {
        let chars = text.chars().filter(|ch| *ch != '\n').count();
        TextSize::new(
            chars as f32 * (font_size * self.advance),
            font_size * self.line_height,
        )
    }
}

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

/// Measures advances with a system font resolved through `fontdb`.
///
/// Falls back to [`FixedAdvance`] when no face matches the family list.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMeasurer {
    family: String,
    fallback: FixedAdvance,
}

impl FontMeasurer {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            fallback: FixedAdvance::default(),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// True when a face for the family list could be loaded.
    pub fn is_available(&self) -> bool {
        FONT_CACHE
            .lock()
            .ok()
            .is_some_and(|mut cache| cache.face(&self.family).is_some())
    }
}

impl TextMeasure for FontMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> TextSize {
        if text.is_empty() || font_size <= 0.0 {
            return self.fallback.measure(text, font_size);
        }
        let measured = FONT_CACHE
            .lock()
            .ok()
            .and_then(|mut cache| cache.face(&self.family).map(|face| face.measure(text, font_size)));
        match measured {
            Some(size) if size.width > 0.0 => size,
            _ => self.fallback.measure(text, font_size),
        }
    }
}

struct FontCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn face(&mut self, font_family: &str) -> Option<&FontFace> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key);
            self.faces.insert(key.clone(), face);
        }
        self.faces.get(&key).and_then(|face| face.as_ref())
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names.iter().map(|name| generic_family(name)).collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

fn generic_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = f32::from(face.units_per_em().max(1));
        let ascender = f32::from(face.ascender());
        let descender = f32::from(face.descender()).abs();
        drop(face);
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            ascii_advances,
        })
    }

    fn measure(&self, text: &str, font_size: f32) -> TextSize {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;

        if text.is_ascii() {
            for byte in text.bytes().filter(|byte| *byte != b'\n') {
                let advance = self.ascii_advances[byte as usize];
                width += if advance == 0 {
                    fallback
                } else {
                    f32::from(advance) * scale
                };
            }
        } else if let Ok(face) = Face::parse(&self.data, self.index) {
            for ch in text.chars().filter(|ch| *ch != '\n') {
                width += face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| f32::from(advance) * scale)
                    .unwrap_or(fallback);
            }
        }

        TextSize::with_baseline(
            width.max(0.0).ceil(),
            (self.ascender * scale).ceil(),
            (self.descender * scale).ceil(),
        )
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
