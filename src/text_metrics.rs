//! Text measurement capability.
//!
//! The placement pipeline never talks to a rendering surface directly. It asks
//! a [`TextMeasure`] for the size of a single line of text. The heuristic
//! measurer is fully deterministic and needs no fonts; the system-font measurer
//! (feature `font-metrics`) reads glyph advances through `fontdb`/`ttf-parser`
//! and falls back to the heuristic when a family cannot be resolved.

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

pub trait TextMeasure {
    /// Size of one line of text; `height` is the font's em height.
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize;

    /// Average advance of a latin character, used to turn a character budget
    /// into a wrap width.
    fn average_char_width(&self, font: &FontSpec) -> f32 {
        let sample = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let width = self.measure(sample, font).width;
        width / sample.chars().count() as f32
    }
}

/// Per-character width table calibrated against a common sans-serif stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasure;

impl TextMeasure for HeuristicMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize {
        TextSize {
            width: fallback_text_width(text, font.size),
            height: font.size,
        }
    }
}

pub(crate) fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    if font_size <= 0.0 {
        return 0.0;
    }
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_width_factor)
        .sum::<f32>()
        * font_size
}

pub(crate) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.28,
        '\t' => 1.12,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | 'i' | 'j' | 'l' => 0.24,
        '(' | ')' | '[' | ']' | '{' | '}' | 'f' | 't' | 'r' | 'I' => 0.33,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.92,
        '@' | '#' | '%' | '&' => 0.9,
        '-' | '_' => 0.38,
        '0'..='9' => 0.58,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        _ if ch.is_ascii() => 0.56,
        // Wide scripts (CJK, emoji) take roughly a full em.
        _ if (ch as u32) >= 0x1100 => 1.0,
        _ => 0.6,
    }
}

#[cfg(feature = "font-metrics")]
pub use system::SystemFontMeasure;

#[cfg(feature = "font-metrics")]
mod system {
    use super::{FontSpec, HeuristicMeasure, TextMeasure, TextSize};
    use fontdb::{Database, Family, Query, Stretch, Style, Weight};
    use once_cell::sync::Lazy;
    use std::collections::HashMap;
    use std::fs;
    use std::hash::{Hash, Hasher};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use ttf_parser::Face;

    static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

    /// Measures with the first installed font matching the CSS-like family
    /// list; unresolved families use [`HeuristicMeasure`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemFontMeasure;

    impl TextMeasure for SystemFontMeasure {
        fn measure(&self, text: &str, font: &FontSpec) -> TextSize {
            match measure_text_width(text, font.size, &font.family) {
                Some(width) => TextSize {
                    width,
                    height: font.size,
                },
                None => HeuristicMeasure.measure(text, font),
            }
        }
    }

    fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        if text.is_empty() || font_size <= 0.0 {
            return Some(0.0);
        }
        let mut guard = FONT_CACHE.lock().ok()?;
        guard.measure(text, font_size, font_family)
    }

    struct FontCache {
        db: Database,
        loaded_system_fonts: bool,
        faces: HashMap<String, Option<LoadedFace>>,
    }

    impl FontCache {
        fn new() -> Self {
            Self {
                db: Database::new(),
                loaded_system_fonts: false,
                faces: HashMap::new(),
            }
        }

        fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
            let key = family_key(font_family);
            if !self.faces.contains_key(&key) {
                let face = self.load_face(font_family, &key);
                self.faces.insert(key.clone(), face);
            }
            let face = self.faces.get_mut(&key).and_then(|face| face.as_mut())?;
            face.measure_width(&text.replace('\t', "    "), font_size)
        }

        fn load_face(&mut self, font_family: &str, key: &str) -> Option<LoadedFace> {
            if let Some(face) = load_disk_cached_face(key) {
                return Some(face);
            }
            let names: Vec<String> = font_family
                .split(',')
                .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|part| !part.is_empty())
                .collect();
            let mut families: Vec<Family<'_>> = names
                .iter()
                .map(|name| match name.to_ascii_lowercase().as_str() {
                    "serif" => Family::Serif,
                    "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                        Family::SansSerif
                    }
                    "monospace" | "ui-monospace" => Family::Monospace,
                    "cursive" => Family::Cursive,
                    "fantasy" => Family::Fantasy,
                    _ => Family::Name(name.as_str()),
                })
                .collect();
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
            let mut loaded = None;
            self.db.with_face_data(id, |data, index| {
                let bytes = data.to_vec();
                if Face::parse(&bytes, index).is_ok() {
                    store_disk_cached_face(key, &bytes, index);
                    loaded = LoadedFace::new(bytes, index);
                }
            });
            loaded
        }
    }

    struct LoadedFace {
        units_per_em: u16,
        ascii_advances: [u16; 128],
        advances: HashMap<char, Option<u16>>,
        data: Vec<u8>,
        index: u32,
    }

    impl LoadedFace {
        fn new(data: Vec<u8>, index: u32) -> Option<Self> {
            let face = Face::parse(&data, index).ok()?;
            let mut ascii_advances = [0u16; 128];
            for byte in 0u8..=127 {
                if let Some(glyph) = face.glyph_index(byte as char) {
                    ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
                }
            }
            let units_per_em = face.units_per_em().max(1);
            Some(Self {
                units_per_em,
                ascii_advances,
                advances: HashMap::new(),
                data,
                index,
            })
        }

        fn advance(&mut self, ch: char) -> Option<u16> {
            if ch.is_ascii() {
                let advance = self.ascii_advances[ch as usize];
                return (advance > 0).then_some(advance);
            }
            if let Some(cached) = self.advances.get(&ch) {
                return *cached;
            }
            let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
                let glyph = face.glyph_index(ch)?;
                face.glyph_hor_advance(glyph)
            });
            self.advances.insert(ch, advance);
            advance
        }

        fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
            let scale = font_size / self.units_per_em as f32;
            let fallback = font_size * 0.56;
            let mut width = 0.0f32;
            for ch in text.chars() {
                if ch == '\n' {
                    continue;
                }
                width += match self.advance(ch) {
                    Some(advance) => advance as f32 * scale,
                    None => fallback,
                };
            }
            Some(width.max(0.0))
        }
    }

    fn family_key(font_family: &str) -> String {
        let trimmed = font_family.trim();
        if trimmed.is_empty() {
            "sans-serif".to_string()
        } else {
            trimmed.to_string()
        }
    }

    fn cache_paths(key: &str) -> Option<(PathBuf, PathBuf)> {
        let base = std::env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        let dir = base.join("curvelabels").join("font-cache");
        Some((
            dir.join(format!("{hash:x}.font")),
            dir.join(format!("{hash:x}.meta")),
        ))
    }

    fn load_disk_cached_face(key: &str) -> Option<LoadedFace> {
        let (font_path, meta_path) = cache_paths(key)?;
        if !font_path.exists() || !meta_path.exists() {
            return None;
        }
        let bytes = fs::read(font_path).ok()?;
        let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
        LoadedFace::new(bytes, index)
    }

    fn store_disk_cached_face(key: &str, bytes: &[u8], index: u32) {
        let Some((font_path, meta_path)) = cache_paths(key) else {
            return;
        };
        if font_path.exists() {
            return;
        }
        if let Some(parent) = font_path.parent()
            && fs::create_dir_all(parent).is_err()
        {
            return;
        }
        write_cache_pair(&font_path, &meta_path, bytes, index);
    }

    /// Writes the face bytes and its index. A font file without its meta file
    /// is removed again, since loading needs both.
    fn write_cache_pair(font_path: &Path, meta_path: &Path, bytes: &[u8], index: u32) -> bool {
        if let Err(err) = fs::write(font_path, bytes) {
            tracing::debug!(path = %font_path.display(), error = %err, "font cache write failed");
            return false;
        }
        if let Err(err) = fs::write(meta_path, index.to_string()) {
            tracing::debug!(path = %meta_path.display(), error = %err, "font cache meta write failed");
            if let Err(err) = fs::remove_file(font_path) {
                tracing::debug!(path = %font_path.display(), error = %err, "stale font cache not removed");
            }
            return false;
        }
        true
    }

}
