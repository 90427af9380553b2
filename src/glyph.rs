//! Per-font glyph lookup.
//!
//! A font "has" a character when its preferred Unicode `cmap` subtable maps
//! the code point to a glyph other than `.notdef`.

use std::collections::BTreeMap;
use std::fs::File;

use allsorts::binary::read::ReadScope;
use allsorts::font::read_cmap_subtable;
use allsorts::font_data::FontData;
use allsorts::tables::cmap::{Cmap, CmapSubtable};
use allsorts::tables::FontTableProvider;
use allsorts::tag;
use mmapio::MmapOptions;

use crate::{Error, Result};

/// Answers "does the font at `path` contain a glyph for `text`"
pub trait GlyphChecker {
    fn has_glyph(&mut self, path: &str, text: &str) -> Result<bool>;
}

/// A font face opened from disk
///
/// Only the `cmap` table is kept; the file mapping is released once it has
/// been copied out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcFont {
    path: String,
    cmap_data: Vec<u8>,
}

impl FcFont {
    /// Opens the first face of the font file at `path`
    pub fn open(path: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| load_error(path, e))?;
        let font_bytes = unsafe { MmapOptions::new().map(&file) }.map_err(|e| load_error(path, e))?;
        Self::from_bytes(path, &font_bytes[..])
    }

    /// Parses a font held in memory. `path` is only used to identify the font.
    pub fn from_bytes(path: &str, font_bytes: &[u8]) -> Result<Self> {
        // font_index = 0: the first face of a collection
        let font_index = 0;

        let scope = ReadScope::new(font_bytes);
        let font_file = scope
            .read::<FontData<'_>>()
            .map_err(|e| load_error(path, e))?;
        let provider = font_file
            .table_provider(font_index)
            .map_err(|e| load_error(path, e))?;

        let cmap_data = provider
            .table_data(tag::CMAP)
            .map_err(|e| load_error(path, e))?
            .ok_or_else(|| load_error(path, "no cmap table"))?
            .into_owned();

        let font = FcFont {
            path: path.to_string(),
            cmap_data,
        };

        // reject fonts without a usable Unicode subtable up front
        font.with_subtable(|_| Ok(()))?;
        Ok(font)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the font maps `c` to a real glyph
    pub fn has_char(&self, c: char) -> Result<bool> {
        self.with_subtable(|subtable| self.lookup(subtable, c))
    }

    /// Whether every character of `text` has a glyph in this font
    pub fn has_text(&self, text: &str) -> Result<bool> {
        self.with_subtable(|subtable| {
            for c in text.chars() {
                if !self.lookup(subtable, c)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    fn lookup(&self, subtable: &CmapSubtable<'_>, c: char) -> Result<bool> {
        let glyph_id = subtable
            .map_glyph(c as u32)
            .map_err(|e| load_error(&self.path, e))?;
        Ok(matches!(glyph_id, Some(id) if id != 0))
    }

    fn with_subtable<T>(&self, f: impl FnOnce(&CmapSubtable<'_>) -> Result<T>) -> Result<T> {
        let cmap = ReadScope::new(&self.cmap_data)
            .read::<Cmap<'_>>()
            .map_err(|e| load_error(&self.path, e))?;
        let (_encoding, subtable) = read_cmap_subtable(&cmap)
            .map_err(|e| load_error(&self.path, e))?
            .ok_or_else(|| load_error(&self.path, "no Unicode cmap subtable"))?;
        f(&subtable)
    }
}

fn load_error(path: &str, reason: impl std::fmt::Display) -> Error {
    Error::FontLoad {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Glyph checker backed by the font files themselves
///
/// Each font is opened the first time it is queried and kept for the rest of
/// the invocation.
#[derive(Debug, Default)]
pub struct FcGlyphChecker {
    fonts: BTreeMap<String, FcFont>,
}

impl FcGlyphChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fonts opened so far
    pub fn loaded(&self) -> usize {
        self.fonts.len()
    }

    fn font(&mut self, path: &str) -> Result<&FcFont> {
        if !self.fonts.contains_key(path) {
            log::debug!("opening font {}", path);
            let font = FcFont::open(path)?;
            self.fonts.insert(path.to_string(), font);
        }
        self.fonts
            .get(path)
            .ok_or_else(|| load_error(path, "font cache lookup failed"))
    }
}

impl GlyphChecker for FcGlyphChecker {
    fn has_glyph(&mut self, path: &str, text: &str) -> Result<bool> {
        self.font(path)?.has_text(text)
    }
}
