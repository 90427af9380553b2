//! The glyph-support check: decode the requested characters, filter the font
//! index, and look the characters up in the remaining fonts in order.

use std::ffi::OsString;
use std::fmt;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Error, FontIndex, GlyphChecker, Result};

/// Key of the single entry reported when no font matches the pattern
pub const ERROR_KEY: &str = "_error";

/// Unicode scalar values of `text`, via its UTF-32LE encoding
pub fn code_points(text: &str) -> Vec<u32> {
    let utf32 = text
        .chars()
        .flat_map(|c| (c as u32).to_le_bytes())
        .collect::<Vec<u8>>();

    utf32
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// One character as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterSpecifier {
    /// Text used as-is
    Literal(String),
    /// `U+XXXX`, holding the hexadecimal digits after the prefix
    CodePoint(String),
    /// Bytes in the caller's encoding
    RawBytes(Vec<u8>),
}

/// A decoded [`CharacterSpecifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text(String),
    /// A code point this host cannot hold in a `char`: above `U+10FFFF` or a
    /// surrogate
    Unrepresentable(u32),
}

impl CharacterSpecifier {
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix("U+") {
            Some(hex) => CharacterSpecifier::CodePoint(hex.to_string()),
            None => CharacterSpecifier::Literal(token.to_string()),
        }
    }

    /// Valid UTF-8 is parsed as text, anything else is kept as raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::parse(&text),
            Err(e) => CharacterSpecifier::RawBytes(e.into_bytes()),
        }
    }

    #[cfg(unix)]
    pub fn from_os_arg(arg: OsString) -> Self {
        use std::os::unix::ffi::OsStringExt;
        Self::from_bytes(arg.into_vec())
    }

    #[cfg(not(unix))]
    pub fn from_os_arg(arg: OsString) -> Self {
        match arg.into_string() {
            Ok(text) => Self::parse(&text),
            Err(arg) => Self::parse(&arg.to_string_lossy()),
        }
    }

    /// The specifier as the caller wrote it
    pub fn key(&self) -> String {
        match self {
            CharacterSpecifier::Literal(text) => text.clone(),
            CharacterSpecifier::CodePoint(hex) => format!("U+{}", hex),
            CharacterSpecifier::RawBytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Resolves the specifier; `encoding` is a WHATWG label used for raw bytes
    pub fn decode(&self, encoding: &str) -> Result<Decoded> {
        let text = match self {
            CharacterSpecifier::CodePoint(hex) => {
                if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(Error::MalformedCodePoint(self.key()));
                }
                let value = u32::from_str_radix(hex, 16)
                    .map_err(|_| Error::MalformedCodePoint(self.key()))?;
                match char::from_u32(value) {
                    Some(c) => c.to_string(),
                    None => return Ok(Decoded::Unrepresentable(value)),
                }
            }
            CharacterSpecifier::RawBytes(bytes) => {
                let enc = encoding_rs::Encoding::for_label(encoding.trim().as_bytes())
                    .ok_or_else(|| Error::UnknownEncoding(encoding.to_string()))?;
                enc.decode_without_bom_handling_and_without_replacement(bytes)
                    .ok_or_else(|| Error::InvalidBytes {
                        bytes: bytes.clone(),
                        encoding: enc.name().to_string(),
                    })?
                    .into_owned()
            }
            CharacterSpecifier::Literal(text) => text.clone(),
        };

        if text.is_empty() {
            return Err(Error::EmptyCharacter);
        }
        Ok(Decoded::Text(text))
    }
}

impl fmt::Display for CharacterSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Character → support flag, in insertion order
///
/// Recording a key twice overwrites its flag and keeps its first position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SupportMap {
    entries: Vec<(String, u8)>,
}

impl SupportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: String, supported: bool) {
        let flag = u8::from(supported);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = flag,
            None => self.entries.push((key, flag)),
        }
    }

    pub fn get(&self, key: &str) -> Option<u8> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Outcome of [`does_support`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportResult {
    Supported(SupportMap),
    /// The font pattern matched no font resource path
    NoFontMatch { pattern: String },
}

impl SupportResult {
    pub fn error_message(&self) -> Option<String> {
        match self {
            SupportResult::Supported(_) => None,
            SupportResult::NoFontMatch { pattern } => Some(format!("No font found for {}", pattern)),
        }
    }

    /// Renders the result as a Vim dictionary literal, e.g. `{'A': 1, 'é': 0}`
    pub fn to_vim(&self) -> String {
        let entries = match self {
            SupportResult::Supported(map) => map
                .iter()
                .map(|(k, v)| format!("{}: {}", vim_string(k), v))
                .collect::<Vec<_>>(),
            SupportResult::NoFontMatch { .. } => {
                let message = self.error_message().unwrap_or_default();
                vec![format!("{}: {}", vim_string(ERROR_KEY), vim_string(&message))]
            }
        };
        format!("{{{}}}", entries.join(", "))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// Single-quoted when possible, since a literal string only escapes the quote.
// Control characters need a double-quoted string to survive `eval()`.
fn vim_string(s: &str) -> String {
    if !s.chars().any(char::is_control) {
        return format!("'{}'", s.replace('\'', "''"));
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl Serialize for SupportResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SupportResult::Supported(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    m.serialize_entry(k, &v)?;
                }
                m.end()
            }
            SupportResult::NoFontMatch { .. } => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry(ERROR_KEY, &self.error_message())?;
                m.end()
            }
        }
    }
}

/// Checks which of `characters` have a glyph in the fonts whose path matches
/// `font_pattern`
///
/// Fonts are tried in index order and the scan stops at the first font that
/// has the character. Characters are keyed by their decoded text, except for
/// code points the host cannot represent, which are keyed by the specifier as
/// given and always reported unsupported.
pub fn does_support<I, P>(
    encoding: &str,
    font_pattern: &str,
    characters: &[CharacterSpecifier],
    index: &I,
    checker: &mut P,
) -> Result<SupportResult>
where
    I: FontIndex + ?Sized,
    P: GlyphChecker + ?Sized,
{
    let font_re = Regex::new(font_pattern)?;

    let fonts = index.matching_font_paths(&font_re)?;

    if fonts.is_empty() {
        log::info!("no font matches {:?}", font_pattern);
        return Ok(SupportResult::NoFontMatch {
            pattern: font_pattern.to_string(),
        });
    }
    log::debug!("{} fonts match {:?}", fonts.len(), font_pattern);

    let mut res = SupportMap::new();

    for c in characters {
        let c_dec = match c.decode(encoding)? {
            Decoded::Text(text) => text,
            Decoded::Unrepresentable(cp) => {
                log::debug!("{}: U+{:X} is beyond this host's code points", c, cp);
                res.record(c.key(), false);
                continue;
            }
        };
        log::trace!("{} -> {:X?}", c, code_points(&c_dec));

        let mut found = false;
        for path in &fonts {
            if checker.has_glyph(path, &c_dec)? {
                log::debug!("{:?} found in {}", c_dec, path);
                found = true;
                break;
            }
        }
        res.record(c_dec, found);
    }

    Ok(SupportResult::Supported(res))
}
