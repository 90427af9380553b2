//! Tells which code points have a corresponding glyph in a given font set
//!
//! Font resource paths are discovered the way fontconfig does it (the `<dir>`
//! entries of `fonts.conf` and the files it `<include>`s), filtered by a
//! regular expression, and every remaining font is asked, in index order,
//! whether its `cmap` maps the character to a glyph.
//!
//! # Usage
//!
//! ```rust,no_run
//! use encoding_does_support::{
//!     does_support, CharacterSpecifier, FcFontIndex, FcGlyphChecker, FcIndexConfig,
//! };
//!
//! let index = FcFontIndex::new(FcIndexConfig::default());
//! let mut checker = FcGlyphChecker::new();
//! let chars = vec![CharacterSpecifier::parse("U+0041")];
//!
//! let result = does_support("utf-8", "DejaVu", &chars, &index, &mut checker).unwrap();
//! println!("{}", result.to_vim());
//! ```

#![allow(non_snake_case)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;

pub mod error;
pub mod glyph;
pub mod support;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use glyph::{FcFont, FcGlyphChecker, GlyphChecker};
pub use support::{code_points, does_support, CharacterSpecifier, Decoded, SupportMap, SupportResult};

/// Default location of the fontconfig configuration
pub const FONTS_CONF: &str = "/etc/fonts/fonts.conf";

/// Source of font resource paths
pub trait FontIndex {
    /// Returns every known font resource path, in index order
    fn font_paths(&self) -> Result<Vec<String>>;

    /// The font resource paths in which `pattern` finds a match, in index order
    fn matching_font_paths(&self, pattern: &Regex) -> Result<Vec<String>> {
        Ok(self
            .font_paths()?
            .into_iter()
            .filter(|path| pattern.is_match(path))
            .collect())
    }
}

impl FontIndex for Vec<String> {
    fn font_paths(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}

/// Where the system index looks for fonts
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FcIndexConfig {
    /// Configuration file to read. `None` means `$FONTCONFIG_FILE`, then
    /// [`FONTS_CONF`]; a missing default falls back to the OS font directories.
    pub fonts_conf: Option<PathBuf>,
    /// Directories scanned after the configured ones
    pub extra_dirs: Vec<PathBuf>,
}

/// The `prefix` attribute of a `<dir>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirPrefix {
    /// No prefix: relative paths are resolved against the config file
    None,
    /// `prefix="xdg"`: relative to `$XDG_DATA_HOME` for `<dir>`,
    /// `$XDG_CONFIG_HOME` for `<include>`
    Xdg,
    /// `prefix="default"` or `prefix="cwd"`: relative to the working directory
    Cwd,
    /// `prefix="relative"`: relative to the config file
    Relative,
}

impl DirPrefix {
    fn from_attribute(value: &str) -> Self {
        match value {
            "xdg" => DirPrefix::Xdg,
            "default" | "cwd" => DirPrefix::Cwd,
            "relative" => DirPrefix::Relative,
            _ => DirPrefix::None,
        }
    }
}

/// A `<dir>` entry of `fonts.conf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcFontDir<'a> {
    pub prefix: DirPrefix,
    pub path: &'a str,
}

/// An element of `fonts.conf` that contributes to the font index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FcConfEntry<'a> {
    Dir(FcFontDir<'a>),
    /// `<include>`: a configuration file, or a directory of them
    Include {
        location: FcFontDir<'a>,
        ignore_missing: bool,
    },
}

impl FcFontDir<'_> {
    /// Resolves the entry to an absolute directory. `conf_dir` is the directory
    /// holding the configuration file.
    pub fn resolve(&self, conf_dir: &Path) -> Option<PathBuf> {
        self.resolve_in(conf_dir, xdg_data_home)
    }

    /// Resolves an `<include>` location, where `prefix="xdg"` means the XDG
    /// configuration directory
    pub fn resolve_include(&self, conf_dir: &Path) -> Option<PathBuf> {
        self.resolve_in(conf_dir, xdg_config_home)
    }

    fn resolve_in(&self, conf_dir: &Path, xdg_base: fn() -> Option<PathBuf>) -> Option<PathBuf> {
        if let Some(rest) = self.path.strip_prefix('~') {
            let home = dirs::home_dir()?;
            return Some(home.join(rest.trim_start_matches('/')));
        }

        let path = Path::new(self.path);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }

        match self.prefix {
            DirPrefix::Xdg => Some(xdg_base()?.join(path)),
            DirPrefix::Cwd => Some(std::env::current_dir().ok()?.join(path)),
            DirPrefix::None | DirPrefix::Relative => Some(conf_dir.join(path)),
        }
    }
}

fn xdg_data_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_DATA_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => Some(dirs::home_dir()?.join(".local").join("share")),
    }
}

fn xdg_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => Some(dirs::home_dir()?.join(".config")),
    }
}

/// The system font index
#[derive(Debug, Default, Clone)]
pub struct FcFontIndex {
    config: FcIndexConfig,
}

impl FcFontIndex {
    pub fn new(config: FcIndexConfig) -> Self {
        FcFontIndex { config }
    }

    pub fn config(&self) -> &FcIndexConfig {
        &self.config
    }

    /// Directories to scan, in index order
    pub fn font_directories(&self) -> Result<Vec<PathBuf>> {
        let mut font_dirs = match FcConfigFile(&self.config) {
            Some(conf) => {
                let mut font_dirs = Vec::new();
                let mut loaded = BTreeSet::new();
                FcScanConfig(&conf, &mut loaded, &mut font_dirs)?;
                font_dirs
            }
            None => {
                log::debug!("no fontconfig configuration, using the OS font directories");
                FcDefaultFontDirectories()
            }
        };
        font_dirs.extend(self.config.extra_dirs.iter().cloned());
        Ok(font_dirs)
    }

    /// Every file with a font extension below the font directories, whether
    /// or not it parses
    pub fn font_files(&self) -> Result<Vec<String>> {
        let dirs = self.font_directories()?;

        let mut seen = BTreeSet::new();
        let mut visited_dirs = BTreeSet::new();
        let mut paths = Vec::new();

        for dir in dirs {
            for file in FcScanSingleDirectoryRecursive(dir, &mut visited_dirs) {
                let file = file.to_string_lossy().to_string();
                if seen.insert(file.clone()) {
                    paths.push(file);
                }
            }
        }

        log::debug!("found {} font files", paths.len());
        Ok(paths)
    }
}

// Files fontconfig could not parse never make it into its index
fn FcKeepParsable(paths: Vec<String>) -> Vec<String> {
    paths
        .into_iter()
        .filter(|path| match FcFont::open(path) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("leaving {} out of the font index: {}", path, e);
                false
            }
        })
        .collect()
}

impl FontIndex for FcFontIndex {
    fn font_paths(&self) -> Result<Vec<String>> {
        Ok(FcKeepParsable(self.font_files()?))
    }

    fn matching_font_paths(&self, pattern: &Regex) -> Result<Vec<String>> {
        let matching = self
            .font_files()?
            .into_iter()
            .filter(|path| pattern.is_match(path))
            .collect();
        Ok(FcKeepParsable(matching))
    }
}

// Picks the configuration file: explicit path, then $FONTCONFIG_FILE, then the
// default location if it exists
fn FcConfigFile(config: &FcIndexConfig) -> Option<PathBuf> {
    if let Some(path) = config.fonts_conf.as_ref() {
        return Some(path.clone());
    }

    if let Some(path) = std::env::var_os("FONTCONFIG_FILE") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let default = PathBuf::from(FONTS_CONF);
    if default.exists() {
        Some(default)
    } else {
        None
    }
}

// Appends the font directories of `conf` and of the files it includes, in
// document order. `loaded` holds the canonical paths of the files already read.
fn FcScanConfig(conf: &Path, loaded: &mut BTreeSet<PathBuf>, font_dirs: &mut Vec<PathBuf>) -> Result<()> {
    let canonical = conf.canonicalize().unwrap_or_else(|_| conf.to_path_buf());
    if !loaded.insert(canonical) {
        log::debug!("{} already loaded", conf.display());
        return Ok(());
    }

    let xml_utf8 = std::fs::read_to_string(conf).map_err(|source| Error::Io {
        path: conf.to_path_buf(),
        source,
    })?;

    let entries = ParseFontsConf(&xml_utf8).ok_or_else(|| Error::FontsConf {
        path: conf.to_path_buf(),
    })?;

    let conf_dir = conf.parent().unwrap_or_else(|| Path::new("/"));

    for entry in &entries {
        match entry {
            FcConfEntry::Dir(dir) => match dir.resolve(conf_dir) {
                Some(resolved) => font_dirs.push(resolved),
                None => {
                    log::warn!("cannot resolve font directory {:?} from {}", dir.path, conf.display());
                }
            },
            FcConfEntry::Include {
                location,
                ignore_missing,
            } => match location.resolve_include(conf_dir) {
                Some(resolved) => FcScanInclude(&resolved, *ignore_missing, loaded, font_dirs),
                None => {
                    log::warn!("cannot resolve include {:?} from {}", location.path, conf.display());
                }
            },
        }
    }

    Ok(())
}

// An included file or directory. Problems in included configuration are
// reported and skipped, only the top-level file is mandatory.
fn FcScanInclude(path: &Path, ignore_missing: bool, loaded: &mut BTreeSet<PathBuf>, font_dirs: &mut Vec<PathBuf>) {
    if !path.exists() {
        if ignore_missing {
            log::debug!("skipping missing include {}", path.display());
        } else {
            log::warn!("included configuration {} does not exist", path.display());
        }
        return;
    }

    let files = if path.is_dir() {
        let mut files = match std::fs::read_dir(path) {
            Ok(entries) => entries
                .filter_map(|entry| Some(entry.ok()?.path()))
                .filter(|file| is_conf_file(file))
                .collect::<Vec<_>>(),
            Err(e) => {
                log::warn!("cannot list {}: {}", path.display(), e);
                return;
            }
        };
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    for file in files {
        if let Err(e) = FcScanConfig(&file, loaded, font_dirs) {
            log::warn!("skipping included configuration: {}", e);
        }
    }
}

/// Files of an included configuration directory that get loaded: `NN-name.conf`
pub fn is_conf_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    name.len() > ".conf".len()
        && name.starts_with(|c: char| c.is_ascii_digit())
        && name.ends_with(".conf")
        && !path.is_dir()
}

/// Parses the `<dir>` and `<include>` entries of a fonts.conf file
///
/// Returns `None` on malformed XML or nested `<dir>` / `<include>` elements.
pub fn ParseFontsConf(input: &str) -> Option<Vec<FcConfEntry<'_>>> {
    use xmlparser::Token::*;
    use xmlparser::Tokenizer;

    #[derive(Clone, Copy, PartialEq)]
    enum Element {
        Dir,
        Include,
    }

    let mut entries = Vec::new();
    let mut current: Option<Element> = None;
    let mut current_prefix = DirPrefix::None;
    let mut current_path: Option<&str> = None;
    let mut ignore_missing = false;

    for token in Tokenizer::from(input) {
        let token = token.ok()?;
        match token {
            ElementStart { local, .. } => {
                let element = match local.as_str() {
                    "dir" => Element::Dir,
                    "include" => Element::Include,
                    _ => continue,
                };

                if current.is_some() {
                    return None; /* error: nested <dir></dir> tags */
                }
                current = Some(element);
                current_path = None;
                current_prefix = DirPrefix::None;
                ignore_missing = false;
            }
            Text { text, .. } => {
                let text = text.as_str().trim();
                if text.is_empty() {
                    continue;
                }
                if current.is_some() {
                    current_path = Some(text);
                }
            }
            Attribute { local, value, .. } => {
                if current.is_none() {
                    continue;
                }
                match local.as_str() {
                    "prefix" => current_prefix = DirPrefix::from_attribute(value.as_str()),
                    "ignore_missing" => ignore_missing = value.as_str() == "yes",
                    _ => {}
                }
            }
            ElementEnd { end, .. } => {
                let element = match current {
                    Some(element) => element,
                    None => continue,
                };

                match end {
                    // <dir/>
                    xmlparser::ElementEnd::Empty => {
                        current = None;
                    }
                    xmlparser::ElementEnd::Close(_, tag)
                        if tag.as_str() == "dir" || tag.as_str() == "include" =>
                    {
                        if let Some(path) = current_path.take() {
                            let location = FcFontDir {
                                prefix: current_prefix,
                                path,
                            };
                            entries.push(match element {
                                Element::Dir => FcConfEntry::Dir(location),
                                Element::Include => FcConfEntry::Include {
                                    location,
                                    ignore_missing,
                                },
                            });
                        }
                        current = None;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    Some(entries)
}

/// OS font directories, used when there is no fontconfig configuration
pub fn FcDefaultFontDirectories() -> Vec<PathBuf> {
    let mut font_dirs = Vec::new();

    #[cfg(target_os = "macos")]
    {
        font_dirs.push(PathBuf::from("/System/Library/Fonts"));
        font_dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = dirs::home_dir() {
            font_dirs.push(home.join("Library").join("Fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let system_root = std::env::var("SystemRoot")
            .or_else(|_| std::env::var("WINDIR"))
            .unwrap_or_else(|_| "C:\\Windows".to_string());
        font_dirs.push(PathBuf::from(system_root).join("Fonts"));
        if let Some(local) = dirs::data_local_dir() {
            font_dirs.push(local.join("Microsoft").join("Windows").join("Fonts"));
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        font_dirs.push(PathBuf::from("/usr/share/fonts"));
        font_dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = dirs::home_dir() {
            font_dirs.push(home.join(".fonts"));
        }
        if let Some(data) = xdg_data_home() {
            font_dirs.push(data.join("fonts"));
        }
    }

    font_dirs
}

/// Collects the font files below `dir`, sorted within each directory level.
///
/// `visited` holds canonical directories already walked, so symlink loops
/// and directories listed twice are only scanned once.
fn FcScanSingleDirectoryRecursive(dir: PathBuf, visited: &mut BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut files_to_parse = Vec::new();
    let mut dirs_to_parse = vec![dir];

    loop {
        let mut new_dirs_to_parse = Vec::new();

        for dir in dirs_to_parse {
            let canonical = dir.canonicalize().unwrap_or_else(|_| dir.clone());
            if !visited.insert(canonical) {
                continue;
            }

            let entries = match std::fs::read_dir(&dir) {
                Ok(o) => o,
                Err(e) => {
                    log::debug!("skipping font directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            let mut entries = entries
                .filter_map(|entry| Some(entry.ok()?.path()))
                .collect::<Vec<_>>();
            entries.sort();

            for path in entries {
                if path.is_dir() {
                    new_dirs_to_parse.push(path);
                } else if is_font_file(&path) {
                    files_to_parse.push(path);
                }
            }
        }

        if new_dirs_to_parse.is_empty() {
            break;
        }
        dirs_to_parse = new_dirs_to_parse;
    }

    files_to_parse
}

/// Checks whether a file has a font extension
pub fn is_font_file(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "ttf" | "otf" | "ttc" | "otc" | "woff" | "woff2"
        ),
        None => false,
    }
}
