use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Tell which code points have a corresponding glyph in a given font set.
#[derive(Debug, Parser)]
#[command(name = "encoding-does-support", about, version)]
pub struct Cli {
    /// Encoding of raw-byte characters (e.g. utf-8, latin1)
    #[arg(value_name = "ENCODING")]
    pub encoding: String,

    /// Regular expression searched in font file paths
    #[arg(value_name = "FONT_PATTERN")]
    pub font_pattern: String,

    /// Characters, strings or U+XXXX code point literals
    #[arg(value_name = "CHAR", required = true, num_args = 1.., allow_hyphen_values = true)]
    pub chars: Vec<OsString>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Vim)]
    pub format: OutputFormat,

    /// fontconfig configuration file to read (default: $FONTCONFIG_FILE, then /etc/fonts/fonts.conf)
    #[arg(long, value_name = "FILE")]
    pub fonts_conf: Option<PathBuf>,

    /// Extra directory to search for fonts (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    pub font_dirs: Vec<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// How the result mapping is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Vim dictionary literal: {'A': 1}
    Vim,
    /// JSON object: {"A":1}
    Json,
}
