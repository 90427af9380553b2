use std::path::PathBuf;

/// Fatal errors. A pattern that matches no font is not one of them, see
/// [`SupportResult::NoFontMatch`](crate::SupportResult::NoFontMatch).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid code point literal {0:?}")]
    MalformedCodePoint(String),

    #[error("unknown encoding {0:?}")]
    UnknownEncoding(String),

    #[error("byte sequence {bytes:02x?} is not valid {encoding}")]
    InvalidBytes { bytes: Vec<u8>, encoding: String },

    #[error("empty character specifier")]
    EmptyCharacter,

    #[error("invalid font pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fonts.conf {path}")]
    FontsConf { path: PathBuf },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("cannot load font {path}: {reason}")]
    FontLoad { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
