use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("format: {ext} not supported ({path})")]
    UnsupportedFormat { path: PathBuf, ext: String },
    #[error("error processing: {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no images were found for glob: {patterns:?}")]
    NoMatches { patterns: Vec<String> },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("sprite is empty: invalid image size {width}x{height}")]
    EmptySprite { width: u32, height: u32 },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Encoding error: {0}")]
    Encode(String),
}

impl SpriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpriteError>;
