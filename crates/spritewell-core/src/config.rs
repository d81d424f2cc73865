use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Stacking axis of a sprite sheet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PackMode {
    /// Images are stacked top to bottom; the sheet is as wide as the widest image.
    #[default]
    Vertical,
    /// Images are laid out left to right; the sheet is as tall as the tallest image.
    Horizontal,
}

impl PackMode {
    /// Short tag mixed into the output name seed.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Vertical => "vert",
            Self::Horizontal => "horz",
        }
    }
}

impl FromStr for PackMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertical" | "vert" | "v" => Ok(Self::Vertical),
            "horizontal" | "horz" | "h" => Ok(Self::Horizontal),
            _ => Err(()),
        }
    }
}

/// Options a `Sprite` is built with. Immutable once the sprite exists.
///
/// - `image_dir` is prefixed to every glob handed to `Sprite::decode`
/// - `build_dir` and `gen_img_dir` only affect the directory part of the output name
///   (`rel(build_dir, gen_img_dir)`) and where `export` writes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpriteOptions {
    /// Directory stylesheets are built into.
    #[serde(default)]
    pub build_dir: PathBuf,
    /// Root the glob patterns are resolved against.
    #[serde(default)]
    pub image_dir: PathBuf,
    /// Directory generated sheets are written to.
    #[serde(default)]
    pub gen_img_dir: PathBuf,
    #[serde(default)]
    pub pack: PackMode,
    /// Pixels between consecutive images along the stacking axis.
    #[serde(default)]
    pub padding: u32,
}

impl SpriteOptions {
    /// Validates the options.
    ///
    /// Returns an error if `image_dir` is set but does not name a directory.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteError;

        if !self.image_dir.as_os_str().is_empty() && !self.image_dir.is_dir() {
            return Err(SpriteError::InvalidConfig(format!(
                "image_dir ({}) is not a directory",
                self.image_dir.display()
            )));
        }
        Ok(())
    }
}

/// Builder for `SpriteOptions`.
#[derive(Debug, Default, Clone)]
pub struct SpriteOptionsBuilder {
    opts: SpriteOptions,
}

impl SpriteOptionsBuilder {
    pub fn new() -> Self {
        Self {
            opts: SpriteOptions::default(),
        }
    }
    pub fn build_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.opts.build_dir = v.into();
        self
    }
    pub fn image_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.opts.image_dir = v.into();
        self
    }
    pub fn gen_img_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.opts.gen_img_dir = v.into();
        self
    }
    pub fn pack(mut self, v: PackMode) -> Self {
        self.opts.pack = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.opts.padding = v;
        self
    }
    pub fn build(self) -> SpriteOptions {
        self.opts
    }
}

impl SpriteOptions {
    /// Create a fluent builder for `SpriteOptions`.
    pub fn builder() -> SpriteOptionsBuilder {
        SpriteOptionsBuilder::new()
    }
}
