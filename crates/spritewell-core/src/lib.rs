//! Core library for building CSS-style sprite sheets.
//!
//! - Loading: glob patterns under an image directory, with a `*` fallback for bare names
//! - Packing: single-axis stacking (vertical or horizontal) with padding between images
//! - Compositing: drawn once per content state on a background thread, shared by every waiter
//! - Naming: output names derived from the inputs, not the pixels, so they are known up front
//! - Inlining: PNG and SVG data URIs for embedding small assets
//!
//! Quick example:
//! ```ignore
//! use spritewell_core::prelude::*;
//! # fn main() -> spritewell_core::Result<()> {
//! let opts = SpriteOptions::builder()
//!     .image_dir("img")
//!     .build_dir("build")
//!     .gen_img_dir("build/img")
//!     .padding(2)
//!     .build();
//! let sprite = Sprite::new(opts);
//! sprite.decode(&["icons/*.png"])?;
//! let i = sprite.lookup("home");
//! println!("home at {:?}, sheet {}", sprite.position(i), sprite.output_path()?);
//! let written = sprite.export()?;
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod inline;
pub mod loader;
pub mod model;
pub mod namer;
pub mod packer;
pub mod registry;
pub mod sprite;

pub use config::*;
pub use error::*;
pub use export::*;
pub use inline::{inline_raster, inline_reader, inline_svg, is_svg};
pub use loader::can_decode;
pub use model::*;
pub use registry::SpriteRegistry;
pub use sprite::{CombineHandle, Composite, Sprite};

/// Convenience prelude for common types and functions.
/// Importing `spritewell_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{PackMode, SpriteOptions, SpriteOptionsBuilder};
    pub use crate::model::{Pos, SpriteEntry, SpriteMap};
    pub use crate::packer::{Packer, stack::StackPacker};
    pub use crate::registry::SpriteRegistry;
    pub use crate::sprite::{CombineHandle, Composite, Sprite};
    pub use crate::{inline_raster, inline_svg, is_svg};
}
