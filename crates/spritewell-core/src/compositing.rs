use std::borrow::Borrow;

use crate::error::{Result, SpriteError};
use crate::model::Pos;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use tracing::{debug, instrument};

/// Copy all of `src` into `canvas` with its top-left at (dx, dy).
///
/// Pixels are replaced, not blended. Anything falling outside the canvas is
/// clipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..sw {
            if dx + xx >= cw {
                break;
            }
            let px = *src.get_pixel(xx, yy);
            canvas.put_pixel(dx + xx, dy + yy, px);
        }
    }
}

/// Draw `images` in index order onto a transparent canvas of size `extent`,
/// each at the matching entry of `positions`.
#[instrument(skip_all, fields(count = images.len(), width = extent.x, height = extent.y))]
pub fn compose<I: Borrow<RgbaImage>>(
    images: &[I],
    positions: &[Pos],
    extent: Pos,
) -> Result<RgbaImage> {
    if extent.x <= 0 || extent.y <= 0 {
        return Err(SpriteError::EmptySprite {
            width: extent.x.max(0) as u32,
            height: extent.y.max(0) as u32,
        });
    }
    let mut canvas = RgbaImage::new(extent.x as u32, extent.y as u32);
    for (img, pos) in images.iter().zip(positions) {
        blit_rgba(img.borrow(), &mut canvas, pos.x.max(0) as u32, pos.y.max(0) as u32);
    }
    debug!("composited sheet");
    Ok(canvas)
}

/// Encode an RGBA canvas as PNG.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let (w, h) = canvas.dimensions();
    PngEncoder::new(&mut buf)
        .write_image(canvas.as_raw(), w, h, ExtendedColorType::Rgba8)
        .map_err(|e| SpriteError::Encode(e.to_string()))?;
    Ok(buf)
}
