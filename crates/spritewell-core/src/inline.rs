//! Data-URI encoders for embedding assets directly in stylesheets.

use std::io::Read;
use std::sync::LazyLock;

use crate::compositing::encode_png;
use crate::error::{Result, SpriteError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};
use regex::bytes::Regex;

/// Bytes inspected when sniffing for SVG.
pub const SNIFF_LEN: usize = 512;

/// Characters left alone when escaping a URL path: unreserved plus the
/// sub-delimiters legal inside a path segment.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

static TAG_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));

/// Wrap an encoded PNG as `url('data:image/png;base64,...')`.
pub fn inline_raster(png: &[u8]) -> String {
    format!("url('data:image/png;base64,{}')", STANDARD.encode(png))
}

/// Wrap raw SVG bytes as a data URI.
///
/// With `base64` the bytes are encoded untouched. Otherwise CRLFs are dropped,
/// whitespace between tags is collapsed and the result is percent-escaped as a
/// URL path, which is smaller but more fragile.
pub fn inline_svg(svg: &[u8], base64: bool) -> String {
    if base64 {
        format!("url(\"data:image/svg+xml;base64,{}\")", STANDARD.encode(svg))
    } else {
        format!("url(\"data:image/svg+xml;utf8,{}\")", svg_utf8(svg))
    }
}

fn svg_utf8(svg: &[u8]) -> String {
    let mut stripped = Vec::with_capacity(svg.len());
    let mut i = 0;
    while i < svg.len() {
        if svg[i] == b'\r' && svg.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }
        stripped.push(svg[i]);
        i += 1;
    }
    let collapsed = TAG_GAP.replace_all(&stripped, &b"><"[..]);
    percent_encode(&collapsed, PATH_SET).to_string()
}

/// Guess whether `bytes` hold an SVG document.
///
/// Only the first `SNIFF_LEN` bytes are read. They are split on whitespace and
/// `>`; a `<svg` token means SVG, a token that is not UTF-8 ends the search.
pub fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    for token in head
        .split(|b| b.is_ascii_whitespace() || *b == b'>')
        .filter(|t| !t.is_empty())
    {
        if token == b"<svg" {
            return true;
        }
        if std::str::from_utf8(token).is_err() {
            return false;
        }
    }
    false
}

/// Inline an arbitrary asset: SVG is wrapped as-is (see `inline_svg`),
/// anything else is decoded as a raster and re-encoded as PNG.
pub fn inline_reader<R: Read>(mut r: R, base64_svg: bool) -> Result<String> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes)
        .map_err(|e| SpriteError::io("<reader>", e))?;
    if is_svg(&bytes) {
        return Ok(inline_svg(&bytes, base64_svg));
    }
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    Ok(inline_raster(&encode_png(&rgba)?))
}
