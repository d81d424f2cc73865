use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, SpriteError};
use image::{ImageReader, RgbaImage};
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Extensions whose decode failures are reported as decode errors rather than
/// as unsupported formats.
const FORMATS: [&str; 3] = ["png", "gif", "jpg"];

/// One decoded source image and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: Arc<RgbaImage>,
    /// Path relative to the image directory, `/`-separated.
    pub rel: String,
    /// Path as matched by the glob.
    pub glob: PathBuf,
}

/// Reports whether `ext` (leading dot optional, any case) is a supported raster extension.
pub fn can_decode(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    FORMATS.contains(&ext.as_str())
}

/// Resolve `pattern` under `image_dir`. When nothing matches, retry with a `*`
/// suffix so `"139"` finds `139.jpg`.
pub fn resolve(image_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let joined = image_dir.join(pattern);
    let pat = joined.to_string_lossy().into_owned();
    let mut matches = glob_paths(&pat)?;
    if matches.is_empty() {
        matches = glob_paths(&format!("{pat}*"))?;
        if !matches.is_empty() {
            debug!(pattern, count = matches.len(), "resolved with * suffix");
        }
    }
    Ok(matches)
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    Ok(glob::glob(pattern)?
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .collect())
}

/// Path of `path` relative to the image directory, trying the directory as
/// configured first and its absolute form second.
pub fn relative_to_root(image_dir: &Path, abs_image_dir: &Path, path: &Path) -> String {
    let rel = path
        .strip_prefix(image_dir)
        .or_else(|_| path.strip_prefix(abs_image_dir))
        .unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Decode one file into RGBA.
pub fn decode_file(path: &Path) -> Result<RgbaImage> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| SpriteError::io(path, e))?;
    match reader.decode() {
        Ok(img) => Ok(img.to_rgba8()),
        Err(source) => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            if can_decode(&ext) {
                Err(SpriteError::Decode {
                    path: path.to_path_buf(),
                    source,
                })
            } else {
                Err(SpriteError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    ext: format!(".{ext}"),
                })
            }
        }
    }
}

/// Resolve every pattern and decode the matches in order, pushing each success
/// into `out`.
///
/// Stops at the first failure; entries already pushed stay in `out`. Fails with
/// `NoMatches` when no pattern resolved to anything.
#[instrument(skip_all, fields(dir = %image_dir.display(), patterns = patterns.len()))]
pub fn load<S: AsRef<str>>(
    image_dir: &Path,
    patterns: &[S],
    out: &mut Vec<LoadedImage>,
) -> Result<()> {
    let abs_image_dir =
        std::path::absolute(image_dir).unwrap_or_else(|_| image_dir.to_path_buf());

    let mut matched: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let found = resolve(image_dir, pattern.as_ref())?;
        if found.is_empty() {
            warn!(pattern = pattern.as_ref(), "no images matched");
        }
        matched.extend(found);
    }
    if matched.is_empty() {
        return Err(SpriteError::NoMatches {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
        });
    }

    #[cfg(feature = "parallel")]
    let decoded: Vec<Result<RgbaImage>> = matched.par_iter().map(|p| decode_file(p)).collect();
    #[cfg(not(feature = "parallel"))]
    let decoded = matched.iter().map(|p| decode_file(p));

    for (path, result) in matched.iter().zip(decoded) {
        let image = result?;
        debug!(path = %path.display(), w = image.width(), h = image.height(), "decoded");
        out.push(LoadedImage {
            image: Arc::new(image),
            rel: relative_to_root(image_dir, &abs_image_dir, path),
            glob: path.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_decode_extensions() {
        let cases = [
            ("file.png", true),
            ("file.jpg", true),
            ("file.gif", true),
            ("dir/dir/file.png", true),
            ("file.svg", false),
        ];
        for (file, want) in cases {
            let ext = Path::new(file)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            assert_eq!(can_decode(ext), want, "{file}");
        }
        assert!(can_decode(".PNG"));
    }

    #[test]
    fn relative_prefers_configured_root() {
        let rel = relative_to_root(
            Path::new("img"),
            Path::new("/abs/img"),
            Path::new("img/icons/a.png"),
        );
        assert_eq!(rel, "icons/a.png");
        let rel = relative_to_root(
            Path::new("img"),
            Path::new("/abs/img"),
            Path::new("/abs/img/b.png"),
        );
        assert_eq!(rel, "b.png");
        let rel = relative_to_root(Path::new(""), Path::new("/abs"), Path::new("test/139.jpg"));
        assert_eq!(rel, "test/139.jpg");
    }
}
