//! Deterministic sheet names.
//!
//! A name depends only on what went into the sheet (pack mode, padding, the
//! ordered matched paths) and where it is written relative to the build
//! directory, never on pixel data. It is therefore known before compositing
//! finishes and identical across repeated builds. A source file whose contents
//! change under an unchanged path keeps its old name.

use std::path::{Component, Path, PathBuf};

use crate::config::{PackMode, SpriteOptions};
use sha2::{Digest, Sha256};

/// Hex characters of the digest used as the file stem.
pub const STEM_LEN: usize = 6;
/// Extension of every generated sheet.
pub const EXTENSION: &str = "png";
/// Directory component used when no output directory is configured.
pub const DEFAULT_DIR: &str = "image";

pub fn seed(mode: PackMode, padding: u32, globs: &[PathBuf]) -> String {
    let joined = globs
        .iter()
        .map(|g| g.to_string_lossy().replace('\\', "/"))
        .collect::<Vec<_>>()
        .join("/");
    format!("{}{}{}", mode.tag(), padding, joined)
}

pub fn stem(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(STEM_LEN);
    hex
}

/// `target` expressed relative to `base`, purely lexically.
pub fn relative_dir(base: &Path, target: &Path) -> String {
    if base.is_absolute() != target.is_absolute() {
        return target.to_string_lossy().replace('\\', "/");
    }
    fn norm(p: &Path) -> Vec<Component<'_>> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
    let b = norm(base);
    let t = norm(target);
    let common = b.iter().zip(&t).take_while(|(x, y)| x == y).count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(b[common..].iter().map(|_| "..".to_string()));
    parts.extend(
        t[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Directory part of the output name.
pub fn output_dir(opts: &SpriteOptions) -> String {
    if opts.gen_img_dir.as_os_str().is_empty() {
        return DEFAULT_DIR.to_string();
    }
    relative_dir(&opts.build_dir, &opts.gen_img_dir)
}

/// Full output name, `<dir>/<stem>.png` (or `<stem>.png` when the output
/// directory is the build directory).
pub fn output_name(opts: &SpriteOptions, globs: &[PathBuf]) -> String {
    let file = format!(
        "{}.{}",
        stem(&seed(opts.pack, opts.padding, globs)),
        EXTENSION
    );
    let dir = output_dir(opts);
    if dir.is_empty() {
        file
    } else {
        format!("{dir}/{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_is_short_hex() {
        let s = stem("vert0test/139.jpg");
        assert_eq!(s.len(), STEM_LEN);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(s, stem("vert0test/139.jpg"));
    }

    #[test]
    fn seed_joins_in_order() {
        let globs = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        assert_eq!(seed(PackMode::Vertical, 4, &globs), "vert4a.png/b.png");
        let rev = vec![PathBuf::from("b.png"), PathBuf::from("a.png")];
        assert_ne!(
            stem(&seed(PackMode::Vertical, 4, &globs)),
            stem(&seed(PackMode::Vertical, 4, &rev))
        );
    }

    #[test]
    fn relative_dirs() {
        assert_eq!(relative_dir(Path::new("../build"), Path::new("../build/img")), "img");
        assert_eq!(relative_dir(Path::new("build/css"), Path::new("build/img")), "../img");
        assert_eq!(relative_dir(Path::new("build"), Path::new("./build")), "");
        assert_eq!(relative_dir(Path::new(""), Path::new("out/img")), "out/img");
    }

    #[test]
    fn default_dir_without_output() {
        let opts = SpriteOptions::default();
        let name = output_name(&opts, &[PathBuf::from("test/139.jpg")]);
        assert!(name.starts_with("image/"));
        assert!(name.ends_with(".png"));
    }
}
