use std::fs;

use image::{Rgba, RgbaImage};
use spritewell_core::error::SpriteError;
use spritewell_core::prelude::*;
use spritewell_core::to_json_map;
use tempfile::TempDir;

fn options(tmp: &TempDir) -> SpriteOptions {
    let images = tmp.path().join("img");
    fs::create_dir_all(&images).expect("mkdir img");
    fs::create_dir_all(tmp.path().join("build/gen")).expect("mkdir gen");
    SpriteOptions::builder()
        .image_dir(images)
        .build_dir(tmp.path().join("build"))
        .gen_img_dir(tmp.path().join("build/gen"))
        .padding(1)
        .build()
}

fn seed_images(opts: &SpriteOptions) {
    RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255]))
        .save(opts.image_dir.join("go.png"))
        .expect("save");
    RgbaImage::from_pixel(4, 2, Rgba([255, 255, 0, 255]))
        .save(opts.image_dir.join("stop.png"))
        .expect("save");
}

#[test]
fn export_writes_the_sheet() {
    let tmp = TempDir::new().expect("tmp");
    let opts = options(&tmp);
    seed_images(&opts);
    let sprite = Sprite::new(opts.clone());
    sprite.decode(&["*.png"]).expect("decode");

    let path = sprite.export().expect("export");
    assert!(path.is_absolute());
    assert_eq!(path.parent(), Some(std::path::absolute(&opts.gen_img_dir).expect("abs").as_path()));
    assert!(sprite.output_path().expect("name").starts_with("gen/"));

    let sheet = image::open(&path).expect("open sheet").to_rgba8();
    assert_eq!(sheet.dimensions(), (8, 11));
}

#[test]
fn existing_file_is_not_rewritten() {
    let tmp = TempDir::new().expect("tmp");
    let opts = options(&tmp);
    seed_images(&opts);
    let sprite = Sprite::new(opts);
    sprite.decode(&["*.png"]).expect("decode");

    let first = sprite.export().expect("export");
    fs::write(&first, b"placeholder").expect("overwrite");
    let second = sprite.export().expect("export again");
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).expect("read"), b"placeholder");
}

#[test]
fn empty_sprite_writes_nothing() {
    let tmp = TempDir::new().expect("tmp");
    let opts = options(&tmp);
    let gen_dir = opts.gen_img_dir.clone();
    let sprite = Sprite::new(opts);

    assert!(matches!(
        sprite.export(),
        Err(SpriteError::EmptySprite { .. })
    ));
    assert_eq!(fs::read_dir(gen_dir).expect("read dir").count(), 0);
}

#[test]
fn missing_output_dir_is_an_io_error() {
    let tmp = TempDir::new().expect("tmp");
    let mut opts = options(&tmp);
    seed_images(&opts);
    opts.gen_img_dir = tmp.path().join("nowhere");
    let sprite = Sprite::new(opts);
    sprite.decode(&["go.png"]).expect("decode");
    assert!(matches!(sprite.export(), Err(SpriteError::Io { .. })));
}

#[test]
fn sprite_map_describes_every_entry() {
    let tmp = TempDir::new().expect("tmp");
    let opts = options(&tmp);
    seed_images(&opts);
    let sprite = Sprite::new(opts);
    sprite.decode(&["*.png"]).expect("decode");

    let map = sprite.sprite_map().expect("map");
    assert_eq!((map.width, map.height), (8, 11));
    assert_eq!(map.entries.len(), 2);
    let stop = map.get("stop").expect("stop entry");
    assert_eq!((stop.x, stop.y, stop.width, stop.height), (0, 9, 4, 2));
    assert_eq!(stop.path, "stop.png");

    let json = to_json_map(&map);
    assert_eq!(json["frames"]["go"]["y"], 0);
    assert_eq!(json["frames"]["stop"]["y"], 9);
    assert_eq!(json["meta"]["size"]["h"], 11);
    assert_eq!(json["meta"]["image"], map.image.as_str());
}

#[test]
fn empty_leftover_is_replaced() {
    let tmp = TempDir::new().expect("tmp");
    let opts = options(&tmp);
    seed_images(&opts);
    let gen_dir = opts.gen_img_dir.clone();
    let sprite = Sprite::new(opts);
    sprite.decode(&["*.png"]).expect("decode");

    let name = sprite.output_path().expect("name");
    let file_name = std::path::Path::new(&name).file_name().expect("file name");
    let target = gen_dir.join(file_name);
    fs::write(&target, b"").expect("truncated leftover");

    let path = sprite.export().expect("export");
    let sheet = image::open(&path).expect("valid sheet").to_rgba8();
    assert_eq!(sheet.dimensions(), (8, 11));
}

#[test]
fn failed_write_leaves_no_partial_file() {
    let tmp = TempDir::new().expect("tmp");
    let opts = options(&tmp);
    seed_images(&opts);
    let gen_dir = opts.gen_img_dir.clone();
    let sprite = Sprite::new(opts);
    sprite.decode(&["*.png"]).expect("decode");

    // a non-empty directory squatting on the target name makes the final rename fail
    let name = sprite.output_path().expect("name");
    let file_name = std::path::Path::new(&name).file_name().expect("file name");
    let target = gen_dir.join(file_name);
    fs::create_dir_all(target.join("inner")).expect("mkdir");

    assert!(matches!(sprite.export(), Err(SpriteError::Io { .. })));
    let left: Vec<_> = fs::read_dir(&gen_dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name())
        .collect();
    assert_eq!(left, vec![file_name.to_os_string()]);
    assert!(target.is_dir());
}
