use crate::model::SpriteMap;
use serde_json::{Value, json};

/// Entries keyed by name, with the sheet reference alongside.
/// Shape: `{ frames: { name: { x, y, width, height, path } }, meta: { image, size } }`.
///
/// Later entries with the same name overwrite earlier ones, matching lookup's
/// last-match-wins rule.
pub fn to_json_map(map: &SpriteMap) -> Value {
    let mut frames = serde_json::Map::new();
    for e in &map.entries {
        frames.insert(
            e.name.clone(),
            json!({
                "x": e.x,
                "y": e.y,
                "width": e.width,
                "height": e.height,
                "path": e.path,
            }),
        );
    }
    json!({
        "frames": frames,
        "meta": {
            "app": "spritewell",
            "version": env!("CARGO_PKG_VERSION"),
            "image": map.image,
            "size": {"w": map.width, "h": map.height},
        }
    })
}

/// Entries as an ordered array (packing order preserved).
pub fn to_json_array(map: &SpriteMap) -> Value {
    json!({
        "image": map.image,
        "width": map.width,
        "height": map.height,
        "entries": &map.entries,
    })
}
