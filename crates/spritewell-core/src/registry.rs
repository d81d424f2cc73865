use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::sprite::Sprite;
use parking_lot::RwLock;

/// Thread-safe map of sprites shared by key (typically the glob list a
/// stylesheet asked for), so repeated references reuse one sheet.
#[derive(Debug, Default)]
pub struct SpriteRegistry {
    sprites: RwLock<HashMap<String, Arc<Sprite>>>,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Sprite>> {
        self.sprites.read().get(key).cloned()
    }

    /// Insert `sprite` under `key`, returning the sprite it replaced.
    pub fn insert(&self, key: impl Into<String>, sprite: Sprite) -> Option<Arc<Sprite>> {
        self.sprites.write().insert(key.into(), Arc::new(sprite))
    }

    /// Return the sprite under `key`, building it with `init` when absent.
    ///
    /// `init` runs at most once per key even with concurrent callers; if it
    /// fails nothing is stored.
    pub fn get_or_try_insert_with<F>(&self, key: &str, init: F) -> Result<Arc<Sprite>>
    where
        F: FnOnce() -> Result<Sprite>,
    {
        if let Some(found) = self.get(key) {
            return Ok(found);
        }
        let mut sprites = self.sprites.write();
        if let Some(found) = sprites.get(key) {
            return Ok(Arc::clone(found));
        }
        let sprite = Arc::new(init()?);
        sprites.insert(key.to_string(), Arc::clone(&sprite));
        Ok(sprite)
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Sprite>> {
        self.sprites.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.sprites.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.read().is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sprites.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
