use super::Packer;
use crate::config::{PackMode, SpriteOptions};
use crate::model::Pos;

/// Single-axis stacking: images back to back along the main axis with
/// `padding` pixels between neighbours and none at either outer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPacker {
    mode: PackMode,
    padding: u32,
}

impl StackPacker {
    pub fn new(mode: PackMode, padding: u32) -> Self {
        Self { mode, padding }
    }

    pub fn from_options(opts: &SpriteOptions) -> Self {
        Self::new(opts.pack, opts.padding)
    }

    pub fn mode(&self) -> PackMode {
        self.mode
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    /// (main, cross) length of a size under the current mode.
    #[inline]
    fn axes(&self, (w, h): (u32, u32)) -> (i64, i64) {
        match self.mode {
            PackMode::Vertical => (h as i64, w as i64),
            PackMode::Horizontal => (w as i64, h as i64),
        }
    }

    #[inline]
    fn to_pos(&self, main: i64, cross: i64) -> Pos {
        match self.mode {
            PackMode::Vertical => Pos::new(cross, main),
            PackMode::Horizontal => Pos::new(main, cross),
        }
    }
}

impl Packer for StackPacker {
    fn position(&self, sizes: &[(u32, u32)], index: isize) -> Pos {
        let n = sizes.len() as isize;
        if index == -1 || index == 0 {
            return Pos::default();
        }
        if index < -1 || index > n {
            return Pos::NOT_FOUND;
        }
        let idx = index as usize;
        let pad = self.padding as i64;

        let mut main = pad * idx as i64;
        for &size in &sizes[..idx] {
            main += self.axes(size).0;
        }

        let cross = if index == n {
            // no trailing gap after the last image
            main -= pad;
            sizes
                .iter()
                .map(|&s| self.axes(s).1)
                .max()
                .unwrap_or(0)
        } else {
            0
        };
        self.to_pos(main, cross)
    }
}
