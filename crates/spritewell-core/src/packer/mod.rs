use crate::model::Pos;

pub mod stack;

/// A packer maps an ordered list of image sizes to sheet offsets.
///
/// Implementations are pure: the same sizes always yield the same positions.
/// `position(sizes, sizes.len())` reports the whole-sheet extent rather than a
/// placement, and `-1` is answered like `0` so a failed name lookup degrades to
/// the origin instead of an error.
pub trait Packer {
    fn position(&self, sizes: &[(u32, u32)], index: isize) -> Pos;

    /// Whole-sheet width and height.
    fn extent(&self, sizes: &[(u32, u32)]) -> Pos {
        self.position(sizes, sizes.len() as isize)
    }
}
