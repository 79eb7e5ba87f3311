//! Integer bounding boxes in XYWH form.

use serde::{Deserialize, Serialize};

/// An axis-aligned box with its origin at the top-left corner of the image.
///
/// Coordinates are kept exactly as the dataset stores them. Nothing here
/// rejects negative or zero-sized boxes; upstream data contains both and the
/// loader's job is to carry them through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BBox {
    #[inline]
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
