//! Face-region → drawing geometry.
//!
//! The label background sits directly on top of the face box. Nothing is
//! clamped: a face near the top edge gets a label that starts above the image
//! and the drawing layer clips it.

use lensbridge_core::FaceRegion;

/// Height of the label strip in pixels.
pub const LABEL_HEIGHT: i32 = 12;
/// Horizontal space reserved per label character.
pub const LABEL_CHAR_WIDTH: i32 = 12;

/// Rectangle given by its edges. `right` and `bottom` are exclusive for the
/// label strip and inclusive for the face outline, matching how each is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Face outline box: (left, top, left + width, top + height).
pub fn face_box(region: &FaceRegion) -> BoundingBox {
    BoundingBox {
        left: region.left,
        top: region.top,
        right: region.left + region.width as i32,
        bottom: region.top + region.height as i32,
    }
}

pub fn label_background_width(label: &str) -> i32 {
    LABEL_CHAR_WIDTH * label.chars().count() as i32
}

/// Label strip anchored at (left, top - 12) spanning 12 px per character.
pub fn label_background(region: &FaceRegion, label: &str) -> BoundingBox {
    BoundingBox {
        left: region.left,
        top: region.top - LABEL_HEIGHT,
        right: region.left + label_background_width(label),
        bottom: region.top,
    }
}
