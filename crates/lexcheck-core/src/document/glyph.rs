use serde::{Deserialize, Serialize};

/// Lower bound of the body region as a fraction of page height.
pub const BODY_REGION_LOW: f64 = 0.08;
/// Upper bound of the body region as a fraction of page height.
pub const BODY_REGION_HIGH: f64 = 0.92;

/// A run of text placed on a page by the decoder.
///
/// `y` is the baseline in page space, growing upward from the bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphItem {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GlyphItem {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge of the item's box.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Whether the baseline lies strictly inside the body band of a page of
    /// the given height. Headers and footers fall outside.
    pub fn in_body_region(&self, page_height: f64) -> bool {
        self.y > BODY_REGION_LOW * page_height && self.y < BODY_REGION_HIGH * page_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_region_bounds_are_exclusive() {
        let h = 1000.0;
        assert!(!GlyphItem::new("a", 0.0, 80.0, 1.0, 1.0).in_body_region(h));
        assert!(!GlyphItem::new("a", 0.0, 920.0, 1.0, 1.0).in_body_region(h));
        assert!(GlyphItem::new("a", 0.0, 80.5, 1.0, 1.0).in_body_region(h));
        assert!(GlyphItem::new("a", 0.0, 919.9, 1.0, 1.0).in_body_region(h));
    }

    #[test]
    fn test_right_edge() {
        let item = GlyphItem::new("abc", 10.0, 0.0, 12.5, 10.0);
        assert_eq!(item.right(), 22.5);
    }
}
