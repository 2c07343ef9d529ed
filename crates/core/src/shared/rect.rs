use serde::{Deserialize, Serialize};

/// Width and height in display units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative or not finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle, origin at its top-left corner.
///
/// Used both for normalized detector boxes (values in `[0, 1]`) and for
/// viewport-space rectangles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, size: Size) -> Self {
        Self::new(
            cx - size.width / 2.0,
            cy - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Edge-inclusive containment of `other` inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.width >= 0.0
            && other.height >= 0.0
            && other.x >= self.x
            && other.y >= self.y
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Maps a normalized box with a bottom-left origin (detector convention)
    /// into viewport units with a top-left origin.
    pub fn from_normalized_bottom_left(normalized: &Rect, viewport: Size) -> Rect {
        Rect::new(
            normalized.x * viewport.width,
            (1.0 - normalized.y - normalized.height) * viewport.height,
            normalized.width * viewport.width,
            normalized.height * viewport.height,
        )
    }
}
