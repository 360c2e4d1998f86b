#![forbid(unsafe_code)]

//! Layout-space geometry primitives.
//!
//! Coordinates are CSS pixels relative to the viewport origin. Values are
//! `f64` because layout boxes routinely land on fractional pixels.

use serde::{Deserialize, Serialize};

/// A point in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned layout box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[must_use]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Coords {
        Coords::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same size, moved to `origin`.
    #[must_use]
    pub const fn with_origin(self, origin: Coords) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }
}
