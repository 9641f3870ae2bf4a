use serde::{Deserialize, Serialize};

/// 2D point with f32 coordinates, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Create the origin point
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Swap the x and y components
    pub fn transposed(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }
}
