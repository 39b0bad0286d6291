//! Render requests.

use crate::fixed::FixedPoint;

/// Iteration cap of the fallback view.
pub const DEFAULT_MAX_ITERATIONS: u32 = 64;

/// One full-grid render request.
///
/// Pixel `(px, py)` samples `c = (corner_x + px * step, corner_y + py * step)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewCommand {
    pub pixels_x: u16,
    pub pixels_y: u16,
    pub max_iterations: u32,
    pub corner_x: FixedPoint,
    pub corner_y: FixedPoint,
    pub step: FixedPoint,
}

impl ViewCommand {
    /// A `width` by `height` view around a center point whose shorter side spans
    /// `radius`, i.e. `step = radius / min(width, height)`.
    pub fn centered(
        center_x: FixedPoint,
        center_y: FixedPoint,
        radius: FixedPoint,
        width: u16,
        height: u16,
        max_iterations: u32,
    ) -> Self {
        let shorter = i64::from(width.min(height).max(1));
        let step = FixedPoint::from_bits(radius.to_bits() / shorter);
        let step = if step == FixedPoint::ZERO {
            FixedPoint::LSB
        } else {
            step
        };

        Self {
            pixels_x: width,
            pixels_y: height,
            max_iterations,
            corner_x: center_x - step.wrapping_mul_int(i64::from(width / 2)),
            corner_y: center_y - step.wrapping_mul_int(i64::from(height / 2)),
            step,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.pixels_x) * u64::from(self.pixels_y)
    }

    /// The point sampled by pixel `(pixel_x, pixel_y)`.
    pub fn point(&self, pixel_x: u16, pixel_y: u16) -> (FixedPoint, FixedPoint) {
        (
            self.corner_x + self.step.wrapping_mul_int(i64::from(pixel_x)),
            self.corner_y + self.step.wrapping_mul_int(i64::from(pixel_y)),
        )
    }
}

/// The view a malformed command falls back to: a single pixel at the origin, a small cap
/// and a one-LSB step.
impl Default for ViewCommand {
    fn default() -> Self {
        Self {
            pixels_x: 1,
            pixels_y: 1,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            corner_x: FixedPoint::ZERO,
            corner_y: FixedPoint::ZERO,
            step: FixedPoint::LSB,
        }
    }
}
