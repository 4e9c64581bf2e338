// vizboard_core/src/mapping/mod.rs

//! Occupancy grids turned into cached greyscale bitmaps.

mod raster;

pub use raster::{CachedRaster, OccupancyBitmap, RasterCache};

/// Occupancy assumed for cells whose value is unknown (negative).
pub const UNKNOWN_OCCUPANCY: i8 = 50;

/// Greyscale intensity for one occupancy cell: free is white, occupied is
/// black, unknown is drawn as `UNKNOWN_OCCUPANCY`. Values above 100 carry no
/// probability and are drawn white.
pub fn occupancy_intensity(value: i8) -> u8 {
    let v = if value < 0 { UNKNOWN_OCCUPANCY } else { value };
    if v > 100 {
        return 255;
    }
    // 255 - round(v * 2.55), rounding half up in integer arithmetic.
    let darkness = (i32::from(v) * 255 + 50) / 100;
    (255 - darkness) as u8
}
