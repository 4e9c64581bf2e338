// vizboard_core/src/mapping/raster.rs

use super::occupancy_intensity;
use crate::error::CoreError;
use crate::frames::{project_pose, FrameResolver, Projector};
use crate::messages::{MapMetaData, OccupancyGrid};
use crate::render::{in_local_frame, BitmapId, Canvas};
use crate::types::FrameId;
use tracing::trace;

/// An opaque RGBA image, one pixel per grid cell, row-major from cell (0,0).
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyBitmap {
    pub id: BitmapId,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl OccupancyBitmap {
    /// Converts every cell of `grid`. Fails when the cell count disagrees
    /// with the declared dimensions.
    pub fn from_grid(id: BitmapId, grid: &OccupancyGrid) -> Result<Self, CoreError> {
        let (width, height) = (grid.info.width, grid.info.height);
        let expected = width as usize * height as usize;
        if grid.data.len() != expected {
            return Err(CoreError::GridSizeMismatch {
                width,
                height,
                cells: grid.data.len(),
            });
        }

        let mut rgba = Vec::with_capacity(expected * 4);
        for &cell in &grid.data {
            let grey = occupancy_intensity(cell);
            rgba.extend_from_slice(&[grey, grey, grey, 255]);
        }
        Ok(Self {
            id,
            width,
            height,
            rgba,
        })
    }

    /// Intensity of cell (`col`, `row`).
    pub fn intensity_at(&self, col: u32, row: u32) -> Option<u8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let i = (row as usize * self.width as usize + col as usize) * 4;
        self.rgba.get(i).copied()
    }
}

/// A converted grid plus the metadata needed to place it at draw time.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRaster {
    pub bitmap: OccupancyBitmap,
    pub frame_id: FrameId,
    pub info: MapMetaData,
}

/// Holds the bitmap of the most recently accepted grid.
///
/// Conversion happens once per accepted message. Placement is resolved on
/// every render against the current frame tree, so a static bitmap still
/// follows a moving frame.
#[derive(Debug, Default)]
pub struct RasterCache {
    next_id: u64,
    current: Option<CachedRaster>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts and caches `grid`. On error the previous raster is kept.
    pub fn accept(&mut self, grid: &OccupancyGrid) -> Result<&CachedRaster, CoreError> {
        let bitmap = OccupancyBitmap::from_grid(BitmapId(self.next_id), grid)?;
        self.next_id += 1;
        Ok(&*self.current.insert(CachedRaster {
            bitmap,
            frame_id: grid.header.frame_id.clone(),
            info: grid.info.clone(),
        }))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn raster(&self) -> Option<&CachedRaster> {
        self.current.as_ref()
    }

    /// Blits the cached raster at its origin pose with the given opacity.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        tf: &dyn FrameResolver,
        view: &dyn Projector,
        opacity: f64,
    ) {
        canvas.clear();
        canvas.set_image_smoothing(false);

        let Some(raster) = &self.current else {
            return;
        };
        let Some(origin) = project_pose(tf, view, &raster.frame_id, &raster.info.origin) else {
            trace!(frame = %raster.frame_id, "Map frame unresolved; skipping");
            return;
        };

        let res = raster.info.resolution;
        let w = view.units_in_pixels(f64::from(raster.bitmap.width) * res);
        let h = view.units_in_pixels(f64::from(raster.bitmap.height) * res);
        let id = raster.bitmap.id;

        canvas.save();
        canvas.set_global_alpha(opacity.clamp(0.0, 1.0));
        in_local_frame(canvas, origin.position, Some(origin.heading), |c| {
            c.draw_bitmap(id, 0.0, 0.0, w, h)
        });
        canvas.restore();
    }
}
