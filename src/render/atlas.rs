use std::path::Path;

use bevy::image::Image;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::error::GlobeError;

pub const BYTES_PER_PIXEL: usize = 4;

/// A fixed size RGBA8 pixel buffer that smaller images get stitched into.
///
/// Rows are stored top to bottom. A fresh atlas is all zero bytes
/// (transparent black) so nothing undefined is ever sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureAtlas {
    pub fn new(width: u32, height: u32) -> Result<Self, GlobeError> {
        if width == 0 || height == 0 {
            return Err(GlobeError::InvalidParameter(format!(
                "atlas dimensions must be non-zero, got {width}x{height}"
            )));
        }

        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        })
    }

    /// Atlas sized to and filled with an encoded image.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, GlobeError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_rgba(image)
    }

    pub fn from_image_file(path: &Path) -> Result<Self, GlobeError> {
        let image = image::open(path)?.to_rgba8();
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded atlas image"
        );
        Self::from_rgba(image)
    }

    fn from_rgba(image: image::RgbaImage) -> Result<Self, GlobeError> {
        let (width, height) = image.dimensions();
        let mut atlas = Self::new(width, height)?;
        atlas.pixels = image.into_raw();
        Ok(atlas)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Overwrite a `region_width` x `region_height` rectangle at
    /// (`x_offset`, `y_offset`) with row-major RGBA `pixel_data`.
    ///
    /// The atlas is left untouched when the buffer size is wrong or the
    /// region does not fit.
    pub fn update_region(
        &mut self,
        pixel_data: &[u8],
        x_offset: u32,
        y_offset: u32,
        region_width: u32,
        region_height: u32,
    ) -> Result<(), GlobeError> {
        self.check_bounds(x_offset, y_offset, region_width, region_height)?;

        let expected = region_width as usize * region_height as usize * BYTES_PER_PIXEL;
        if pixel_data.len() != expected {
            return Err(GlobeError::PixelDataLength {
                expected,
                actual: pixel_data.len(),
            });
        }

        let row_len = region_width as usize * BYTES_PER_PIXEL;
        if row_len == 0 {
            return Ok(());
        }
        for (row, src) in pixel_data.chunks_exact(row_len).enumerate() {
            let start = self.offset(x_offset, y_offset + row as u32);
            self.pixels[start..start + row_len].copy_from_slice(src);
        }

        Ok(())
    }

    /// Paint a rectangle with a single color.
    pub fn fill_solid_color(
        &mut self,
        x_offset: u32,
        y_offset: u32,
        region_width: u32,
        region_height: u32,
        rgba: [u8; 4],
    ) -> Result<(), GlobeError> {
        self.check_bounds(x_offset, y_offset, region_width, region_height)?;

        let pixel_data = rgba.repeat(region_width as usize * region_height as usize);
        self.update_region(&pixel_data, x_offset, y_offset, region_width, region_height)
    }

    /// Copy a rectangle out of the atlas.
    pub fn region(
        &self,
        x_offset: u32,
        y_offset: u32,
        region_width: u32,
        region_height: u32,
    ) -> Result<Vec<u8>, GlobeError> {
        self.check_bounds(x_offset, y_offset, region_width, region_height)?;

        let row_len = region_width as usize * BYTES_PER_PIXEL;
        let mut out = Vec::with_capacity(row_len * region_height as usize);
        for row in 0..region_height {
            let start = self.offset(x_offset, y_offset + row);
            out.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        Ok(out)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = self.offset(x, y);
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[start..start + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    /// Texture asset holding a copy of the current pixels.
    pub fn to_image(&self) -> Image {
        Image::new(
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.pixels.clone(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        )
    }

    /// Byte offset of pixel (x, y).
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    pub(crate) fn check_bounds(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<(), GlobeError> {
        // u64 so huge offsets cannot wrap around
        let fits_x = x as u64 + width as u64 <= self.width as u64;
        let fits_y = y as u64 + height as u64 <= self.height as u64;
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(GlobeError::OutOfBounds {
                x,
                y,
                width,
                height,
                atlas_width: self.width,
                atlas_height: self.height,
            })
        }
    }
}
