use bevy::prelude::*;

use crate::error::GlobeError;
use crate::render::atlas::{BYTES_PER_PIXEL, TextureAtlas};

/// The globe's atlas together with the image asset the renderer samples.
///
/// Every write goes to the CPU copy first and is then mirrored into the
/// image, which marks the asset changed so it is uploaded again.
#[derive(Resource)]
pub struct AtlasTexture {
    atlas: TextureAtlas,
    handle: Handle<Image>,
}

impl AtlasTexture {
    pub fn new(atlas: TextureAtlas, images: &mut Assets<Image>) -> Self {
        let handle = images.add(atlas.to_image());
        Self { atlas, handle }
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn handle(&self) -> &Handle<Image> {
        &self.handle
    }

    pub fn update_region(
        &mut self,
        images: &mut Assets<Image>,
        pixel_data: &[u8],
        x_offset: u32,
        y_offset: u32,
        region_width: u32,
        region_height: u32,
    ) -> Result<(), GlobeError> {
        self.atlas
            .update_region(pixel_data, x_offset, y_offset, region_width, region_height)?;
        self.upload(images, x_offset, y_offset, region_width, region_height);
        Ok(())
    }

    pub fn fill_solid_color(
        &mut self,
        images: &mut Assets<Image>,
        x_offset: u32,
        y_offset: u32,
        region_width: u32,
        region_height: u32,
        rgba: [u8; 4],
    ) -> Result<(), GlobeError> {
        self.atlas
            .fill_solid_color(x_offset, y_offset, region_width, region_height, rgba)?;
        self.upload(images, x_offset, y_offset, region_width, region_height);
        Ok(())
    }

    /// Drop the image asset. Consumes self so it can only happen once.
    pub fn release(self, images: &mut Assets<Image>) {
        images.remove(&self.handle);
    }

    // copy the rows of a region that already passed the bounds check
    fn upload(&self, images: &mut Assets<Image>, x: u32, y: u32, width: u32, height: u32) {
        let Some(image) = images.get_mut(&self.handle) else {
            warn!("atlas image asset is gone, skipping upload");
            return;
        };
        let Some(data) = image.data.as_mut() else {
            return;
        };
        let pixels = self.atlas.pixels();
        if data.len() != pixels.len() {
            warn!(
                "atlas image holds {} bytes but atlas has {}, skipping upload",
                data.len(),
                pixels.len()
            );
            return;
        }

        let row_len = width as usize * BYTES_PER_PIXEL;
        for row in y..y + height {
            let start = self.atlas.offset(x, row);
            data[start..start + row_len].copy_from_slice(&pixels[start..start + row_len]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_pixel(images: &Assets<Image>, texture: &AtlasTexture, x: u32, y: u32) -> [u8; 4] {
        let data = images
            .get(texture.handle())
            .and_then(|image| image.data.as_ref())
            .unwrap();
        let start = texture.atlas().offset(x, y);
        [data[start], data[start + 1], data[start + 2], data[start + 3]]
    }

    #[test]
    fn writes_reach_the_image_asset() {
        let mut images = Assets::<Image>::default();
        let mut texture = AtlasTexture::new(TextureAtlas::new(16, 16).unwrap(), &mut images);

        texture
            .fill_solid_color(&mut images, 4, 4, 2, 2, [255, 0, 0, 255])
            .unwrap();

        assert_eq!(image_pixel(&images, &texture, 4, 4), [255, 0, 0, 255]);
        assert_eq!(image_pixel(&images, &texture, 5, 5), [255, 0, 0, 255]);
        assert_eq!(image_pixel(&images, &texture, 6, 4), [0, 0, 0, 0]);
        assert_eq!(texture.atlas().pixel(5, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn rejected_write_touches_neither_copy() {
        let mut images = Assets::<Image>::default();
        let mut texture = AtlasTexture::new(TextureAtlas::new(8, 8).unwrap(), &mut images);

        let err = texture
            .update_region(&mut images, &[1; 4 * 4 * 4], 6, 6, 4, 4)
            .unwrap_err();
        assert!(matches!(err, GlobeError::OutOfBounds { .. }));
        assert_eq!(image_pixel(&images, &texture, 6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn release_removes_the_asset() {
        let mut images = Assets::<Image>::default();
        let texture = AtlasTexture::new(TextureAtlas::new(4, 4).unwrap(), &mut images);
        let handle = texture.handle().clone();

        texture.release(&mut images);
        assert!(images.get(&handle).is_none());
    }
}
