//! Window icon conversion
//!
//! Icons can be any pixel-addressable image. They are copied into dense RGBA
//! buffers off the main thread, then handed to the platform on the main
//! thread.

use image::{GenericImageView, Pixel, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::Arc;

/// A bounded, pixel-addressable image usable as a window icon
pub trait IconImage: Send + Sync {
    /// Width and height in pixels
    fn icon_size(&self) -> (u32, u32);

    /// RGBA value of the pixel at `(x, y)`
    fn icon_pixel(&self, x: u32, y: u32) -> [u8; 4];
}

impl<I> IconImage for I
where
    I: GenericImageView + Send + Sync,
    I::Pixel: Pixel<Subpixel = u8>,
{
    fn icon_size(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn icon_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.get_pixel(x, y).to_rgba().0
    }
}

/// Copy an icon into a dense RGBA buffer
pub fn to_rgba(icon: &dyn IconImage) -> RgbaImage {
    let (width, height) = icon.icon_size();
    RgbaImage::from_fn(width, height, |x, y| Rgba(icon.icon_pixel(x, y)))
}

/// Convert a whole icon set
pub fn convert_all(icons: &[Arc<dyn IconImage>]) -> Vec<RgbaImage> {
    icons.iter().map(|icon| to_rgba(icon.as_ref())).collect()
}

/// Icon set waiting to be applied by the next frame
#[derive(Default)]
pub struct PendingIcons {
    slot: Mutex<Option<Vec<Arc<dyn IconImage>>>>,
}

impl std::fmt::Debug for PendingIcons {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.slot.lock().as_ref().map(Vec::len);
        f.debug_struct("PendingIcons").field("pending", &pending).finish()
    }
}

impl PendingIcons {
    /// Replace the pending set
    pub fn set(&self, icons: Vec<Arc<dyn IconImage>>) {
        *self.slot.lock() = Some(icons);
    }

    /// Take the pending set, leaving nothing behind
    pub fn take(&self) -> Option<Vec<Arc<dyn IconImage>>> {
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    #[test]
    fn test_rgba_conversion_keeps_pixels() {
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(1, 0, Rgba([10, 20, 30, 40]));
        let converted = to_rgba(&source);
        assert_eq!(converted.dimensions(), (2, 2));
        assert_eq!(converted.get_pixel(1, 0), &Rgba([10, 20, 30, 40]));
        assert_eq!(converted.get_pixel(0, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_grayscale_becomes_opaque_rgba() {
        let gray = GrayImage::from_pixel(3, 1, Luma([200]));
        let converted = to_rgba(&gray);
        assert_eq!(converted.get_pixel(2, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_convert_all_handles_mixed_sources() {
        let icons: Vec<Arc<dyn IconImage>> = vec![
            Arc::new(DynamicImage::new_rgba8(16, 16)),
            Arc::new(GrayImage::new(32, 32)),
        ];
        let sizes: Vec<_> = convert_all(&icons).iter().map(RgbaImage::dimensions).collect();
        assert_eq!(sizes, vec![(16, 16), (32, 32)]);
    }

    #[test]
    fn test_pending_icons_take_once() {
        let pending = PendingIcons::default();
        assert!(pending.take().is_none());
        pending.set(vec![Arc::new(GrayImage::new(1, 1))]);
        assert_eq!(pending.take().map(|v| v.len()), Some(1));
        assert!(pending.take().is_none());
    }
}
