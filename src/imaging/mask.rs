use image::{GrayImage, Luma};

/// Intensity written inside the masked region
pub const MASK_ON: u8 = 255;

/// Rectangle expressed as integer fractions of the image size
///
/// Bounds are half-open and computed with floor division, so for a
/// 1024×1024 image the default face box covers columns 256..768 and rows
/// 204..768.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRegion {
    /// (numerator, denominator) of the left edge
    pub left: (u32, u32),
    pub top: (u32, u32),
    pub right: (u32, u32),
    pub bottom: (u32, u32),
}

impl MaskRegion {
    /// Central box where a portrait's face usually sits
    pub const FACE: MaskRegion = MaskRegion {
        left: (1, 4),
        top: (1, 5),
        right: (3, 4),
        bottom: (3, 4),
    };

    /// Pixel bounds `(x0, y0, x1, y1)` for an image of the given size
    pub fn bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        (
            scale(width, self.left),
            scale(height, self.top),
            scale(width, self.right),
            scale(height, self.bottom),
        )
    }

    pub fn contains(&self, width: u32, height: u32, x: u32, y: u32) -> bool {
        let (x0, y0, x1, y1) = self.bounds(width, height);
        (x0..x1).contains(&x) && (y0..y1).contains(&y)
    }
}

fn scale(extent: u32, (numerator, denominator): (u32, u32)) -> u32 {
    (u64::from(extent) * u64::from(numerator) / u64::from(denominator)) as u32
}

/// Build a single-channel mask that is zero except for `region`
pub fn region_mask(width: u32, height: u32, region: MaskRegion) -> GrayImage {
    let (x0, y0, x1, y1) = region.bounds(width, height);
    GrayImage::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

/// Mask over the central face box used by mask-guided styles
pub fn face_mask(width: u32, height: u32) -> GrayImage {
    region_mask(width, height, MaskRegion::FACE)
}
