//! Named pixel grids the pipeline draws into.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::color::TRANSPARENT;

/// How a translucent fill combines with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Paint over everything.
    SourceOver,
    /// Paint only where the destination already has coverage, keeping its alpha.
    SourceAtop,
}

/// An owned RGBA8 pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Pixel at `(x, y)`, `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Change dimensions. Like a canvas resize, this discards the contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    pub fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = TRANSPARENT);
    }

    /// True when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Overwrite one pixel; out-of-range coordinates are ignored.
    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if let Some(p) = self.pixels.get_pixel_mut_checked(x, y) {
            *p = color;
        }
    }

    /// Overwrite the inclusive vertical span `y0..=y1` of column `x`.
    pub fn vertical_span(&mut self, x: u32, y0: u32, y1: u32, color: Rgba<u8>) {
        if x >= self.width() || self.height() == 0 {
            return;
        }
        let (top, bottom) = (y0.min(y1), y0.max(y1).min(self.height() - 1));
        for y in top..=bottom {
            self.pixels.put_pixel(x, y, color);
        }
    }

    /// Fill the rectangle `[x0, x1) x [y0, y1)` with `color` at `opacity`.
    ///
    /// Coordinates are clipped to the surface; an empty or inverted
    /// rectangle paints nothing.
    pub fn fill_rect(
        &mut self,
        (x0, y0): (i64, i64),
        (x1, y1): (i64, i64),
        color: Rgba<u8>,
        opacity: f32,
        mode: Composite,
    ) {
        let clip = |v: i64, max: u32| v.clamp(0, i64::from(max)) as u32;
        let (x0, x1) = (clip(x0, self.width()), clip(x1, self.width()));
        let (y0, y1) = (clip(y0, self.height()), clip(y1, self.height()));
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color, opacity, mode);
            }
        }
    }

    /// Composite `color` at `opacity` (times the colour's own alpha) onto one pixel.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>, opacity: f32, mode: Composite) {
        let Some(dst) = self.pixels.get_pixel_mut_checked(x, y) else {
            return;
        };
        let src_a = (opacity * f32::from(color[3]) / 255.0).clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }
        let dst_a = f32::from(dst[3]) / 255.0;

        let out_a = match mode {
            Composite::SourceOver => src_a + dst_a * (1.0 - src_a),
            Composite::SourceAtop if dst_a > 0.0 => dst_a,
            Composite::SourceAtop => return,
        };
        for c in 0..3 {
            let src = f32::from(color[c]);
            let dst_c = f32::from(dst[c]);
            let value = match mode {
                Composite::SourceOver => (src * src_a + dst_c * dst_a * (1.0 - src_a)) / out_a,
                Composite::SourceAtop => src * src_a + dst_c * (1.0 - src_a),
            };
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Draw `bitmap` unscaled at the origin, source-over.
    pub fn blit(&mut self, bitmap: &RgbaImage) {
        imageops::overlay(&mut self.pixels, bitmap, 0, 0);
    }

    /// Draw `bitmap` stretched to cover this whole surface, source-over.
    pub fn blit_scaled(&mut self, bitmap: &RgbaImage) {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 || bitmap.width() == 0 || bitmap.height() == 0 {
            return;
        }
        if bitmap.dimensions() == (width, height) {
            imageops::overlay(&mut self.pixels, bitmap, 0, 0);
        } else {
            let scaled = imageops::resize(bitmap, width, height, FilterType::Nearest);
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }

    /// Write the surface to a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.pixels.save_with_format(path, image::ImageFormat::Png)
    }
}
