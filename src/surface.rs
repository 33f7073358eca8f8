use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use eframe::egui;
use egui::{Color32, ColorImage, CursorIcon, ImageData, Rect, TextureFilter, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;
use image::codecs::png::PngEncoder;
use rayon::prelude::*;

/// The 2D raster target everything is painted onto.
///
/// Owns the backing pixel buffer plus the egui texture mirroring it. The
/// buffer is resized only by [`Surface::prepare`]; all drawing goes through
/// `clear` / `blit` / `fill_rect`, and the texture is re-uploaded lazily on
/// the next [`Surface::update_texture`] after any of them ran.
pub struct Surface {
    backing: RgbaImage,
    /// On-screen widget size in logical points.
    rendered: Vec2,
    pixel_ratio: f32,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    /// Cursor shown when no zone is under the pointer.
    pub default_cursor: CursorIcon,
}

impl Surface {
    /// Configure a surface for a target display size.
    ///
    /// The backing buffer is allocated at `target × pixel_ratio` so hosts on
    /// high-density displays can opt into a sharper composite (ratio is an
    /// explicit option, default 1.0). Display scaling uses linear filtering,
    /// the raster equivalent of high-quality smoothing.
    pub fn prepare(target_w: u32, target_h: u32, pixel_ratio: f32) -> Self {
        let ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        let backing_w = ((target_w as f32 * ratio).round() as u32).max(1);
        let backing_h = ((target_h as f32 * ratio).round() as u32).max(1);
        Self {
            backing: RgbaImage::new(backing_w, backing_h),
            rendered: Vec2::new(target_w.max(1) as f32, target_h.max(1) as f32),
            pixel_ratio: ratio,
            texture: None,
            texture_dirty: true,
            default_cursor: CursorIcon::Crosshair,
        }
    }

    pub fn width(&self) -> u32 {
        self.backing.width()
    }

    pub fn height(&self) -> u32 {
        self.backing.height()
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Logical widget size the surface was prepared for.
    pub fn rendered_size(&self) -> Vec2 {
        self.rendered
    }

    pub fn backing_size(&self) -> Vec2 {
        Vec2::new(self.backing.width() as f32, self.backing.height() as f32)
    }

    /// Read access to the composited pixels (e.g. for clipboard hand-off).
    pub fn pixels(&self) -> &RgbaImage {
        &self.backing
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        let raw: &mut [u8] = &mut self.backing;
        raw.fill(0);
        self.texture_dirty = true;
    }

    /// Copy `src` onto the backing buffer with its top-left corner at
    /// `(dest_x, dest_y)`, clipping to the surface bounds. Rows are copied in
    /// parallel; a cover-fit blit touches every row of the surface.
    pub fn blit(&mut self, src: &RgbaImage, dest_x: i32, dest_y: i32) {
        let bw = self.backing.width() as i32;
        let bh = self.backing.height() as i32;
        let x0 = dest_x.max(0);
        let y0 = dest_y.max(0);
        let x1 = (dest_x + src.width() as i32).min(bw);
        let y1 = (dest_y + src.height() as i32).min(bh);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let row_bytes = bw as usize * 4;
        let src_w = src.width() as usize;
        let src_raw = src.as_raw();
        let copy_bytes = (x1 - x0) as usize * 4;
        let src_x0 = (x0 - dest_x) as usize;

        let raw: &mut [u8] = &mut self.backing;
        raw.par_chunks_mut(row_bytes)
            .enumerate()
            .skip(y0 as usize)
            .take((y1 - y0) as usize)
            .for_each(|(y, row)| {
                let src_y = (y as i32 - dest_y) as usize;
                let src_start = (src_y * src_w + src_x0) * 4;
                let dst_start = x0 as usize * 4;
                row[dst_start..dst_start + copy_bytes]
                    .copy_from_slice(&src_raw[src_start..src_start + copy_bytes]);
            });
        self.texture_dirty = true;
    }

    /// Fill a rectangle with `color`, clipped to the surface bounds.
    /// Semi-transparent colors blend source-over; opaque colors overwrite.
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let bw = self.backing.width() as i32;
        let bh = self.backing.height() as i32;
        let x0 = (rect.min.x.floor() as i32).max(0);
        let y0 = (rect.min.y.floor() as i32).max(0);
        let x1 = (rect.max.x.ceil() as i32).min(bw);
        let y1 = (rect.max.y.ceil() as i32).min(bh);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let row_bytes = bw as usize * 4;
        let raw: &mut [u8] = &mut self.backing;
        let alpha = color[3] as u32;
        for y in y0..y1 {
            let start = y as usize * row_bytes + x0 as usize * 4;
            let end = y as usize * row_bytes + x1 as usize * 4;
            for px in raw[start..end].chunks_exact_mut(4) {
                if alpha == 255 {
                    px.copy_from_slice(&color);
                } else {
                    let inv = 255 - alpha;
                    for c in 0..3 {
                        px[c] = ((color[c] as u32 * alpha + px[c] as u32 * inv) / 255) as u8;
                    }
                    px[3] = (alpha + px[3] as u32 * inv / 255).min(255) as u8;
                }
            }
        }
        self.texture_dirty = true;
    }

    /// Upload the backing buffer to the GPU if it changed since last frame.
    pub fn update_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty && self.texture.is_some() {
            return;
        }
        let color_image = rgba_image_to_color_image(&self.backing);
        let image_data = ImageData::Color(Arc::new(color_image));
        let texture_options = TextureOptions {
            magnification: TextureFilter::Linear,
            minification: TextureFilter::Linear,
            ..Default::default()
        };
        if let Some(ref mut tex) = self.texture {
            tex.set(image_data, texture_options);
        } else {
            self.texture = Some(ctx.load_texture("redact_surface", image_data, texture_options));
        }
        self.texture_dirty = false;
    }

    /// Draw the current texture into `rect`.
    pub fn paint(&self, painter: &egui::Painter, rect: Rect) {
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(egui::Pos2::ZERO, egui::Pos2::new(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }
    }

    /// Encode the current surface contents as a PNG byte blob.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes: Vec<u8> = Vec::new();
        let encoder = PngEncoder::new(&mut bytes);
        #[allow(deprecated)]
        encoder.encode(
            self.backing.as_raw(),
            self.backing.width(),
            self.backing.height(),
            image::ColorType::Rgba8,
        )?;
        Ok(bytes)
    }

    /// Encode the current surface contents as a `data:image/png;base64,` URI.
    /// PNG is lossless, so this is already maximum quality.
    pub fn to_data_uri(&self) -> Result<String, image::ImageError> {
        let bytes = self.to_png_bytes()?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(&bytes)))
    }
}

/// Converts an RgbaImage to egui's ColorImage format for texture upload.
fn rgba_image_to_color_image(img: &RgbaImage) -> ColorImage {
    let size = [img.width() as usize, img.height() as usize];
    let pixels: Vec<Color32> = img
        .as_raw()
        .chunks_exact(4)
        .map(|chunk| Color32::from_rgba_unmultiplied(chunk[0], chunk[1], chunk[2], chunk[3]))
        .collect();
    ColorImage { size, pixels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    #[test]
    fn test_prepare_allocates_backing_at_target_size() {
        let s = Surface::prepare(320, 200, 1.0);
        assert_eq!((s.width(), s.height()), (320, 200));
        assert_eq!(s.rendered_size(), Vec2::new(320.0, 200.0));
    }

    #[test]
    fn test_prepare_scales_backing_by_pixel_ratio() {
        let s = Surface::prepare(320, 200, 2.0);
        assert_eq!((s.width(), s.height()), (640, 400));
        // Rendered size stays at the logical target
        assert_eq!(s.rendered_size(), Vec2::new(320.0, 200.0));
    }

    #[test]
    fn test_prepare_rejects_degenerate_ratio() {
        let s = Surface::prepare(100, 100, 0.0);
        assert_eq!((s.width(), s.height()), (100, 100));
    }

    #[test]
    fn test_fill_rect_writes_color() {
        let mut s = Surface::prepare(10, 10, 1.0);
        s.fill_rect(
            Rect::from_min_max(Pos2::new(2.0, 2.0), Pos2::new(5.0, 5.0)),
            [255, 0, 0, 255],
        );
        assert_eq!(s.pixels().get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(s.pixels().get_pixel(6, 6).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_fill_rect_clamps_to_bounds() {
        let mut s = Surface::prepare(8, 8, 1.0);
        s.fill_rect(
            Rect::from_min_max(Pos2::new(-10.0, -10.0), Pos2::new(100.0, 100.0)),
            [0, 255, 0, 255],
        );
        assert_eq!(s.pixels().get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(s.pixels().get_pixel(7, 7).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_blit_clips_negative_offset() {
        let mut s = Surface::prepare(4, 4, 1.0);
        let src = RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 255]));
        s.blit(&src, -2, -2);
        assert_eq!(s.pixels().get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(s.pixels().get_pixel(1, 1).0, [9, 9, 9, 255]);
        assert_eq!(s.pixels().get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_clear_resets_pixels() {
        let mut s = Surface::prepare(4, 4, 1.0);
        s.fill_rect(Rect::from_min_max(Pos2::ZERO, Pos2::new(4.0, 4.0)), [1, 2, 3, 255]);
        s.clear();
        assert_eq!(s.pixels().get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_png_bytes_decode_back_to_surface_dims() {
        let mut s = Surface::prepare(12, 7, 1.0);
        s.fill_rect(Rect::from_min_max(Pos2::ZERO, Pos2::new(12.0, 7.0)), [255, 0, 0, 255]);
        let bytes = s.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
        assert_eq!(decoded.get_pixel(5, 5).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_data_uri_prefix_and_idempotence() {
        let s = Surface::prepare(3, 3, 1.0);
        let a = s.to_data_uri().unwrap();
        let b = s.to_data_uri().unwrap();
        assert!(a.starts_with("data:image/png;base64,"));
        assert_eq!(a, b);
    }
}
