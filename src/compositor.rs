use egui::{Pos2, Rect};
use image::RgbaImage;
use image::imageops::FilterType;

use crate::surface::Surface;
use crate::zone::Zone;

/// How the source image is scaled to a surface of different aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ObjectFit {
    /// Largest aspect-preserving size that fits inside the surface,
    /// centered, letterboxed on one axis when ratios differ.
    #[default]
    Contain,
    /// Smallest aspect-preserving size that covers the surface, centered,
    /// cropped on one axis when ratios differ.
    Cover,
}

impl ObjectFit {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectFit::Contain => "contain",
            ObjectFit::Cover => "cover",
        }
    }

    pub fn all() -> &'static [ObjectFit] {
        &[ObjectFit::Contain, ObjectFit::Cover]
    }
}

/// Compute the image's draw rectangle within the surface for a fit policy.
/// For `Cover` the rectangle may extend beyond the surface bounds; the blit
/// clips. Edges are rounded to whole pixels to avoid sub-pixel seams.
pub fn fit_rect(image_w: u32, image_h: u32, surface_w: u32, surface_h: u32, fit: ObjectFit) -> Rect {
    let (w, h) = (surface_w as f32, surface_h as f32);
    let surface_ratio = w / h.max(1.0);
    let image_ratio = image_w as f32 / (image_h as f32).max(1.0);

    let image_wider = image_ratio > surface_ratio;
    let fill_width = match fit {
        ObjectFit::Contain => image_wider,
        ObjectFit::Cover => !image_wider,
    };
    let (draw_w, draw_h) = if fill_width {
        (w, w / image_ratio)
    } else {
        (h * image_ratio, h)
    };

    let dx = ((w - draw_w) / 2.0).round();
    let dy = ((h - draw_h) / 2.0).round();
    Rect::from_min_size(
        Pos2::new(dx, dy),
        egui::Vec2::new(draw_w.round().max(1.0), draw_h.round().max(1.0)),
    )
}

/// A fit-scaled copy of the source image, reused until the source or the
/// surface changes. Rescaling is the expensive step of a repaint; zones and
/// previews change far more often than either input.
struct ScaledImage {
    image: RgbaImage,
    dest: Rect,
    source_dims: (u32, u32),
    surface_dims: (u32, u32),
    fit: ObjectFit,
}

/// Single source of truth for surface contents.
///
/// Every state-changing operation in the editor ends by calling
/// [`Compositor::redraw`]: the surface is always a full repaint of
/// `{image, zones, preview}`, never an incremental patch, so it can never
/// drift from the zone collection.
pub struct Compositor {
    object_fit: ObjectFit,
    zone_color: [u8; 4],
    scaled: Option<ScaledImage>,
}

impl Compositor {
    pub fn new(object_fit: ObjectFit, zone_color: [u8; 4]) -> Self {
        Self {
            object_fit,
            zone_color,
            scaled: None,
        }
    }

    pub fn object_fit(&self) -> ObjectFit {
        self.object_fit
    }

    pub fn zone_color(&self) -> [u8; 4] {
        self.zone_color
    }

    pub fn set_object_fit(&mut self, fit: ObjectFit) {
        if self.object_fit != fit {
            self.object_fit = fit;
            self.scaled = None;
        }
    }

    pub fn set_zone_color(&mut self, color: [u8; 4]) {
        self.zone_color = color;
    }

    /// Drop the scaled-image cache (call when the image source is replaced).
    pub fn invalidate(&mut self) {
        self.scaled = None;
    }

    /// Clear the surface, repaint the image under the fit policy, then every
    /// committed zone in z-order, then the live draw preview if one exists.
    pub fn redraw(
        &mut self,
        surface: &mut Surface,
        image: &RgbaImage,
        zones: &[Zone],
        preview: Option<Rect>,
    ) {
        self.ensure_scaled(image, surface.width(), surface.height());

        surface.clear();
        if let Some(ref scaled) = self.scaled {
            surface.blit(&scaled.image, scaled.dest.min.x as i32, scaled.dest.min.y as i32);
        }
        for zone in zones {
            surface.fill_rect(zone.normalized(), self.zone_color);
        }
        if let Some(rect) = preview {
            surface.fill_rect(rect, self.zone_color);
        }
    }

    fn ensure_scaled(&mut self, image: &RgbaImage, surface_w: u32, surface_h: u32) {
        let source_dims = (image.width(), image.height());
        let surface_dims = (surface_w, surface_h);
        let valid = self.scaled.as_ref().is_some_and(|s| {
            s.source_dims == source_dims && s.surface_dims == surface_dims && s.fit == self.object_fit
        });
        if valid {
            return;
        }

        let dest = fit_rect(source_dims.0, source_dims.1, surface_w, surface_h, self.object_fit);
        let scaled = if dest.width() as u32 == source_dims.0 && dest.height() as u32 == source_dims.1 {
            image.clone()
        } else {
            image::imageops::resize(
                image,
                (dest.width() as u32).max(1),
                (dest.height() as u32).max(1),
                FilterType::Lanczos3,
            )
        };
        self.scaled = Some(ScaledImage {
            image: scaled,
            dest,
            source_dims,
            surface_dims,
            fit: self.object_fit,
        });
    }
}
