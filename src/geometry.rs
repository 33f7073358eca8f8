use egui::{Pos2, Rect, Vec2};

/// A position in surface pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Maps screen-space pointer positions into surface pixel space.
///
/// The widget is laid out at `rendered` logical points while the surface's
/// backing buffer may have a different pixel resolution (size override,
/// pixel-ratio scaling). Every pointer handler converts through here and
/// nowhere else, so the two spaces can never drift apart per call site.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceGeometry {
    /// Top-left corner of the widget in screen space.
    pub origin: Pos2,
    /// On-screen size of the widget in logical points.
    pub rendered: Vec2,
    /// Backing pixel-buffer size.
    pub backing: Vec2,
}

impl SurfaceGeometry {
    pub fn new(widget_rect: Rect, backing: Vec2) -> Self {
        Self {
            origin: widget_rect.min,
            rendered: widget_rect.size(),
            backing,
        }
    }

    /// `surface = (screen - origin) * (backing / rendered)`, per axis.
    pub fn to_surface_space(&self, screen: Pos2) -> Point {
        let sx = if self.rendered.x > 0.0 {
            self.backing.x / self.rendered.x
        } else {
            1.0
        };
        let sy = if self.rendered.y > 0.0 {
            self.backing.y / self.rendered.y
        } else {
            1.0
        };
        Point::new((screen.x - self.origin.x) * sx, (screen.y - self.origin.y) * sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_surface_space_identity() {
        let geom = SurfaceGeometry::new(
            Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(100.0, 50.0)),
            Vec2::new(100.0, 50.0),
        );
        let p = geom.to_surface_space(Pos2::new(40.0, 30.0));
        assert_eq!(p, Point::new(40.0, 30.0));
    }

    #[test]
    fn test_to_surface_space_applies_origin_offset() {
        let geom = SurfaceGeometry::new(
            Rect::from_min_size(Pos2::new(20.0, 10.0), Vec2::new(100.0, 50.0)),
            Vec2::new(100.0, 50.0),
        );
        let p = geom.to_surface_space(Pos2::new(20.0, 10.0));
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_to_surface_space_scales_to_backing_resolution() {
        // Widget rendered at 100x50 points over a 200x100 backing buffer:
        // every screen point maps to two surface pixels.
        let geom = SurfaceGeometry::new(
            Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(100.0, 50.0)),
            Vec2::new(200.0, 100.0),
        );
        let p = geom.to_surface_space(Pos2::new(60.0, 35.0));
        assert_eq!(p, Point::new(100.0, 50.0));
    }

    #[test]
    fn test_to_surface_space_non_uniform_scale() {
        let geom = SurfaceGeometry::new(
            Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0)),
            Vec2::new(400.0, 100.0),
        );
        let p = geom.to_surface_space(Pos2::new(25.0, 25.0));
        assert_eq!(p, Point::new(100.0, 25.0));
    }

    #[test]
    fn test_to_surface_space_zero_rendered_size_does_not_divide() {
        let geom = SurfaceGeometry::new(
            Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            Vec2::new(100.0, 100.0),
        );
        let p = geom.to_surface_space(Pos2::new(5.0, 5.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
