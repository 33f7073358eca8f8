use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Point;

/// Plain rectangle descriptor, used for seeding an editor with pre-existing
/// zones and for zone-update notifications. Coordinates are in surface pixel
/// space. Width/height are signed: a zone dragged right-to-left or
/// bottom-to-top keeps its negative extent and is normalized on use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ZoneRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A committed redaction zone: a `ZoneRect` plus a stable identity.
///
/// The id is assigned once at construction and never changes; moves mutate
/// `x`/`y` in place. The stored sign of `width`/`height` is also never
/// rewritten — geometry operations normalize on the fly instead.
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Zone {
    pub fn new(rect: ZoneRect) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    /// The descriptor form handed to zone-update listeners.
    pub fn rect(&self) -> ZoneRect {
        ZoneRect::new(self.x, self.y, self.width, self.height)
    }

    /// Min/max-normalized bounds, tolerant of negative extents.
    pub fn normalized(&self) -> Rect {
        let (x0, x1) = (self.x.min(self.x + self.width), self.x.max(self.x + self.width));
        let (y0, y1) = (self.y.min(self.y + self.height), self.y.max(self.y + self.height));
        Rect::from_min_max(Pos2::new(x0, y0), Pos2::new(x1, y1))
    }

    /// Strict point-in-rectangle test. Points exactly on an edge are NOT
    /// inside, so zones can never be hit through a shared border.
    pub fn is_inside(&self, point: Point) -> bool {
        let bounds = self.normalized();
        point.x > bounds.min.x
            && point.x < bounds.max.x
            && point.y > bounds.min.y
            && point.y < bounds.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(x: f32, y: f32, w: f32, h: f32) -> Zone {
        Zone::new(ZoneRect::new(x, y, w, h))
    }

    #[test]
    fn test_is_inside_interior_point() {
        let z = zone(10.0, 10.0, 20.0, 20.0);
        assert!(z.is_inside(Point::new(15.0, 15.0)));
        assert!(z.is_inside(Point::new(29.9, 29.9)));
    }

    #[test]
    fn test_is_inside_boundary_is_excluded() {
        let z = zone(10.0, 10.0, 20.0, 20.0);
        // All four edges and corners sit outside under strict comparison
        assert!(!z.is_inside(Point::new(10.0, 15.0)));
        assert!(!z.is_inside(Point::new(30.0, 15.0)));
        assert!(!z.is_inside(Point::new(15.0, 10.0)));
        assert!(!z.is_inside(Point::new(15.0, 30.0)));
        assert!(!z.is_inside(Point::new(10.0, 10.0)));
        assert!(!z.is_inside(Point::new(30.0, 30.0)));
    }

    #[test]
    fn test_is_inside_outside_point() {
        let z = zone(10.0, 10.0, 20.0, 20.0);
        assert!(!z.is_inside(Point::new(0.0, 0.0)));
        assert!(!z.is_inside(Point::new(50.0, 15.0)));
    }

    #[test]
    fn test_is_inside_invariant_under_extent_sign() {
        // {x:10, y:10, w:-5, h:-5} covers the same region as {x:5, y:5, w:5, h:5}
        let backwards = zone(10.0, 10.0, -5.0, -5.0);
        let forwards = zone(5.0, 5.0, 5.0, 5.0);
        for p in [
            Point::new(7.5, 7.5),
            Point::new(5.0, 7.5),
            Point::new(10.0, 10.0),
            Point::new(6.0, 9.0),
            Point::new(4.9, 7.5),
            Point::new(10.1, 7.5),
        ] {
            assert_eq!(backwards.is_inside(p), forwards.is_inside(p), "point {:?}", p);
        }
    }

    #[test]
    fn test_zero_extent_zone_contains_nothing() {
        let z = zone(10.0, 10.0, 0.0, 0.0);
        assert!(!z.is_inside(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = zone(0.0, 0.0, 1.0, 1.0);
        let b = zone(0.0, 0.0, 1.0, 1.0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_normalized_flips_negative_extents() {
        let z = zone(10.0, 10.0, -5.0, -8.0);
        let r = z.normalized();
        assert_eq!(r.min, Pos2::new(5.0, 2.0));
        assert_eq!(r.max, Pos2::new(10.0, 10.0));
    }

    #[test]
    fn test_rect_roundtrip_preserves_sign() {
        let z = zone(10.0, 10.0, -5.0, 8.0);
        let r = z.rect();
        assert_eq!(r.width, -5.0);
        assert_eq!(r.height, 8.0);
    }
}
