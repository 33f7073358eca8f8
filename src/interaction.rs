use egui::{Pos2, Rect};
use uuid::Uuid;

use crate::geometry::Point;
use crate::zone::{Zone, ZoneRect};

/// Gestures smaller than this on either axis are treated as a click and
/// discarded instead of committing an invisible, unhittable zone.
pub const MIN_COMMIT_EXTENT: f32 = 1.0;

/// The current pointer gesture. Exactly one at a time; every gesture ends
/// back in `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// A draw gesture anchored at the pointer-down position.
    Drawing { anchor: Point },
    /// A move gesture targeting the zone hit at pointer-down.
    Moving { zone_id: Uuid },
}

/// What a transition changed, from the caller's point of view.
///
/// Ordered by how much follow-up work the editor owes: `ZonesChanged`
/// requires a repaint and a listener notification, `Repaint` a repaint only,
/// `Preview` a repaint that includes the live preview rect. The derived
/// ordering lets several outcomes from one frame merge with `max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Quiet,
    Preview,
    Repaint,
    ZonesChanged,
}

/// Single owner of the gesture mode. All transitions are methods here; the
/// zone collection is only touched through the slice handed in per event.
#[derive(Debug, Default)]
pub struct InteractionState {
    mode: Mode,
}

/// Topmost-painted zone under the point, if any.
///
/// Zones are painted in insertion order, so when zones overlap the user is
/// looking at the most recently committed one — iterate in reverse so that
/// is also the one a click lands on.
pub fn hit_test(zones: &[Zone], point: Point) -> Option<&Zone> {
    zones.iter().rev().find(|zone| zone.is_inside(point))
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn gesture_active(&self) -> bool {
        self.mode != Mode::Idle
    }

    /// The live preview rect for an active draw gesture, spanning the anchor
    /// to the current pointer position. Never part of the committed
    /// collection.
    pub fn preview_rect(&self, current: Point) -> Option<Rect> {
        match self.mode {
            Mode::Drawing { anchor } => Some(Rect::from_two_pos(
                Pos2::new(anchor.x, anchor.y),
                Pos2::new(current.x, current.y),
            )),
            _ => None,
        }
    }

    /// Start a gesture: a hit begins a move, a miss begins a draw. Presses
    /// during an active gesture are ignored — one gesture at a time.
    pub fn pointer_down(&mut self, p: Point, zones: &[Zone]) -> Outcome {
        if self.mode != Mode::Idle {
            return Outcome::Quiet;
        }
        self.mode = match hit_test(zones, p) {
            Some(zone) => Mode::Moving { zone_id: zone.id },
            None => Mode::Drawing { anchor: p },
        };
        Outcome::Quiet
    }

    pub fn pointer_move(&mut self, p: Point, zones: &mut [Zone]) -> Outcome {
        match self.mode {
            Mode::Idle => Outcome::Quiet,
            Mode::Drawing { .. } => Outcome::Preview,
            Mode::Moving { zone_id } => {
                // The target may have been deleted out from under the
                // gesture; a stale id is silently ignored.
                match zones.iter_mut().find(|zone| zone.id == zone_id) {
                    Some(zone) => {
                        zone.x = p.x - zone.width / 2.0;
                        zone.y = p.y - zone.height / 2.0;
                        Outcome::ZonesChanged
                    }
                    None => Outcome::Quiet,
                }
            }
        }
    }

    pub fn pointer_up(&mut self, p: Point, zones: &mut Vec<Zone>) -> Outcome {
        self.finish_gesture(p, zones)
    }

    /// Leaving the surface ends the gesture exactly like a release at the
    /// same point.
    pub fn pointer_leave(&mut self, p: Point, zones: &mut Vec<Zone>) -> Outcome {
        self.finish_gesture(p, zones)
    }

    /// Delete the topmost zone under the point. With sub-pixel draw gestures
    /// discarded, the two click cycles preceding a double-click commit
    /// nothing, so this sees the collection as it was before the activation.
    pub fn double_click(&mut self, p: Point, zones: &mut Vec<Zone>) -> Outcome {
        match hit_test(zones, p).map(|zone| zone.id) {
            Some(id) => {
                zones.retain(|zone| zone.id != id);
                Outcome::ZonesChanged
            }
            None => Outcome::Quiet,
        }
    }

    fn finish_gesture(&mut self, p: Point, zones: &mut Vec<Zone>) -> Outcome {
        match std::mem::take(&mut self.mode) {
            Mode::Idle => Outcome::Quiet,
            Mode::Moving { .. } => Outcome::Quiet,
            Mode::Drawing { anchor } => {
                let rect = ZoneRect::new(anchor.x, anchor.y, p.x - anchor.x, p.y - anchor.y);
                if rect.width.abs() >= MIN_COMMIT_EXTENT && rect.height.abs() >= MIN_COMMIT_EXTENT {
                    zones.push(Zone::new(rect));
                    Outcome::ZonesChanged
                } else {
                    // A click, not a drag: nothing committed, but the
                    // preview (if any) must be repainted away.
                    Outcome::Repaint
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(rects: &[(f32, f32, f32, f32)]) -> Vec<Zone> {
        rects
            .iter()
            .map(|&(x, y, w, h)| Zone::new(ZoneRect::new(x, y, w, h)))
            .collect()
    }

    #[test]
    fn test_draw_gesture_commits_one_zone() {
        let mut state = InteractionState::new();
        let mut zones = Vec::new();

        assert_eq!(state.pointer_down(Point::new(10.0, 10.0), &zones), Outcome::Quiet);
        assert_eq!(state.pointer_move(Point::new(30.0, 20.0), &mut zones), Outcome::Preview);
        assert_eq!(
            state.pointer_up(Point::new(60.0, 40.0), &mut zones),
            Outcome::ZonesChanged
        );

        assert_eq!(zones.len(), 1);
        let z = &zones[0];
        assert_eq!((z.x, z.y, z.width, z.height), (10.0, 10.0, 50.0, 30.0));
        assert_eq!(state.mode(), Mode::Idle);
    }

    #[test]
    fn test_pointer_leave_commits_like_pointer_up() {
        let mut by_up = InteractionState::new();
        let mut by_leave = InteractionState::new();
        let mut zones_up = Vec::new();
        let mut zones_leave = Vec::new();

        by_up.pointer_down(Point::new(10.0, 10.0), &zones_up);
        by_up.pointer_up(Point::new(60.0, 40.0), &mut zones_up);

        by_leave.pointer_down(Point::new(10.0, 10.0), &zones_leave);
        by_leave.pointer_leave(Point::new(60.0, 40.0), &mut zones_leave);

        assert_eq!(zones_up.len(), 1);
        assert_eq!(zones_leave.len(), 1);
        assert_eq!(zones_up[0].rect(), zones_leave[0].rect());
        assert_eq!(by_leave.mode(), Mode::Idle);
    }

    #[test]
    fn test_sub_pixel_gesture_is_discarded() {
        let mut state = InteractionState::new();
        let mut zones = Vec::new();

        state.pointer_down(Point::new(10.0, 10.0), &zones);
        assert_eq!(state.pointer_up(Point::new(10.4, 10.4), &mut zones), Outcome::Repaint);
        assert!(zones.is_empty());
        assert_eq!(state.mode(), Mode::Idle);
    }

    #[test]
    fn test_right_to_left_drag_commits_negative_extents() {
        let mut state = InteractionState::new();
        let mut zones = Vec::new();

        state.pointer_down(Point::new(60.0, 40.0), &zones);
        state.pointer_up(Point::new(10.0, 10.0), &mut zones);

        assert_eq!(zones.len(), 1);
        let z = &zones[0];
        assert_eq!((z.x, z.y, z.width, z.height), (60.0, 40.0, -50.0, -30.0));
    }

    #[test]
    fn test_pointer_down_on_zone_starts_move() {
        let mut state = InteractionState::new();
        let zones = seeded(&[(10.0, 10.0, 20.0, 20.0)]);
        let id = zones[0].id;

        state.pointer_down(Point::new(15.0, 15.0), &zones);
        assert_eq!(state.mode(), Mode::Moving { zone_id: id });
    }

    #[test]
    fn test_move_gesture_centers_zone_on_pointer() {
        let mut state = InteractionState::new();
        let mut zones = seeded(&[(10.0, 10.0, 20.0, 20.0)]);
        let id = zones[0].id;

        state.pointer_down(Point::new(15.0, 15.0), &zones);
        assert_eq!(
            state.pointer_move(Point::new(100.0, 100.0), &mut zones),
            Outcome::ZonesChanged
        );
        state.pointer_up(Point::new(100.0, 100.0), &mut zones);

        let z = &zones[0];
        assert_eq!((z.x, z.y), (90.0, 90.0));
        assert_eq!((z.width, z.height), (20.0, 20.0));
        assert_eq!(z.id, id);
        assert_eq!(zones.len(), 1);
    }

    #[test]
    fn test_move_release_does_not_mutate() {
        let mut state = InteractionState::new();
        let mut zones = seeded(&[(10.0, 10.0, 20.0, 20.0)]);

        state.pointer_down(Point::new(15.0, 15.0), &zones);
        assert_eq!(state.pointer_up(Point::new(200.0, 200.0), &mut zones), Outcome::Quiet);
        assert_eq!((zones[0].x, zones[0].y), (10.0, 10.0));
    }

    #[test]
    fn test_stale_move_target_is_ignored() {
        let mut state = InteractionState::new();
        let mut zones = seeded(&[(10.0, 10.0, 20.0, 20.0)]);

        state.pointer_down(Point::new(15.0, 15.0), &zones);
        zones.clear(); // deleted out from under the gesture
        assert_eq!(state.pointer_move(Point::new(50.0, 50.0), &mut zones), Outcome::Quiet);
        assert!(zones.is_empty());
    }

    #[test]
    fn test_no_second_concurrent_gesture() {
        let mut state = InteractionState::new();
        let mut zones = seeded(&[(100.0, 100.0, 20.0, 20.0)]);

        state.pointer_down(Point::new(10.0, 10.0), &zones);
        let drawing = state.mode();
        // A second press, even over a zone, must not hijack the gesture
        state.pointer_down(Point::new(110.0, 110.0), &zones);
        assert_eq!(state.mode(), drawing);

        state.pointer_up(Point::new(40.0, 40.0), &mut zones);
        assert_eq!(zones.len(), 2);
    }

    #[test]
    fn test_double_click_deletes_exactly_the_hit_zone() {
        let mut state = InteractionState::new();
        let mut zones = seeded(&[(10.0, 10.0, 20.0, 20.0), (100.0, 100.0, 20.0, 20.0)]);
        let survivor = zones[1].id;

        assert_eq!(
            state.double_click(Point::new(15.0, 15.0), &mut zones),
            Outcome::ZonesChanged
        );
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, survivor);
    }

    #[test]
    fn test_double_click_on_empty_space_is_a_noop() {
        let mut state = InteractionState::new();
        let mut zones = seeded(&[(10.0, 10.0, 20.0, 20.0)]);

        assert_eq!(state.double_click(Point::new(500.0, 500.0), &mut zones), Outcome::Quiet);
        assert_eq!(zones.len(), 1);
    }

    #[test]
    fn test_hit_test_prefers_topmost_of_overlapping_zones() {
        let zones = seeded(&[(10.0, 10.0, 40.0, 40.0), (20.0, 20.0, 40.0, 40.0)]);
        let top = zones[1].id;

        let hit = hit_test(&zones, Point::new(30.0, 30.0)).unwrap();
        assert_eq!(hit.id, top);
    }

    #[test]
    fn test_preview_rect_only_while_drawing() {
        let mut state = InteractionState::new();
        let zones = Vec::new();
        assert!(state.preview_rect(Point::new(5.0, 5.0)).is_none());

        state.pointer_down(Point::new(10.0, 10.0), &zones);
        let rect = state.preview_rect(Point::new(4.0, 30.0)).unwrap();
        // Normalized regardless of drag direction
        assert_eq!(rect.min, Pos2::new(4.0, 10.0));
        assert_eq!(rect.max, Pos2::new(10.0, 30.0));
    }
}
