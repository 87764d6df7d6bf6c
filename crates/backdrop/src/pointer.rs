//! Pointer sampling and per-tick exponential smoothing.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::container::{PointerListener, PointerMove};

/// Target and smoothed pointer position, both relative to the container
/// bounds in `[0, 1]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub target: Vec2,
    pub current: Vec2,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            target: Vec2::splat(0.5),
            current: Vec2::splat(0.5),
        }
    }
}

/// Maps a raw event into container-relative coordinates. Returns `None` for
/// a degenerate (zero-area) rectangle.
pub fn normalize(event: &PointerMove) -> Option<Vec2> {
    let bounds = event.bounds;
    if !(bounds.width > 0.0 && bounds.height > 0.0) {
        return None;
    }
    let x = ((event.x - bounds.left) / bounds.width).clamp(0.0, 1.0);
    let y = ((event.y - bounds.top) / bounds.height).clamp(0.0, 1.0);
    Some(Vec2::new(x, y))
}

/// Owns the pointer state for one mount. Raw events land in a single slot
/// (last writer wins) and are folded in once per tick.
pub struct PointerTracker {
    dampening: f32,
    latest: Rc<Cell<Option<Vec2>>>,
    state: PointerState,
}

impl PointerTracker {
    pub fn new(dampening: f32) -> Self {
        Self {
            dampening: dampening.clamp(f32::EPSILON, 1.0),
            latest: Rc::new(Cell::new(None)),
            state: PointerState::default(),
        }
    }

    /// Listener to register with the container. It only writes the slot.
    pub fn listener(&self) -> PointerListener {
        let slot = Rc::clone(&self.latest);
        Box::new(move |event| {
            if let Some(position) = normalize(&event) {
                slot.set(Some(position));
            }
        })
    }

    /// Applies the latest sample and one smoothing step.
    pub fn tick(&mut self) -> PointerState {
        if let Some(target) = self.latest.take() {
            self.state.target = target;
        }
        if self.dampening >= 1.0 {
            self.state.current = self.state.target;
        } else {
            self.state.current += (self.state.target - self.state.current) * self.dampening;
        }
        self.state
    }

    pub fn state(&self) -> PointerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Rect;

    fn event(x: f32, y: f32) -> PointerMove {
        PointerMove {
            x,
            y,
            bounds: Rect::new(10.0, 20.0, 200.0, 100.0),
        }
    }

    #[test]
    fn normalizes_and_clamps_into_unit_square() {
        assert_eq!(normalize(&event(110.0, 70.0)), Some(Vec2::new(0.5, 0.5)));
        assert_eq!(normalize(&event(-500.0, 900.0)), Some(Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn degenerate_bounds_leave_target_unchanged() {
        let mut tracker = PointerTracker::new(1.0);
        let mut listener = tracker.listener();
        listener(PointerMove {
            x: 3.0,
            y: 3.0,
            bounds: Rect::new(0.0, 0.0, 0.0, 50.0),
        });
        assert_eq!(tracker.tick().target, Vec2::splat(0.5));
    }

    #[test]
    fn full_dampening_snaps_in_one_tick() {
        let mut tracker = PointerTracker::new(1.0);
        tracker.listener()(event(10.0, 20.0));
        let state = tracker.tick();
        assert_eq!(state.current, Vec2::ZERO);
    }

    #[test]
    fn smoothing_converges_within_log_bound() {
        let dampening = 0.15_f32;
        let epsilon = 1e-3_f32;
        let mut tracker = PointerTracker::new(dampening);
        tracker.listener()(event(210.0, 120.0));

        let bound = (epsilon.ln() / (1.0 - dampening).ln()).ceil() as usize + 1;
        let mut ticks = 0;
        while (tracker.tick().current - Vec2::ONE).length() > epsilon {
            ticks += 1;
            assert!(ticks <= bound, "did not converge within {bound} ticks");
        }
    }

    #[test]
    fn only_latest_sample_between_ticks_counts() {
        let mut tracker = PointerTracker::new(1.0);
        let mut listener = tracker.listener();
        listener(event(10.0, 20.0));
        listener(event(60.0, 45.0));
        listener(event(210.0, 120.0));
        assert_eq!(tracker.tick().current, Vec2::ONE);
    }

    #[test]
    fn smoothing_runs_per_tick_not_per_event() {
        let mut tracker = PointerTracker::new(0.5);
        let mut listener = tracker.listener();
        for _ in 0..10 {
            listener(event(210.0, 70.0));
        }
        let state = tracker.tick();
        assert!((state.current.x - 0.75).abs() < 1e-6);
        assert!((state.current.y - 0.5).abs() < 1e-6);
    }
}
