//! Panel derivation for the gradient blinds effect.
//!
//! Panels are recomputed from scratch every tick; nothing is diffed or kept
//! between frames apart from the pointer state.

use effectconfig::{BlindsConfig, ShineDirection};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pointer::{PointerState, PointerTracker};

/// One vertical strip of the effect, in percent of the container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub index: u32,
    pub left_pct: f32,
    pub width_pct: f32,
    pub opacity: f32,
    pub brightness: f32,
    /// Horizontal shear in degrees.
    pub skew_deg: f32,
}

pub fn left_pct(index: u32, count: u32) -> f32 {
    index as f32 / count.max(1) as f32 * 100.0
}

/// Centre of the visible part of a panel as a fraction of the container.
///
/// Panels paint in index order, so a panel wider than its slot is covered
/// from the next panel's left edge on; the last one is cut at the container
/// edge. Without overlap this is simply `(left + width / 2) / 100`.
pub fn visible_center(index: u32, count: u32, left: f32, width: f32) -> f32 {
    let next_left = if index + 1 >= count {
        100.0
    } else {
        left_pct(index + 1, count)
    };
    let visible = width.min(next_left - left).max(0.0);
    (left + visible / 2.0) / 100.0
}

/// Linear falloff: 1 at the pointer, 0 at `radius` and beyond.
pub fn spotlight(distance: f32, radius: f32) -> f32 {
    (1.0 - distance.abs() / radius).max(0.0)
}

pub fn shine(direction: ShineDirection, left_pct: f32) -> f32 {
    match direction {
        ShineDirection::Left => (1.0 - left_pct / 100.0).max(0.0),
        ShineDirection::Right => (left_pct / 100.0).max(0.0),
    }
}

/// Derives panel geometry and shading from the smoothed pointer position.
#[derive(Debug, Clone)]
pub struct BlindCompositor {
    count: u32,
    min_width: f32,
    radius: f32,
    opacity: f32,
    noise: f32,
    distort: f32,
    shine: ShineDirection,
}

impl BlindCompositor {
    pub fn new(config: &BlindsConfig) -> Self {
        Self {
            count: config.blind_count,
            min_width: config.blind_min_width,
            radius: config.spotlight_radius,
            opacity: config.spotlight_opacity,
            noise: config.noise,
            distort: config.distort_amount,
            shine: config.shine_direction,
        }
    }

    /// Fills `panels` with this tick's panels. The buffer is reused.
    pub fn compose<R>(&self, pointer_x: f32, rng: &mut R, panels: &mut Vec<Panel>)
    where
        R: Rng + ?Sized,
    {
        panels.clear();
        panels.reserve(self.count as usize);
        for index in 0..self.count {
            let left = left_pct(index, self.count);
            let width = self.min_width + (100.0 - self.min_width) * rng.gen::<f32>();
            let distance = (visible_center(index, self.count, left, width) - pointer_x).abs();
            let opacity = self.opacity * (0.3 + 0.7 * spotlight(distance, self.radius));
            let brightness =
                1.0 + shine(self.shine, left) * 0.3 + self.noise * (rng.gen::<f32>() - 0.5);
            let skew_deg = if self.distort > 0.0 {
                (rng.gen::<f32>() - 0.5) * self.distort
            } else {
                0.0
            };
            panels.push(Panel {
                index,
                left_pct: left,
                width_pct: width,
                opacity,
                brightness,
                skew_deg,
            });
        }
    }
}

/// Output of one blinds tick.
#[derive(Debug, Clone, Default)]
pub struct BlindsFrame {
    pub panels: Vec<Panel>,
    pub pointer: PointerState,
}

/// Per-mount state of the blinds effect.
pub struct BlindsEffect {
    compositor: BlindCompositor,
    tracker: PointerTracker,
    frame: BlindsFrame,
    rng: StdRng,
}

impl BlindsEffect {
    pub fn new(config: &BlindsConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: &BlindsConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &BlindsConfig, rng: StdRng) -> Self {
        Self {
            compositor: BlindCompositor::new(config),
            tracker: PointerTracker::new(config.mouse_dampening),
            frame: BlindsFrame {
                panels: Vec::with_capacity(config.blind_count as usize),
                pointer: PointerState::default(),
            },
            rng,
        }
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// Smooths the pointer once and rebuilds every panel.
    pub fn update(&mut self) {
        let pointer = self.tracker.tick();
        self.compositor
            .compose(pointer.current.x, &mut self.rng, &mut self.frame.panels);
        self.frame.pointer = pointer;
    }

    pub fn frame(&self) -> &BlindsFrame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn spotlight_is_one_at_center_and_zero_beyond_radius() {
        assert_eq!(spotlight(0.0, 0.5), 1.0);
        assert_eq!(spotlight(0.5, 0.5), 0.0);
        assert_eq!(spotlight(0.9, 0.5), 0.0);
        let mut previous = 1.0;
        for step in 1..=20 {
            let value = spotlight(step as f32 * 0.025, 0.5);
            assert!(value < previous);
            previous = value;
        }
    }

    #[test]
    fn left_offsets_cover_from_zero_and_increase() {
        let count = 12;
        assert_eq!(left_pct(0, count), 0.0);
        for index in 1..count {
            assert!(left_pct(index, count) > left_pct(index - 1, count));
        }
        assert!((left_pct(6, count) - 50.0).abs() < 1e-5);
    }

    #[test]
    fn visible_center_matches_plain_center_without_overlap() {
        assert!((visible_center(2, 4, 50.0, 10.0) - 0.55).abs() < 1e-6);
        // wider than its slot: covered by panel 3 from 75 % on
        assert!((visible_center(2, 4, 50.0, 60.0) - 0.625).abs() < 1e-6);
        // last panel is clipped at the right edge
        assert!((visible_center(3, 4, 75.0, 60.0) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn shine_direction_controls_gradient_of_brightness() {
        assert_eq!(shine(ShineDirection::Left, 0.0), 1.0);
        assert_eq!(shine(ShineDirection::Left, 100.0), 0.0);
        assert_eq!(shine(ShineDirection::Right, 0.0), 0.0);
        assert!((shine(ShineDirection::Right, 75.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn panels_stay_within_statistical_bounds() {
        let config = BlindsConfig::default();
        let compositor = BlindCompositor::new(&config);
        let mut rng = seeded();
        let mut panels = Vec::new();

        for _ in 0..200 {
            compositor.compose(0.3, &mut rng, &mut panels);
            assert_eq!(panels.len(), config.blind_count as usize);
            for panel in &panels {
                assert!((config.blind_min_width..100.0).contains(&panel.width_pct));
                assert!(panel.opacity >= 0.3 * config.spotlight_opacity - 1e-6);
                assert!(panel.opacity <= config.spotlight_opacity + 1e-6);
                let shine = shine(config.shine_direction, panel.left_pct);
                let base = 1.0 + shine * 0.3;
                assert!((panel.brightness - base).abs() <= config.noise / 2.0 + 1e-6);
                assert_eq!(panel.skew_deg, 0.0);
            }
        }
    }

    #[test]
    fn distortion_bounds_skew() {
        let config = BlindsConfig {
            distort_amount: 8.0,
            ..BlindsConfig::default()
        };
        let compositor = BlindCompositor::new(&config);
        let mut rng = seeded();
        let mut panels = Vec::new();
        let mut saw_nonzero = false;
        for _ in 0..50 {
            compositor.compose(0.5, &mut rng, &mut panels);
            for panel in &panels {
                assert!(panel.skew_deg.abs() <= 4.0);
                saw_nonzero |= panel.skew_deg != 0.0;
            }
        }
        assert!(saw_nonzero);
    }

    #[test]
    fn panel_under_pointer_outshines_the_edges() {
        let config = BlindsConfig {
            blind_count: 12,
            blind_min_width: 50.0,
            spotlight_radius: 0.5,
            shine_direction: ShineDirection::Left,
            ..BlindsConfig::default()
        };
        let compositor = BlindCompositor::new(&config);
        let mut rng = seeded();
        let mut panels = Vec::new();

        for _ in 0..100 {
            compositor.compose(0.5, &mut rng, &mut panels);
            assert!(panels[6].opacity > panels[0].opacity);
            assert!(panels[6].opacity > panels[11].opacity);
        }
    }

    #[test]
    fn effect_update_tracks_pointer_and_rebuilds_panels() {
        let config = BlindsConfig {
            mouse_dampening: 1.0,
            ..BlindsConfig::default()
        };
        let mut effect = BlindsEffect::with_seed(&config, 7);
        let mut listener = effect.tracker().listener();
        listener(crate::container::PointerMove {
            x: 25.0,
            y: 50.0,
            bounds: crate::container::Rect::new(0.0, 0.0, 100.0, 100.0),
        });

        effect.update();
        let frame = effect.frame();
        assert_eq!(frame.panels.len(), 12);
        assert!((frame.pointer.current.x - 0.25).abs() < 1e-6);
    }
}
