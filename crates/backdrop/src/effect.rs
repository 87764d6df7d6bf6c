use effectconfig::RenderConfig;

use crate::blinds::BlindsEffect;
use crate::container::PointerListener;
use crate::prism::{Camera, PrismEffect};
use crate::surface::Frame;

/// Mutable per-mount state of whichever effect the config selects.
pub enum EffectState {
    Prism(PrismEffect),
    Blinds(BlindsEffect),
}

impl EffectState {
    pub fn new(config: &RenderConfig, aspect: f32) -> Self {
        match config {
            RenderConfig::Prism(prism) => EffectState::Prism(PrismEffect::new(prism, aspect)),
            RenderConfig::Blinds(blinds) => EffectState::Blinds(BlindsEffect::new(blinds)),
        }
    }

    pub fn with_seed(config: &RenderConfig, aspect: f32, seed: u64) -> Self {
        match config {
            RenderConfig::Blinds(blinds) => {
                EffectState::Blinds(BlindsEffect::with_seed(blinds, seed))
            }
            other => Self::new(other, aspect),
        }
    }

    /// Advances the effect to scaled time `time`.
    pub fn update(&mut self, time: f32) {
        match self {
            EffectState::Prism(prism) => prism.update(time),
            EffectState::Blinds(blinds) => blinds.update(),
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        match self {
            EffectState::Prism(prism) => Frame::Prism(prism.frame()),
            EffectState::Blinds(blinds) => Frame::Blinds(blinds.frame()),
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        match self {
            EffectState::Prism(prism) => Some(prism.camera_mut()),
            EffectState::Blinds(_) => None,
        }
    }

    /// Pointer listener for effects that react to the pointer.
    pub fn pointer_listener(&self) -> Option<PointerListener> {
        match self {
            EffectState::Prism(_) => None,
            EffectState::Blinds(blinds) => Some(blinds.tracker().listener()),
        }
    }
}
