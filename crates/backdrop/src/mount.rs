use std::time::Duration;

use effectconfig::RenderConfig;
use tracing::{debug, info, warn};

use crate::container::{Container, Subscription};
use crate::effect::EffectState;
use crate::error::{FrameError, MountError};
use crate::pointer::PointerState;
use crate::resize::ResizeCoordinator;
use crate::scheduler::{AnimationScheduler, CancellationToken, LoopState, TickOutcome};
use crate::surface::{Surface, SurfaceFactory, SurfaceHandle, SurfaceManager, SurfaceSize};

/// One effect mounted into one container.
///
/// Owns the surface, the animation loop, the effect state and the input
/// subscriptions. Dropping it unmounts.
pub struct Backdrop<F: SurfaceFactory> {
    config: RenderConfig,
    surfaces: SurfaceManager<F>,
    handle: Option<SurfaceHandle>,
    scheduler: AnimationScheduler,
    effect: EffectState,
    resize: ResizeCoordinator,
    subscriptions: Vec<Subscription>,
    seed: Option<u64>,
}

impl<F: SurfaceFactory> Backdrop<F> {
    /// Validates `config`, subscribes to the container and acquires a surface.
    ///
    /// An unavailable graphics context is not an error: the mount exists but
    /// renders nothing. A pipeline build failure is returned and leaves no
    /// listener behind.
    pub fn mount(
        factory: F,
        container: &dyn Container,
        config: RenderConfig,
    ) -> Result<Self, MountError> {
        Self::mount_inner(factory, container, config, None)
    }

    /// Like [`Backdrop::mount`] but with a fixed seed for the panel noise.
    pub fn mount_seeded(
        factory: F,
        container: &dyn Container,
        config: RenderConfig,
        seed: u64,
    ) -> Result<Self, MountError> {
        Self::mount_inner(factory, container, config, Some(seed))
    }

    fn mount_inner(
        factory: F,
        container: &dyn Container,
        config: RenderConfig,
        seed: Option<u64>,
    ) -> Result<Self, MountError> {
        config.validate()?;
        let size = container.pixel_size();
        let (effect, scheduler, resize) = fresh_state(&config, size, seed);
        let mut backdrop = Self {
            effect,
            scheduler,
            resize,
            surfaces: SurfaceManager::new(factory),
            handle: None,
            subscriptions: Vec::new(),
            config,
            seed,
        };
        backdrop.start(container, size)?;
        Ok(backdrop)
    }

    /// Subscribes to the container and acquires a surface for the current
    /// effect state.
    fn start(&mut self, container: &dyn Container, size: SurfaceSize) -> Result<(), MountError> {
        self.subscriptions
            .push(container.on_resize(self.resize.listener()));
        if let Some(listener) = self.effect.pointer_listener() {
            self.subscriptions.push(container.on_pointer_move(listener));
        }

        match self.surfaces.acquire(container, size, &self.config) {
            Ok(Some(handle)) => {
                self.handle = Some(handle);
                info!(effect = %self.config.kind(), "backdrop mounted");
                Ok(())
            }
            Ok(None) => {
                self.scheduler.halt();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, effect = %self.config.kind(), "backdrop failed to start");
                self.scheduler.halt();
                self.subscriptions.clear();
                Err(MountError::Pipeline(err))
            }
        }
    }

    /// Runs one animation tick. The host calls this once per display refresh
    /// and schedules another refresh while it returns `Continue`.
    pub fn frame(&mut self, elapsed: Duration) -> TickOutcome {
        let Self {
            surfaces,
            handle,
            scheduler,
            effect,
            resize,
            ..
        } = self;
        let handle = *handle;

        scheduler.tick(elapsed, |time| {
            let handle = handle.ok_or(FrameError::SurfaceLost)?;
            let surface = surfaces
                .surface_mut(handle)
                .ok_or(FrameError::SurfaceLost)?;
            resize.apply(surface, effect.camera_mut());
            effect.update(time);
            surface.present(effect.frame())
        })
    }

    /// Swaps in a new configuration. Any difference tears the mount down and
    /// rebuilds it; an identical config is a no-op. Returns whether a remount
    /// happened. An invalid config is rejected before anything is torn down.
    pub fn reconfigure(
        &mut self,
        container: &dyn Container,
        config: RenderConfig,
    ) -> Result<bool, MountError> {
        if config == self.config {
            return Ok(false);
        }
        config.validate()?;
        debug!(from = %self.config.kind(), to = %config.kind(), "remounting backdrop");
        self.unmount();
        let size = container.pixel_size();
        (self.effect, self.scheduler, self.resize) = fresh_state(&config, size, self.seed);
        self.config = config;
        self.start(container, size)?;
        Ok(true)
    }

    /// Cancels the loop, releases the surface and drops every listener.
    /// Calling it again is harmless.
    pub fn unmount(&mut self) {
        self.scheduler.cancel();
        if let Some(handle) = self.handle.take() {
            self.surfaces.release(handle);
        }
        self.subscriptions.clear();
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.scheduler.state()
    }

    pub fn is_rendering(&self) -> bool {
        self.handle.is_some() && self.state() == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.scheduler.frames()
    }

    pub fn token(&self) -> CancellationToken {
        self.scheduler.token()
    }

    pub fn surface(&self) -> Option<&F::Surface> {
        self.handle.and_then(|handle| self.surfaces.surface(handle))
    }

    /// Smoothed pointer state, for effects that track the pointer.
    pub fn pointer(&self) -> Option<PointerState> {
        match &self.effect {
            EffectState::Blinds(blinds) => Some(blinds.tracker().state()),
            EffectState::Prism(_) => None,
        }
    }
}

/// Per-mount state, built once for every mount or remount.
fn fresh_state(
    config: &RenderConfig,
    size: SurfaceSize,
    seed: Option<u64>,
) -> (EffectState, AnimationScheduler, ResizeCoordinator) {
    let aspect = size.at_least_one().aspect();
    let effect = match seed {
        Some(seed) => EffectState::with_seed(config, aspect, seed),
        None => EffectState::new(config, aspect),
    };
    (
        effect,
        AnimationScheduler::new(config.time_scale()),
        ResizeCoordinator::new(size),
    )
}

impl<F: SurfaceFactory> Drop for Backdrop<F> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::VirtualContainer;
    use crate::headless::{HeadlessFactory, RecordedFrame};
    use effectconfig::{BlindsConfig, PrismConfig};

    const TICK: Duration = Duration::from_millis(16);

    #[test]
    fn mount_subscribes_and_unmount_detaches() {
        let container = VirtualContainer::new(SurfaceSize::new(640, 360));
        let mut backdrop =
            Backdrop::mount(HeadlessFactory::new(), &container, RenderConfig::default()).unwrap();
        assert_eq!(container.hub().listener_count(), 2);
        assert_eq!(backdrop.frame(TICK), TickOutcome::Continue);

        backdrop.unmount();
        backdrop.unmount();
        assert_eq!(container.hub().listener_count(), 0);
        assert_eq!(backdrop.frame(TICK), TickOutcome::Cancelled);
    }

    #[test]
    fn prism_mount_skips_pointer_subscription() {
        let container = VirtualContainer::new(SurfaceSize::new(640, 360));
        let _backdrop = Backdrop::mount(
            HeadlessFactory::new(),
            &container,
            RenderConfig::Prism(PrismConfig::default()),
        )
        .unwrap();
        assert_eq!(container.hub().listener_count(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_before_subscribing() {
        let container = VirtualContainer::new(SurfaceSize::new(64, 64));
        let config = RenderConfig::Blinds(BlindsConfig {
            blind_count: 0,
            ..BlindsConfig::default()
        });
        let err = Backdrop::mount(HeadlessFactory::new(), &container, config)
            .err()
            .expect("invalid config");
        assert!(matches!(err, MountError::InvalidConfig(_)));
        assert_eq!(container.hub().listener_count(), 0);
    }

    #[test]
    fn remount_restarts_seeded_noise() {
        let container = VirtualContainer::new(SurfaceSize::new(320, 180));
        let factory = HeadlessFactory::new();
        let report = factory.report();
        let mut backdrop =
            Backdrop::mount_seeded(factory, &container, RenderConfig::default(), 7).unwrap();
        for _ in 0..3 {
            backdrop.frame(TICK);
        }

        let config = BlindsConfig {
            noise: 0.6,
            ..BlindsConfig::default()
        };
        assert!(backdrop
            .reconfigure(&container, RenderConfig::Blinds(config.clone()))
            .unwrap());
        assert_eq!(backdrop.frame(TICK), TickOutcome::Continue);

        let mut expected = crate::blinds::BlindsEffect::with_seed(&config, 7);
        expected.update();
        let recorded = report.borrow().last_frame.clone();
        match recorded {
            Some(RecordedFrame::Blinds { panels, .. }) => {
                assert_eq!(panels, expected.frame().panels)
            }
            other => panic!("expected a blinds frame, got {other:?}"),
        }
        assert_eq!(container.hub().listener_count(), 2);
    }

    #[test]
    fn identical_config_does_not_remount() {
        let container = VirtualContainer::new(SurfaceSize::new(64, 64));
        let factory = HeadlessFactory::new();
        let report = factory.report();
        let mut backdrop =
            Backdrop::mount(factory, &container, RenderConfig::default()).unwrap();
        assert!(!backdrop
            .reconfigure(&container, RenderConfig::default())
            .unwrap());
        assert_eq!(report.borrow().surfaces_created, 1);
    }
}
