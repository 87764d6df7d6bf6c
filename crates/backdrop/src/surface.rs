//! Platform-neutral presentation surfaces and their single-owner manager.

use effectconfig::RenderConfig;
use tracing::{debug, info, trace, warn};

use crate::blinds::BlindsFrame;
use crate::container::Container;
use crate::error::{FrameError, SurfaceError};
use crate::prism::PrismFrame;

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    /// Clamps both dimensions to at least one pixel.
    pub fn at_least_one(self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }
}

/// One frame worth of effect output, borrowed from the effect state.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Prism(&'a PrismFrame),
    Blinds(&'a BlindsFrame),
}

impl Frame<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Frame::Prism(_) => "prism",
            Frame::Blinds(_) => "blinds",
        }
    }
}

/// A graphics/presentation context bound to one container for one mount.
pub trait Surface {
    fn size(&self) -> SurfaceSize;

    /// Refreshes the surface dimensions in place.
    fn resize(&mut self, size: SurfaceSize);

    /// Renders and presents exactly one frame.
    fn present(&mut self, frame: Frame<'_>) -> Result<(), FrameError>;

    /// Frees GPU-resident objects and detaches from the container. Calling it
    /// more than once must be harmless.
    fn destroy(&mut self);
}

/// Creates surfaces for a container. Creation may fail.
pub trait SurfaceFactory {
    type Surface: Surface;

    fn create(
        &mut self,
        container: &dyn Container,
        size: SurfaceSize,
        config: &RenderConfig,
    ) -> Result<Self::Surface, SurfaceError>;
}

/// Identifies one acquisition. Handles of released surfaces go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

/// Owns at most one live surface at a time.
pub struct SurfaceManager<F: SurfaceFactory> {
    factory: F,
    active: Option<(SurfaceHandle, F::Surface)>,
    next_id: u64,
}

impl<F: SurfaceFactory> SurfaceManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            active: None,
            next_id: 1,
        }
    }

    /// Creates the surface for `container`, releasing any previous one first.
    ///
    /// Returns `Ok(None)` when the context is unavailable; the caller renders
    /// nothing. Pipeline build failures are returned as errors.
    pub fn acquire(
        &mut self,
        container: &dyn Container,
        size_hint: SurfaceSize,
        config: &RenderConfig,
    ) -> Result<Option<SurfaceHandle>, SurfaceError> {
        if let Some(previous) = self.active() {
            debug!(?previous, "releasing prior surface before acquire");
            self.release(previous);
        }

        let size = if size_hint.is_empty() {
            container.pixel_size()
        } else {
            size_hint
        }
        .at_least_one();

        match self.factory.create(container, size, config) {
            Ok(surface) => {
                let handle = SurfaceHandle(self.next_id);
                self.next_id += 1;
                info!(
                    ?handle,
                    effect = %config.kind(),
                    width = size.width,
                    height = size.height,
                    "acquired rendering surface"
                );
                self.active = Some((handle, surface));
                Ok(Some(handle))
            }
            Err(SurfaceError::Unavailable(reason)) => {
                warn!(%reason, effect = %config.kind(), "rendering surface unavailable; effect disabled");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Destroys the surface behind `handle`. Stale or repeated handles are a
    /// no-op. Returns whether a surface was destroyed.
    pub fn release(&mut self, handle: SurfaceHandle) -> bool {
        match self.active.take() {
            Some((active, mut surface)) if active == handle => {
                surface.destroy();
                drop(surface);
                debug!(?handle, "released rendering surface");
                true
            }
            other => {
                self.active = other;
                trace!(?handle, "release ignored; surface not active");
                false
            }
        }
    }

    pub fn active(&self) -> Option<SurfaceHandle> {
        self.active.as_ref().map(|(handle, _)| *handle)
    }

    pub fn surface(&self, handle: SurfaceHandle) -> Option<&F::Surface> {
        match &self.active {
            Some((active, surface)) if *active == handle => Some(surface),
            _ => None,
        }
    }

    pub fn surface_mut(&mut self, handle: SurfaceHandle) -> Option<&mut F::Surface> {
        match &mut self.active {
            Some((active, surface)) if *active == handle => Some(surface),
            _ => None,
        }
    }
}

impl<F: SurfaceFactory> Drop for SurfaceManager<F> {
    fn drop(&mut self) {
        if let Some(handle) = self.active() {
            self.release(handle);
        }
    }
}
