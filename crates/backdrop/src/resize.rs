use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::container::ResizeListener;
use crate::prism::Camera;
use crate::surface::{Surface, SurfaceSize};

/// Coalesces container size changes and applies the latest one at the start
/// of a tick.
pub struct ResizeCoordinator {
    pending: Rc<Cell<Option<SurfaceSize>>>,
    current: SurfaceSize,
}

impl ResizeCoordinator {
    pub fn new(initial: SurfaceSize) -> Self {
        Self {
            pending: Rc::new(Cell::new(None)),
            current: initial,
        }
    }

    pub fn listener(&self) -> ResizeListener {
        let slot = Rc::clone(&self.pending);
        Box::new(move |size: SurfaceSize| {
            if !size.is_empty() {
                slot.set(Some(size));
            }
        })
    }

    /// Resizes `surface` (and updates the camera aspect) if a new size is
    /// pending. Returns the applied size.
    pub fn apply<S>(&mut self, surface: &mut S, camera: Option<&mut Camera>) -> Option<SurfaceSize>
    where
        S: Surface + ?Sized,
    {
        let size = self.pending.take()?;
        if size == self.current && surface.size() == size {
            return None;
        }
        debug!(width = size.width, height = size.height, "applying container resize");
        surface.resize(size);
        if let Some(camera) = camera {
            camera.set_aspect(size.aspect());
        }
        self.current = size;
        Some(size)
    }
}
