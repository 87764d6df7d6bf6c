//! Surface backend without a GPU.
//!
//! Presented frames are recorded into a shared [`HeadlessReport`], which the
//! `--headless` CLI mode summarises and tests inspect.

use std::cell::RefCell;
use std::rc::Rc;

use effectconfig::RenderConfig;
use glam::{Vec3, Vec4};
use tracing::trace;

use crate::blinds::Panel;
use crate::color::prism_shade;
use crate::container::Container;
use crate::error::{FrameError, SurfaceError};
use crate::pointer::PointerState;
use crate::prism::{displace, PrismUniforms};
use crate::surface::{Frame, Surface, SurfaceFactory, SurfaceSize};

/// Object-space point sampled for the recorded prism colour: the centre of
/// the front face.
const FRONT_FACE_CENTER: Vec3 = Vec3::new(0.0, 0.0, 1.0);

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedFrame {
    Prism {
        uniforms: PrismUniforms,
        rotation: Vec3,
        aspect: f32,
        /// Shaded colour at the centre of the front face.
        front_color: Vec4,
    },
    Blinds {
        panels: Vec<Panel>,
        pointer: PointerState,
    },
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessReport {
    pub surfaces_created: u32,
    pub surfaces_destroyed: u32,
    pub frames_presented: u64,
    pub resizes: u32,
    pub size: SurfaceSize,
    pub last_frame: Option<RecordedFrame>,
}

pub struct HeadlessFactory {
    report: Rc<RefCell<HeadlessReport>>,
    unavailable: bool,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self {
            report: Rc::new(RefCell::new(HeadlessReport::default())),
            unavailable: false,
        }
    }

    /// A factory whose every creation attempt reports an unavailable context.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn report(&self) -> Rc<RefCell<HeadlessReport>> {
        Rc::clone(&self.report)
    }
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceFactory for HeadlessFactory {
    type Surface = HeadlessSurface;

    fn create(
        &mut self,
        _container: &dyn Container,
        size: SurfaceSize,
        _config: &RenderConfig,
    ) -> Result<HeadlessSurface, SurfaceError> {
        if self.unavailable {
            return Err(SurfaceError::Unavailable(
                "headless context disabled".to_string(),
            ));
        }
        let mut report = self.report.borrow_mut();
        report.surfaces_created += 1;
        report.size = size;
        Ok(HeadlessSurface {
            size,
            report: Rc::clone(&self.report),
            destroyed: false,
        })
    }
}

pub struct HeadlessSurface {
    size: SurfaceSize,
    report: Rc<RefCell<HeadlessReport>>,
    destroyed: bool,
}

impl Surface for HeadlessSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        let mut report = self.report.borrow_mut();
        report.resizes += 1;
        report.size = size;
    }

    fn present(&mut self, frame: Frame<'_>) -> Result<(), FrameError> {
        if self.destroyed {
            return Err(FrameError::SurfaceLost);
        }
        let recorded = match frame {
            Frame::Prism(prism) => {
                let (position, noise) = if prism.displacement {
                    displace(FRONT_FACE_CENTER, prism.uniforms.time, prism.uniforms.noise)
                } else {
                    (FRONT_FACE_CENTER, 0.0)
                };
                RecordedFrame::Prism {
                    uniforms: prism.uniforms,
                    rotation: prism.rotation,
                    aspect: prism.camera.aspect(),
                    front_color: prism_shade(position, &prism.uniforms, noise),
                }
            }
            Frame::Blinds(blinds) => RecordedFrame::Blinds {
                panels: blinds.panels.clone(),
                pointer: blinds.pointer,
            },
        };
        let mut report = self.report.borrow_mut();
        report.frames_presented += 1;
        trace!(frame = report.frames_presented, "headless present");
        report.last_frame = Some(recorded);
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.report.borrow_mut().surfaces_destroyed += 1;
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        self.destroy();
    }
}
