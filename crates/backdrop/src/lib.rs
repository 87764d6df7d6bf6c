//! Animated backdrop effects for the Axl assistant UI.
//!
//! Two interchangeable effects share one mount lifecycle: a shader-driven
//! rotating prism and pointer-reactive gradient blinds. The flow for one
//! mount is:
//!
//! ```text
//!   host (axlbg) ── RenderConfig ──▶ Backdrop::mount(factory, container)
//!          │                                 │
//!          │ per display refresh             ├─▶ SurfaceManager::acquire ─▶ Surface
//!          ▼                                 └─▶ container subscriptions (pointer, resize)
//!   Backdrop::frame(elapsed)
//!          │
//!          └─▶ AnimationScheduler::tick ─▶ resize ─▶ effect update ─▶ Surface::present
//! ```
//!
//! Everything runs on the host's UI thread. Pointer and resize events only
//! write single-slot cells; the scheduler folds them in at the next tick.
//! Dropping or unmounting a [`Backdrop`] cancels the loop before the surface
//! is released, so no late tick can touch freed GPU state.
//!
//! Surfaces come from a [`SurfaceFactory`]: [`gpu::GpuSurfaceFactory`] renders
//! with `wgpu` into a native window, [`headless::HeadlessFactory`] records
//! frames without a GPU.

pub mod blinds;
pub mod clock;
pub mod color;
mod compile;
pub mod container;
pub mod effect;
pub mod error;
pub mod gpu;
pub mod headless;
mod mount;
pub mod pointer;
pub mod prism;
pub mod resize;
pub mod scheduler;
pub mod surface;

pub use effectconfig::{
    AnimationType, BlendMode, BlindsConfig, Color, ConfigError, EffectFile, EffectKind,
    PrismConfig, RenderConfig, ShineDirection,
};

pub use container::{Container, EventHub, PointerMove, Rect, Subscription, VirtualContainer};
pub use error::{FrameError, MountError, SurfaceError};
pub use mount::Backdrop;
pub use scheduler::{CancellationToken, LoopState, TickOutcome};
pub use surface::{Frame, Surface, SurfaceFactory, SurfaceHandle, SurfaceManager, SurfaceSize};
