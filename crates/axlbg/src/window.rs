//! Window mode: a winit window acts as the backdrop container.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use backdrop::container::{PointerListener, ResizeListener};
use backdrop::gpu::GpuSurfaceFactory;
use backdrop::{
    Backdrop, Container, EffectFile, EventHub, MountError, PointerMove, Rect, RenderConfig,
    Subscription, SurfaceFactory, SurfaceSize, TickOutcome,
};
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

pub struct WindowOptions {
    pub file: EffectFile,
    pub config_path: Option<PathBuf>,
    pub size: SurfaceSize,
}

struct WindowContainer {
    window: Arc<Window>,
    hub: EventHub,
}

impl Container for WindowContainer {
    fn bounding_rect(&self) -> Rect {
        Rect::from_size(self.pixel_size())
    }

    fn pixel_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn on_pointer_move(&self, listener: PointerListener) -> Subscription {
        self.hub.subscribe_pointer(listener)
    }

    fn on_resize(&self, listener: ResizeListener) -> Subscription {
        self.hub.subscribe_resize(listener)
    }
}

/// Mounts `config`, or logs the failure and returns `None` when its pipeline
/// cannot be built. Only a rejected configuration is an error.
fn mount_or_blank<F: SurfaceFactory>(
    factory: F,
    container: &dyn Container,
    config: RenderConfig,
) -> Result<Option<Backdrop<F>>, MountError> {
    let kind = config.kind();
    match Backdrop::mount(factory, container, config) {
        Ok(backdrop) => Ok(Some(backdrop)),
        Err(MountError::Pipeline(err)) => {
            error!(effect = %kind, error = %err, "backdrop pipeline failed; window stays blank");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

struct Session {
    container: WindowContainer,
    /// `None` while the window is blank after a pipeline failure.
    backdrop: Option<Backdrop<GpuSurfaceFactory<Window>>>,
    file: EffectFile,
    config_path: Option<PathBuf>,
    last_frame: Option<Instant>,
}

impl Session {
    fn redraw(&mut self) {
        let now = Instant::now();
        let elapsed = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);

        let Some(backdrop) = self.backdrop.as_mut() else {
            return;
        };
        match backdrop.frame(elapsed) {
            TickOutcome::Continue => self.container.window.request_redraw(),
            outcome => debug!(?outcome, "animation loop idle"),
        }
    }

    fn toggle_effect(&mut self) {
        let next = self.file.effect.toggled();
        self.file.effect = next;
        let config = self.file.render_config_for(next);
        self.apply(config);
    }

    /// Re-reads the config file, keeping the effect currently on screen.
    fn reload(&mut self) {
        let Some(path) = self.config_path.as_deref() else {
            info!("no config file given; nothing to reload");
            return;
        };
        match EffectFile::load(path) {
            Ok(mut file) => {
                file.effect = self.file.effect;
                let config = file.render_config();
                self.file = file;
                self.apply(config);
            }
            Err(err) => warn!(path = %path.display(), error = %err, "config reload rejected"),
        }
    }

    fn apply(&mut self, config: RenderConfig) {
        let kind = config.kind();
        match self.backdrop.as_mut() {
            Some(backdrop) => match backdrop.reconfigure(&self.container, config) {
                Ok(true) => info!(effect = %kind, "backdrop remounted"),
                Ok(false) => debug!("configuration unchanged; keeping current mount"),
                Err(err) => error!(error = %err, "failed to remount backdrop"),
            },
            None => {
                let factory = GpuSurfaceFactory::new(Arc::clone(&self.container.window));
                match mount_or_blank(factory, &self.container, config) {
                    Ok(Some(backdrop)) => {
                        info!(effect = %kind, "backdrop mounted");
                        self.backdrop = Some(backdrop);
                    }
                    Ok(None) => {}
                    Err(err) => error!(error = %err, "failed to mount backdrop"),
                }
            }
        }
        self.last_frame = None;
        self.container.window.request_redraw();
    }

    fn unmount(&mut self) {
        if let Some(backdrop) = self.backdrop.as_mut() {
            backdrop.unmount();
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed || event.repeat {
            return false;
        }
        match event.logical_key {
            Key::Named(NamedKey::Space) => self.toggle_effect(),
            Key::Named(NamedKey::Escape) => return true,
            Key::Character(ref value) if value.as_str().eq_ignore_ascii_case("r") => self.reload(),
            _ => {}
        }
        false
    }
}

pub fn run(options: WindowOptions) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title("Axl backdrop")
        .with_inner_size(PhysicalSize::new(options.size.width, options.size.height))
        .with_transparent(true)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let container = WindowContainer {
        window: Arc::clone(&window),
        hub: EventHub::new(),
    };
    let factory = GpuSurfaceFactory::new(Arc::clone(&window));
    let backdrop = mount_or_blank(factory, &container, options.file.render_config())
        .context("failed to mount backdrop")?;
    if backdrop.as_ref().is_some_and(|backdrop| !backdrop.is_rendering()) {
        warn!("graphics context unavailable; window will stay blank");
    }

    let mut session = Session {
        container,
        backdrop,
        file: options.file,
        config_path: options.config_path,
        last_frame: None,
    };
    info!(effect = %session.file.effect, "window ready; Space toggles effect, R reloads config");
    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            match event {
                Event::WindowEvent { window_id, event } if window_id == session.container.window.id() => {
                    match event {
                        WindowEvent::CloseRequested => {
                            session.unmount();
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if session.handle_key(&event) {
                                session.unmount();
                                elwt.exit();
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            let bounds = session.container.bounding_rect();
                            session.container.hub.dispatch_pointer(PointerMove {
                                x: position.x as f32,
                                y: position.y as f32,
                                bounds,
                            });
                        }
                        WindowEvent::Resized(size) => {
                            session
                                .container
                                .hub
                                .dispatch_resize(SurfaceSize::new(size.width, size.height));
                            session.container.window.request_redraw();
                        }
                        WindowEvent::RedrawRequested => session.redraw(),
                        _ => {}
                    }
                }
                Event::LoopExiting => session.unmount(),
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop::headless::{HeadlessFactory, HeadlessSurface};
    use backdrop::{BlindsConfig, SurfaceError, VirtualContainer};

    struct BrokenPipelineFactory;

    impl SurfaceFactory for BrokenPipelineFactory {
        type Surface = HeadlessSurface;

        fn create(
            &mut self,
            _container: &dyn Container,
            _size: SurfaceSize,
            _config: &RenderConfig,
        ) -> Result<HeadlessSurface, SurfaceError> {
            Err(SurfaceError::PipelineCompile {
                label: "blinds",
                message: "syntax error".into(),
            })
        }
    }

    #[test]
    fn pipeline_failure_leaves_window_blank() {
        let container = VirtualContainer::new(SurfaceSize::new(64, 64));
        let backdrop =
            mount_or_blank(BrokenPipelineFactory, &container, RenderConfig::default()).unwrap();
        assert!(backdrop.is_none());
        assert_eq!(container.hub().listener_count(), 0);
    }

    #[test]
    fn invalid_config_is_still_an_error() {
        let container = VirtualContainer::new(SurfaceSize::new(64, 64));
        let config = RenderConfig::Blinds(BlindsConfig {
            blind_count: 0,
            ..BlindsConfig::default()
        });
        let err = mount_or_blank(HeadlessFactory::new(), &container, config)
            .err()
            .expect("invalid config");
        assert!(matches!(err, MountError::InvalidConfig(_)));
    }

    #[test]
    fn working_pipeline_mounts() {
        let container = VirtualContainer::new(SurfaceSize::new(64, 64));
        let backdrop =
            mount_or_blank(HeadlessFactory::new(), &container, RenderConfig::default()).unwrap();
        assert!(backdrop.is_some_and(|backdrop| backdrop.is_rendering()));
    }
}
