//! wgpu backend for [`Surface`](crate::surface::Surface).
//!
//! - `context` owns the instance, device, queue and swapchain and rebuilds
//!   swapchain state when the container resizes.
//! - `prism` and `blinds` each compile one GLSL pipeline and know how to
//!   upload their per-frame data.
//! - `uniforms` mirrors the shader uniform blocks and instance layouts.

mod blinds;
mod context;
mod prism;
mod uniforms;

use std::sync::Arc;

use effectconfig::RenderConfig;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};

use crate::container::Container;
use crate::error::{FrameError, SurfaceError};
use crate::surface::{Frame, Surface, SurfaceFactory, SurfaceSize};

use self::blinds::BlindsPipeline;
use self::context::GpuContext;
use self::prism::PrismPipeline;

fn uniform_layout(device: &wgpu::Device, label: &'static str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Creates GPU surfaces presenting into a native window.
///
/// The window itself is the presentation target; the container passed to
/// [`SurfaceFactory::create`] only supplies the size.
pub struct GpuSurfaceFactory<T> {
    target: Arc<T>,
}

impl<T> GpuSurfaceFactory<T>
where
    T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
{
    pub fn new(target: Arc<T>) -> Self {
        Self { target }
    }
}

impl<T> SurfaceFactory for GpuSurfaceFactory<T>
where
    T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
{
    type Surface = GpuSurface;

    fn create(
        &mut self,
        _container: &dyn Container,
        size: SurfaceSize,
        config: &RenderConfig,
    ) -> Result<GpuSurface, SurfaceError> {
        let context = GpuContext::new(Arc::clone(&self.target), size)
            .map_err(|err| SurfaceError::Unavailable(format!("{err:#}")))?;
        let format = context.config.format;
        let pipeline = match config {
            RenderConfig::Prism(_) => EffectPipeline::Prism(PrismPipeline::new(&context.device, format)?),
            RenderConfig::Blinds(blinds) => EffectPipeline::Blinds(BlindsPipeline::new(
                &context.device,
                &context.queue,
                format,
                blinds,
                context.size(),
            )?),
        };
        Ok(GpuSurface {
            context: Some(context),
            pipeline,
        })
    }
}

enum EffectPipeline {
    Prism(PrismPipeline),
    Blinds(BlindsPipeline),
}

impl EffectPipeline {
    fn destroy(&self) {
        match self {
            EffectPipeline::Prism(prism) => prism.destroy(),
            EffectPipeline::Blinds(blinds) => blinds.destroy(),
        }
    }
}

pub struct GpuSurface {
    context: Option<GpuContext>,
    pipeline: EffectPipeline,
}

impl Surface for GpuSurface {
    fn size(&self) -> SurfaceSize {
        self.context
            .as_ref()
            .map(GpuContext::size)
            .unwrap_or_default()
    }

    fn resize(&mut self, size: SurfaceSize) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        context.resize(size);
        if let EffectPipeline::Blinds(blinds) = &mut self.pipeline {
            blinds.resize(&context.queue, context.size());
        }
    }

    fn present(&mut self, frame: Frame<'_>) -> Result<(), FrameError> {
        let context = self.context.as_ref().ok_or(FrameError::SurfaceLost)?;
        if let Some(message) = context.take_error() {
            return Err(FrameError::Device(message));
        }

        match (&mut self.pipeline, frame) {
            (EffectPipeline::Prism(pipeline), Frame::Prism(prism)) => {
                pipeline.set_uniforms(&context.queue, prism);
            }
            (EffectPipeline::Blinds(pipeline), Frame::Blinds(blinds)) => {
                pipeline.prepare(&context.device, &context.queue, blinds);
            }
            (_, other) => return Err(FrameError::Unsupported(other.label())),
        }

        let output = match context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                context.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("surface acquire timed out; skipping frame");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(err) => {
                warn!(error = %err, "failed to acquire surface texture; skipping frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            match &self.pipeline {
                EffectPipeline::Prism(pipeline) => pipeline.render(&mut pass),
                EffectPipeline::Blinds(pipeline) => pipeline.render(&mut pass),
            }
        }
        context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn destroy(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        self.pipeline.destroy();
        context.device.destroy();
        debug!("GPU surface destroyed");
    }
}

impl Drop for GpuSurface {
    fn drop(&mut self) {
        self.destroy();
    }
}
