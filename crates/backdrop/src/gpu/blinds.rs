use effectconfig::{BlendMode, BlindsConfig};
use wgpu::naga::ShaderStage;

use crate::blinds::BlindsFrame;
use crate::compile::{build_checked, compile_glsl, BLINDS_FRAGMENT_GLSL, BLINDS_VERTEX_GLSL};
use crate::error::SurfaceError;
use crate::surface::SurfaceSize;

use super::uniforms::{BlindsUniformBlock, PanelInstance};

/// Fixed-function blend state for a CSS-like blend mode over premultiplied
/// colour.
pub(crate) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    use wgpu::{BlendComponent, BlendFactor, BlendOperation};

    let over_alpha = BlendComponent {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };
    let color = match mode {
        BlendMode::Normal => over_alpha,
        BlendMode::Lighten => BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Max,
        },
        BlendMode::Screen => BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::OneMinusSrc,
            operation: BlendOperation::Add,
        },
        BlendMode::Multiply => BlendComponent {
            src_factor: BlendFactor::Dst,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        },
        BlendMode::Additive => BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        },
    };
    wgpu::BlendState {
        color,
        alpha: over_alpha,
    }
}

pub(crate) struct BlindsPipeline {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    block: BlindsUniformBlock,
    bind_group: wgpu::BindGroup,
    instances: wgpu::Buffer,
    capacity: usize,
    staged: Vec<PanelInstance>,
    drawn: u32,
}

impl BlindsPipeline {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        config: &BlindsConfig,
        size: SurfaceSize,
    ) -> Result<Self, SurfaceError> {
        let blend = blend_state(config.blend_mode);
        let (pipeline, layout) = build_checked(device, "blinds", || {
            let vertex =
                compile_glsl(device, "blinds vertex", BLINDS_VERTEX_GLSL, ShaderStage::Vertex);
            let fragment = compile_glsl(
                device,
                "blinds fragment",
                BLINDS_FRAGMENT_GLSL,
                ShaderStage::Fragment,
            );
            let layout = super::uniform_layout(device, "blinds uniform layout");
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("blinds pipeline layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("blinds pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some("main"),
                    buffers: &[PanelInstance::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            });
            (pipeline, layout)
        })?;

        let block = BlindsUniformBlock::new(config, size);
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blinds uniforms"),
            size: std::mem::size_of::<BlindsUniformBlock>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&uniforms, 0, bytemuck::bytes_of(&block));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blinds bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        let capacity = config.blind_count.max(1) as usize;
        let instances = create_instance_buffer(device, capacity);

        Ok(Self {
            pipeline,
            uniforms,
            block,
            bind_group,
            instances,
            capacity,
            staged: Vec::with_capacity(capacity),
            drawn: 0,
        })
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, size: SurfaceSize) {
        self.block.set_size(size);
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&self.block));
    }

    /// Uploads this tick's panels.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &BlindsFrame) {
        let width = self.block.surface[0];
        self.staged.clear();
        self.staged.extend(
            frame
                .panels
                .iter()
                .map(|panel| PanelInstance::from_panel(panel, width)),
        );
        if self.staged.len() > self.capacity {
            self.instances.destroy();
            self.capacity = self.staged.len();
            self.instances = create_instance_buffer(device, self.capacity);
        }
        if !self.staged.is_empty() {
            queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(&self.staged));
        }
        self.drawn = self.staged.len() as u32;
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.drawn == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instances.slice(..));
        pass.draw(0..6, 0..self.drawn);
    }

    pub fn destroy(&self) {
        self.uniforms.destroy();
        self.instances.destroy();
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("blinds panels"),
        size: (capacity * std::mem::size_of::<PanelInstance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_uses_max_with_unit_factors() {
        let state = blend_state(BlendMode::Lighten);
        assert_eq!(state.color.operation, wgpu::BlendOperation::Max);
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn normal_is_premultiplied_over() {
        assert_eq!(
            blend_state(BlendMode::Normal),
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING
        );
    }

    #[test]
    fn alpha_channel_always_composites_over() {
        for mode in [
            BlendMode::Normal,
            BlendMode::Lighten,
            BlendMode::Screen,
            BlendMode::Multiply,
            BlendMode::Additive,
        ] {
            assert_eq!(
                blend_state(mode).alpha.dst_factor,
                wgpu::BlendFactor::OneMinusSrcAlpha
            );
        }
    }
}
