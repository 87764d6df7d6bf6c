use wgpu::naga::ShaderStage;
use wgpu::util::DeviceExt;

use crate::compile::{build_checked, compile_glsl, PRISM_FRAGMENT_GLSL, PRISM_VERTEX_GLSL};
use crate::error::SurfaceError;
use crate::prism::{PrismFrame, CUBOID_INDICES, CUBOID_POSITIONS};

use super::uniforms::PrismUniformBlock;

/// Both sides of every face are drawn and blended in index order, so the far
/// faces show through the translucent near ones.
fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

pub(crate) struct PrismPipeline {
    pipeline: wgpu::RenderPipeline,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl PrismPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Result<Self, SurfaceError> {
        let (pipeline, layout) = build_checked(device, "prism", || {
            let vertex = compile_glsl(device, "prism vertex", PRISM_VERTEX_GLSL, ShaderStage::Vertex);
            let fragment = compile_glsl(
                device,
                "prism fragment",
                PRISM_FRAGMENT_GLSL,
                ShaderStage::Fragment,
            );
            let layout = super::uniform_layout(device, "prism uniform layout");
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("prism pipeline layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("prism pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some("main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: primitive_state(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            });
            (pipeline, layout)
        })?;

        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prism vertices"),
            contents: bytemuck::cast_slice(&CUBOID_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prism indices"),
            contents: bytemuck::cast_slice(&CUBOID_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prism uniforms"),
            size: std::mem::size_of::<PrismUniformBlock>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            vertices,
            indices,
            uniforms,
            bind_group,
        })
    }

    pub fn set_uniforms(&self, queue: &wgpu::Queue, frame: &PrismFrame) {
        let block = PrismUniformBlock::from_frame(frame);
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&block));
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..CUBOID_INDICES.len() as u32, 0, 0..1);
    }

    pub fn destroy(&self) {
        self.vertices.destroy();
        self.indices.destroy();
        self.uniforms.destroy();
    }
}
