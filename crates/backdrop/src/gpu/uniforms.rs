use bytemuck::{Pod, Zeroable};
use effectconfig::BlindsConfig;

use crate::blinds::Panel;
use crate::prism::PrismFrame;
use crate::surface::SurfaceSize;

/// Colour stops the blinds shader can address.
pub(crate) const MAX_GRADIENT_STOPS: usize = 8;

/// std140 mirror of `PrismParams` in the prism shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct PrismUniformBlock {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub time: f32,
    pub hue_shift: f32,
    pub color_frequency: f32,
    pub glow: f32,
    pub noise: f32,
    pub displacement: f32,
    pub _padding: [f32; 2],
}

impl PrismUniformBlock {
    pub fn from_frame(frame: &PrismFrame) -> Self {
        let uniforms = frame.uniforms;
        Self {
            view_proj: frame.camera.view_projection().to_cols_array_2d(),
            model: frame.model.to_cols_array_2d(),
            time: uniforms.time,
            hue_shift: uniforms.hue_shift,
            color_frequency: uniforms.color_frequency,
            glow: uniforms.glow,
            noise: uniforms.noise,
            displacement: if frame.displacement { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        }
    }
}

/// std140 mirror of `BlindsParams`: gradient stops plus
/// `(width, height, stop count, angle in radians)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct BlindsUniformBlock {
    pub colors: [[f32; 4]; MAX_GRADIENT_STOPS],
    pub surface: [f32; 4],
}

impl BlindsUniformBlock {
    pub fn new(config: &BlindsConfig, size: SurfaceSize) -> Self {
        let mut colors = [[0.0; 4]; MAX_GRADIENT_STOPS];
        let stops = config.gradient_colors.len().min(MAX_GRADIENT_STOPS);
        if config.gradient_colors.len() > MAX_GRADIENT_STOPS {
            tracing::warn!(
                stops = config.gradient_colors.len(),
                max = MAX_GRADIENT_STOPS,
                "gradient has more stops than the shader supports; extra stops ignored"
            );
        }
        for (slot, color) in colors.iter_mut().zip(&config.gradient_colors) {
            *slot = color.to_array();
        }
        let mut block = Self {
            colors,
            surface: [0.0, 0.0, stops as f32, config.angle.to_radians()],
        };
        block.set_size(size);
        block
    }

    pub fn set_size(&mut self, size: SurfaceSize) {
        let size = size.at_least_one();
        self.surface[0] = size.width as f32;
        self.surface[1] = size.height as f32;
    }
}

/// Per-instance panel data: `rect = (left px, width px, opacity,
/// brightness)`, `shape.x = tan(skew)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct PanelInstance {
    pub rect: [f32; 4],
    pub shape: [f32; 4],
}

impl PanelInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];

    pub fn from_panel(panel: &Panel, width: f32) -> Self {
        Self {
            rect: [
                panel.left_pct / 100.0 * width,
                panel.width_pct / 100.0 * width,
                panel.opacity,
                panel.brightness,
            ],
            shape: [panel.skew_deg.to_radians().tan(), 0.0, 0.0, 0.0],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
