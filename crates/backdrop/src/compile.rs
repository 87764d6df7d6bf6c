use std::borrow::Cow;

use tracing::debug;
use wgpu::naga::ShaderStage;

use crate::error::SurfaceError;

/// Compiles a GLSL module. Errors surface through the caller's error scope.
pub(crate) fn compile_glsl(
    device: &wgpu::Device,
    label: &'static str,
    source: &'static str,
    stage: ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    })
}

/// Runs `build` inside a validation error scope so that shader and pipeline
/// errors come back as a value instead of reaching the uncaptured handler.
pub(crate) fn build_checked<T>(
    device: &wgpu::Device,
    label: &'static str,
    build: impl FnOnce() -> T,
) -> Result<T, SurfaceError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let built = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => {
            debug!(label, "pipeline built");
            Ok(built)
        }
        Some(err) => Err(SurfaceError::PipelineCompile {
            label,
            message: err.to_string(),
        }),
    }
}

/// Prism vertex stage. The uniform block layout must match
/// `PrismUniformBlock` in `gpu/uniforms.rs`.
pub(crate) const PRISM_VERTEX_GLSL: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform PrismParams {
    mat4 view_proj;
    mat4 model;
    float time;
    float hue_shift;
    float color_frequency;
    float glow;
    float noise;
    float displacement;
    vec2 _padding;
} params;

layout(location = 0) in vec3 a_position;
layout(location = 0) out vec3 v_position;
layout(location = 1) out float v_noise;

void main() {
    vec3 pos = a_position;
    float n = 0.0;
    if (params.displacement > 0.5) {
        n = fract(sin(dot(vec3(params.time), pos)) * 43758.5453 + params.time) * params.noise;
        pos += normalize(pos) * n * 0.1;
    }
    v_position = pos;
    v_noise = n;
    gl_Position = params.view_proj * params.model * vec4(pos, 1.0);
}
";

pub(crate) const PRISM_FRAGMENT_GLSL: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform PrismParams {
    mat4 view_proj;
    mat4 model;
    float time;
    float hue_shift;
    float color_frequency;
    float glow;
    float noise;
    float displacement;
    vec2 _padding;
} params;

layout(location = 0) in vec3 v_position;
layout(location = 1) in float v_noise;
layout(location = 0) out vec4 out_color;

vec3 hsv_to_rgb(float h, float s, float v) {
    float hue = fract(h) * 6.0;
    float sector = floor(hue);
    float f = hue - sector;
    float p = v * (1.0 - s);
    float q = v * (1.0 - f * s);
    float t = v * (1.0 - (1.0 - f) * s);
    vec3 rgb;
    if (sector < 1.0) {
        rgb = vec3(v, t, p);
    } else if (sector < 2.0) {
        rgb = vec3(q, v, p);
    } else if (sector < 3.0) {
        rgb = vec3(p, v, t);
    } else if (sector < 4.0) {
        rgb = vec3(p, q, v);
    } else if (sector < 5.0) {
        rgb = vec3(t, p, v);
    } else {
        rgb = vec3(v, p, q);
    }
    return clamp(rgb, vec3(0.0), vec3(1.0));
}

void main() {
    float time = params.time;
    float h = (v_position.x + v_position.y + time * 0.1) * params.color_frequency + params.hue_shift;
    float s = 0.8 + v_noise * 0.2;
    float v = 0.9 + 0.1 * sin(time + v_position.z);
    float glow_factor = 1.0 + params.glow * (0.5 + 0.5 * sin(time));
    vec3 color = hsv_to_rgb(h, s, v) * glow_factor;
    float alpha = 0.7 + 0.3 * sin(v_position.y + time);
    out_color = vec4(color * alpha, alpha);
}
";

/// Blinds vertex stage: one instanced quad per panel, in pixel space with a
/// top-left origin, sheared around the panel centre like CSS `skewX`.
pub(crate) const BLINDS_VERTEX_GLSL: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform BlindsParams {
    vec4 colors[8];
    vec4 surface;
} params;

layout(location = 0) in vec4 i_rect;
layout(location = 1) in vec4 i_shape;

layout(location = 0) out vec2 v_local;
layout(location = 1) out vec2 v_size;
layout(location = 2) out float v_opacity;
layout(location = 3) out float v_brightness;

// Two triangles: (0,0) (1,0) (1,1) and (0,0) (1,1) (0,1).
vec2 quad_corner(int index) {
    float x = (index == 1 || index == 2 || index == 4) ? 1.0 : 0.0;
    float y = (index == 2 || index == 4 || index == 5) ? 1.0 : 0.0;
    return vec2(x, y);
}

void main() {
    vec2 corner = quad_corner(gl_VertexIndex);
    float width = params.surface.x;
    float height = params.surface.y;
    vec2 size = vec2(i_rect.y, height);
    vec2 local = (corner - vec2(0.5)) * size;

    float x = i_rect.x + size.x * 0.5 + local.x + i_shape.x * local.y;
    float y = height * 0.5 + local.y;

    v_local = local;
    v_size = size;
    v_opacity = i_rect.z;
    v_brightness = i_rect.w;
    gl_Position = vec4(x / width * 2.0 - 1.0, 1.0 - y / height * 2.0, 0.0, 1.0);
}
";

/// Blinds fragment stage: CSS-style `linear-gradient(angle, colors...)`
/// across the panel box, then brightness and opacity. Output is
/// premultiplied.
pub(crate) const BLINDS_FRAGMENT_GLSL: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform BlindsParams {
    vec4 colors[8];
    vec4 surface;
} params;

layout(location = 0) in vec2 v_local;
layout(location = 1) in vec2 v_size;
layout(location = 2) in float v_opacity;
layout(location = 3) in float v_brightness;
layout(location = 0) out vec4 out_color;

vec4 gradient_at(float t) {
    int count = int(params.surface.z);
    if (count <= 1) {
        return params.colors[0];
    }
    float scaled = clamp(t, 0.0, 1.0) * float(count - 1);
    int index = int(floor(scaled));
    if (index >= count - 1) {
        return params.colors[count - 1];
    }
    return mix(params.colors[index], params.colors[index + 1], scaled - float(index));
}

void main() {
    float angle = params.surface.w;
    vec2 direction = vec2(sin(angle), -cos(angle));
    float line = abs(v_size.x * sin(angle)) + abs(v_size.y * cos(angle));
    float t = dot(v_local, direction) / max(line, 0.0001) + 0.5;

    vec4 color = gradient_at(t);
    vec3 rgb = clamp(color.rgb * v_brightness, vec3(0.0), vec3(1.0));
    float alpha = color.a * v_opacity;
    out_color = vec4(rgb * alpha, alpha);
}
";
