//! CPU reference for the prism fragment shader colour math.
//!
//! The GLSL in `gpu::compile` evaluates the same expressions per fragment;
//! keeping a Rust copy lets the formula be checked without a GPU.

use glam::{Vec3, Vec4};

use crate::prism::PrismUniforms;

/// Six-sector HSV to RGB conversion. Hue wraps modulo 1; outputs are clamped
/// to `[0, 1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let hue = (h - h.floor()) * 6.0;
    let sector = hue.floor();
    let f = hue - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    let rgb = match sector as i32 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    };
    rgb.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Brightness multiplier applied on top of the HSV colour.
pub fn glow_factor(glow: f32, time: f32) -> f32 {
    1.0 + glow * (0.5 + 0.5 * time.sin())
}

/// Colour and alpha of the solid at an object-space `position`.
///
/// `vertex_noise` is the displacement noise carried from the vertex stage
/// (zero when displacement is off).
pub fn prism_shade(position: Vec3, uniforms: &PrismUniforms, vertex_noise: f32) -> Vec4 {
    let time = uniforms.time;
    let h = (position.x + position.y + time * 0.1) * uniforms.color_frequency + uniforms.hue_shift;
    let s = 0.8 + vertex_noise * 0.2;
    let v = 0.9 + 0.1 * (time + position.z).sin();

    let color = hsv_to_rgb(h, s, v) * glow_factor(uniforms.glow, time);
    let alpha = 0.7 + 0.3 * (position.y + time).sin();
    color.extend(alpha)
}
