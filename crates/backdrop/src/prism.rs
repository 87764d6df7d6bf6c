//! CPU side of the rotating prism: geometry, camera, uniforms and transforms.

use effectconfig::{AnimationType, PrismConfig};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Cube spanning `[-1, 1]` on every axis, four vertices per face so every
/// face can be addressed on its own. The shading reads these object-space
/// coordinates, so the extent is part of the colour formula.
pub const CUBOID_POSITIONS: [[f32; 3]; 24] = [
    // +X
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
    // -X
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    // +Y
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    // -Y
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    // +Z
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    // -Z
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
];

pub const CUBOID_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, // +X
    4, 5, 6, 4, 6, 7, // -X
    8, 9, 10, 8, 10, 11, // +Y
    12, 13, 14, 12, 14, 15, // -Y
    16, 17, 18, 16, 18, 19, // +Z
    20, 21, 22, 20, 22, 23, // -Z
];

pub const CAMERA_FOV_Y_DEGREES: f32 = 45.0;
pub const CAMERA_DISTANCE: f32 = 8.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;

/// Per-frame shader parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrismUniforms {
    pub time: f32,
    pub hue_shift: f32,
    pub color_frequency: f32,
    pub glow: f32,
    pub noise: f32,
}

/// Perspective camera on the +Z axis looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y: f32,
    pub eye: Vec3,
    pub near: f32,
    pub far: f32,
    aspect: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y: CAMERA_FOV_Y_DEGREES.to_radians(),
            eye: Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            aspect: sanitize_aspect(aspect),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Rotation of the solid at scaled time `time`, as `(x, y, z)` radians.
pub fn rotation_at(animation: AnimationType, time: f32) -> Vec3 {
    match animation {
        AnimationType::Rotate => Vec3::new(time * 0.3, time * 0.5, 0.0),
        AnimationType::Static => Vec3::ZERO,
    }
}

/// Pseudo-random per-vertex noise used by the displacement variant.
pub fn displacement_noise(position: Vec3, time: f32, noise: f32) -> f32 {
    let seed = (Vec3::splat(time).dot(position)).sin() * 43758.5453 + time;
    (seed - seed.floor()) * noise
}

/// Pushes `position` outward along its direction by the vertex noise.
/// Returns the displaced position together with the noise value.
pub fn displace(position: Vec3, time: f32, noise: f32) -> (Vec3, f32) {
    let n = displacement_noise(position, time, noise);
    (position + position.normalize_or_zero() * n * 0.1, n)
}

/// Everything the backend needs to draw one prism frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrismFrame {
    pub uniforms: PrismUniforms,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub model: Mat4,
    pub camera: Camera,
    pub displacement: bool,
}

pub struct PrismEffect {
    animation: AnimationType,
    hue_shift: f32,
    color_frequency: f32,
    glow: f32,
    noise: f32,
    scale: Vec3,
    frame: PrismFrame,
}

impl PrismEffect {
    pub fn new(config: &PrismConfig, aspect: f32) -> Self {
        let scale = Vec3::from(config.mesh_scale());
        let mut effect = Self {
            animation: config.animation_type,
            hue_shift: config.hue_shift,
            color_frequency: config.color_frequency,
            glow: config.glow,
            noise: config.noise,
            scale,
            frame: PrismFrame {
                uniforms: PrismUniforms::default(),
                rotation: Vec3::ZERO,
                model: Mat4::from_scale(scale),
                camera: Camera::new(aspect),
                displacement: config.displacement,
            },
        };
        effect.update(0.0);
        effect
    }

    pub fn set_uniforms(
        &mut self,
        time: f32,
        hue_shift: f32,
        color_frequency: f32,
        glow: f32,
        noise: f32,
    ) {
        self.frame.uniforms = PrismUniforms {
            time,
            hue_shift,
            color_frequency,
            glow,
            noise,
        };
    }

    /// Refreshes uniforms and the model transform for scaled time `time`.
    pub fn update(&mut self, time: f32) {
        self.set_uniforms(
            time,
            self.hue_shift,
            self.color_frequency,
            self.glow,
            self.noise,
        );
        let rotation = rotation_at(self.animation, time);
        let orientation = Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z);
        self.frame.rotation = rotation;
        self.frame.model = Mat4::from_scale_rotation_translation(self.scale, orientation, Vec3::ZERO);
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.frame.camera
    }

    pub fn frame(&self) -> &PrismFrame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_indices_reference_every_vertex() {
        let mut used = [false; 24];
        for index in CUBOID_INDICES {
            used[index as usize] = true;
        }
        assert!(used.iter().all(|used| *used));
        assert_eq!(CUBOID_INDICES.len() / 3, 12);
    }

    #[test]
    fn cuboid_spans_minus_one_to_one() {
        let extent = CUBOID_POSITIONS
            .iter()
            .flatten()
            .fold(0.0_f32, |max, value| max.max(value.abs()));
        assert_eq!(extent, 1.0);
        for position in CUBOID_POSITIONS {
            assert!(position.iter().all(|value| value.abs() == 1.0));
        }
    }

    #[test]
    fn cuboid_triangles_wind_counter_clockwise_outward() {
        for triangle in CUBOID_INDICES.chunks(3) {
            let [a, b, c] = [0usize, 1, 2].map(|i| Vec3::from(CUBOID_POSITIONS[triangle[i] as usize]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "inward triangle {triangle:?}");
        }
    }

    #[test]
    fn rotation_follows_animation_type() {
        assert_eq!(
            rotation_at(AnimationType::Rotate, 2.0),
            Vec3::new(0.6, 1.0, 0.0)
        );
        assert_eq!(rotation_at(AnimationType::Static, 2.0), Vec3::ZERO);
    }

    #[test]
    fn update_writes_uniforms_and_scaled_model() {
        let config = PrismConfig {
            animation_type: AnimationType::Static,
            hue_shift: 0.2,
            ..PrismConfig::default()
        };
        let mut effect = PrismEffect::new(&config, 16.0 / 9.0);
        effect.update(1.5);

        let frame = effect.frame();
        assert_eq!(frame.uniforms.time, 1.5);
        assert_eq!(frame.uniforms.hue_shift, 0.2);
        assert_eq!(frame.uniforms.noise, config.noise);
        let corner = frame.model.transform_point3(Vec3::ONE);
        let [sx, sy, sz] = config.mesh_scale();
        assert!((corner - Vec3::new(sx, sy, sz)).length() < 1e-5);
    }

    #[test]
    fn camera_projects_origin_to_screen_center() {
        let camera = Camera::new(2.0);
        let clip = camera.view_projection() * Vec3::ZERO.extend(1.0);
        assert!(clip.x.abs() < 1e-6);
        assert!(clip.y.abs() < 1e-6);
        assert!((clip.w - CAMERA_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn invalid_aspect_falls_back_to_square() {
        let mut camera = Camera::new(0.0);
        assert_eq!(camera.aspect(), 1.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect(), 1.0);
        camera.set_aspect(1.25);
        assert_eq!(camera.aspect(), 1.25);
    }

    #[test]
    fn displacement_stays_within_noise_band() {
        for step in 0..40 {
            let position = Vec3::from(CUBOID_POSITIONS[step % 24]);
            let time = step as f32 * 0.37;
            let (displaced, n) = displace(position, time, 0.5);
            assert!((0.0..0.5).contains(&n));
            let offset = (displaced - position).length();
            assert!(offset <= 0.05 + 1e-6);
        }
    }
}
