use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// RGBA colour with components in `[0, 1]`, stored the way CSS hex strings
/// encode them (no gamma conversion).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn from_hex(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{raw}': expected hex digits"));
        }

        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|ch| [ch, ch]).collect(),
            6 | 8 => digits.to_string(),
            len => {
                return Err(format!(
                    "invalid colour '{raw}': expected 3, 4, 6 or 8 hex digits, found {len}"
                ))
            }
        };

        let channel = |index: usize| -> Result<f32, String> {
            u8::from_str_radix(&expanded[index * 2..index * 2 + 2], 16)
                .map(|value| value as f32 / 255.0)
                .map_err(|err| format!("invalid colour '{raw}': {err}"))
        };

        let alpha = if expanded.len() == 8 { channel(3)? } else { 1.0 };
        Ok(Self::rgba(channel(0)?, channel(1)?, channel(2)?, alpha))
    }

    pub fn to_hex(&self) -> String {
        let quantize = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        );
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Color;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a hex colour string such as \"#5227FF\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Color::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShineDirection {
    #[default]
    Left,
    Right,
}

/// How panels are composited over whatever is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    Normal,
    #[default]
    Lighten,
    Screen,
    Multiply,
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    #[default]
    Rotate,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Prism,
    #[default]
    Blinds,
}

impl EffectKind {
    pub fn toggled(self) -> Self {
        match self {
            EffectKind::Prism => EffectKind::Blinds,
            EffectKind::Blinds => EffectKind::Prism,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::Prism => f.write_str("prism"),
            EffectKind::Blinds => f.write_str("blinds"),
        }
    }
}

/// Upper bound on `blinds.blind_count`; panel buffers are sized from it.
pub const MAX_BLIND_COUNT: u32 = 4096;

/// Parameters of the pointer-reactive panel effect.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlindsConfig {
    pub gradient_colors: Vec<Color>,
    /// Gradient direction in degrees, CSS convention (0 = bottom to top).
    pub angle: f32,
    pub noise: f32,
    pub blind_count: u32,
    /// Minimum panel width as a percentage of the container width.
    pub blind_min_width: f32,
    pub spotlight_radius: f32,
    /// Carried for config identity; the spotlight falloff is linear.
    pub spotlight_softness: f32,
    pub spotlight_opacity: f32,
    pub mouse_dampening: f32,
    /// Maximum skew, in degrees, applied as per-tick jitter.
    pub distort_amount: f32,
    pub shine_direction: ShineDirection,
    pub blend_mode: BlendMode,
}

impl Default for BlindsConfig {
    fn default() -> Self {
        Self {
            gradient_colors: vec![
                Color::rgba(1.0, 159.0 / 255.0, 252.0 / 255.0, 1.0),
                Color::rgba(82.0 / 255.0, 39.0 / 255.0, 1.0, 1.0),
            ],
            angle: 0.0,
            noise: 0.3,
            blind_count: 12,
            blind_min_width: 50.0,
            spotlight_radius: 0.5,
            spotlight_softness: 1.0,
            spotlight_opacity: 1.0,
            mouse_dampening: 0.15,
            distort_amount: 0.0,
            shine_direction: ShineDirection::Left,
            blend_mode: BlendMode::Lighten,
        }
    }
}

impl BlindsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gradient_colors.is_empty() {
            return Err(ConfigError::Invalid(
                "blinds.gradient_colors must contain at least one colour".into(),
            ));
        }
        if self.blind_count == 0 {
            return Err(ConfigError::Invalid(
                "blinds.blind_count must be greater than zero".into(),
            ));
        }
        if self.blind_count > MAX_BLIND_COUNT {
            return Err(ConfigError::Invalid(format!(
                "blinds.blind_count must be at most {MAX_BLIND_COUNT}, found {}",
                self.blind_count
            )));
        }
        ensure_finite("blinds.angle", self.angle)?;
        ensure_range("blinds.noise", self.noise, 0.0, 1.0)?;
        ensure_range("blinds.blind_min_width", self.blind_min_width, 0.0, 100.0)?;
        ensure_finite("blinds.spotlight_radius", self.spotlight_radius)?;
        if self.spotlight_radius <= 0.0 {
            return Err(ConfigError::Invalid(
                "blinds.spotlight_radius must be greater than zero".into(),
            ));
        }
        ensure_finite("blinds.spotlight_softness", self.spotlight_softness)?;
        if self.spotlight_softness < 0.0 {
            return Err(ConfigError::Invalid(
                "blinds.spotlight_softness must be >= 0".into(),
            ));
        }
        ensure_range("blinds.spotlight_opacity", self.spotlight_opacity, 0.0, 1.0)?;
        ensure_finite("blinds.mouse_dampening", self.mouse_dampening)?;
        if self.mouse_dampening <= 0.0 || self.mouse_dampening > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "blinds.mouse_dampening must be in (0, 1], found {}",
                self.mouse_dampening
            )));
        }
        ensure_finite("blinds.distort_amount", self.distort_amount)?;
        if self.distort_amount < 0.0 {
            return Err(ConfigError::Invalid(
                "blinds.distort_amount must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the shader-driven rotating solid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrismConfig {
    pub animation_type: AnimationType,
    pub time_scale: f32,
    pub height: f32,
    pub base_width: f32,
    pub scale: f32,
    pub hue_shift: f32,
    pub color_frequency: f32,
    pub noise: f32,
    pub glow: f32,
    /// Enables per-vertex noise displacement of the solid.
    pub displacement: bool,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            animation_type: AnimationType::Rotate,
            time_scale: 0.5,
            height: 3.5,
            base_width: 5.5,
            scale: 3.6,
            hue_shift: 0.0,
            color_frequency: 1.0,
            noise: 0.5,
            glow: 1.0,
            displacement: false,
        }
    }
}

impl PrismConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("prism.time_scale", self.time_scale)?;
        ensure_positive("prism.height", self.height)?;
        ensure_positive("prism.base_width", self.base_width)?;
        ensure_positive("prism.scale", self.scale)?;
        ensure_finite("prism.hue_shift", self.hue_shift)?;
        ensure_finite("prism.color_frequency", self.color_frequency)?;
        ensure_range("prism.noise", self.noise, 0.0, 1.0)?;
        ensure_finite("prism.glow", self.glow)?;
        if self.glow < 0.0 {
            return Err(ConfigError::Invalid("prism.glow must be >= 0".into()));
        }
        Ok(())
    }

    /// Non-uniform scale applied to the unit cuboid.
    pub fn mesh_scale(&self) -> [f32; 3] {
        [
            self.scale,
            self.scale * self.height / self.base_width,
            self.scale,
        ]
    }
}

/// Immutable snapshot of everything one mount needs. Any difference between
/// two snapshots means the mount must be torn down and rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "lowercase")]
pub enum RenderConfig {
    Prism(PrismConfig),
    Blinds(BlindsConfig),
}

impl RenderConfig {
    pub fn kind(&self) -> EffectKind {
        match self {
            RenderConfig::Prism(_) => EffectKind::Prism,
            RenderConfig::Blinds(_) => EffectKind::Blinds,
        }
    }

    /// Multiplier applied to wall-clock time before it reaches the effect.
    pub fn time_scale(&self) -> f32 {
        match self {
            RenderConfig::Prism(prism) => prism.time_scale,
            RenderConfig::Blinds(_) => 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            RenderConfig::Prism(prism) => prism.validate(),
            RenderConfig::Blinds(blinds) => blinds.validate(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig::Blinds(BlindsConfig::default())
    }
}

/// On-disk configuration: the selected effect plus parameters for both.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectFile {
    pub effect: EffectKind,
    pub blinds: BlindsConfig,
    pub prism: PrismConfig,
}

impl EffectFile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EffectFile = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Both parameter tables are validated, not only the selected one, so a
    /// later effect toggle cannot surface a latent error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.blinds.validate()?;
        self.prism.validate()?;
        Ok(())
    }

    pub fn render_config(&self) -> RenderConfig {
        self.render_config_for(self.effect)
    }

    pub fn render_config_for(&self, kind: EffectKind) -> RenderConfig {
        match kind {
            EffectKind::Prism => RenderConfig::Prism(self.prism.clone()),
            EffectKind::Blinds => RenderConfig::Blinds(self.blinds.clone()),
        }
    }
}

fn ensure_finite(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a finite number")))
    }
}

fn ensure_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be greater than zero, found {value}"
        )))
    }
}

fn ensure_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    ensure_finite(name, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be within [{min}, {max}], found {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
effect = "prism"

[blinds]
gradient_colors = ["#FF9FFC", "#5227FF", "#0f0"]
blind_count = 16
blind_min_width = 40
shine_direction = "right"
blend_mode = "screen"
distort_amount = 4.5

[prism]
animation_type = "static"
time_scale = 1.25
hue_shift = 0.3
displacement = true
"##;

    #[test]
    fn parses_sample_config() {
        let file = EffectFile::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(file.effect, EffectKind::Prism);
        assert_eq!(file.blinds.gradient_colors.len(), 3);
        assert_eq!(file.blinds.blind_count, 16);
        assert_eq!(file.blinds.shine_direction, ShineDirection::Right);
        assert_eq!(file.blinds.blend_mode, BlendMode::Screen);
        assert_eq!(file.blinds.mouse_dampening, 0.15);
        assert_eq!(file.prism.animation_type, AnimationType::Static);
        assert!(file.prism.displacement);
        assert_eq!(file.prism.scale, 3.6);

        match file.render_config() {
            RenderConfig::Prism(prism) => assert_eq!(prism.time_scale, 1.25),
            other => panic!("expected prism config, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = EffectFile::from_toml_str("").unwrap();
        assert_eq!(file, EffectFile::default());
        assert_eq!(file.render_config().kind(), EffectKind::Blinds);
        assert_eq!(file.blinds.gradient_colors[0].to_hex(), "#FF9FFC");
        assert_eq!(file.blinds.gradient_colors[1].to_hex(), "#5227FF");
    }

    #[test]
    fn parses_hex_colours() {
        let short = Color::from_hex("#0f08").unwrap();
        assert_eq!(short, Color::rgba(0.0, 1.0, 0.0, 136.0 / 255.0));
        let long = Color::from_hex("5227FF").unwrap();
        assert_eq!(long.to_hex(), "#5227FF");
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
    }

    #[test]
    fn rejects_zero_blind_count() {
        let err = EffectFile::from_toml_str("[blinds]\nblind_count = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn caps_blind_count() {
        let huge = BlindsConfig {
            blind_count: u32::MAX,
            ..BlindsConfig::default()
        };
        assert!(matches!(huge.validate(), Err(ConfigError::Invalid(_))));

        let input = format!("[blinds]\nblind_count = {}\n", MAX_BLIND_COUNT + 1);
        assert!(EffectFile::from_toml_str(&input).is_err());

        let at_limit = BlindsConfig {
            blind_count: MAX_BLIND_COUNT,
            ..BlindsConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn rejects_dampening_outside_unit_interval() {
        for value in ["0.0", "1.5", "-0.2"] {
            let input = format!("[blinds]\nmouse_dampening = {value}\n");
            let err = EffectFile::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "value {value}");
        }
        assert!(EffectFile::from_toml_str("[blinds]\nmouse_dampening = 1.0\n").is_ok());
    }

    #[test]
    fn rejects_non_positive_time_scale() {
        let err = EffectFile::from_toml_str("[prism]\ntime_scale = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = EffectFile::from_toml_str("[blinds]\nblindCount = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_empty_gradient() {
        let err = EffectFile::from_toml_str("[blinds]\ngradient_colors = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn serialized_file_round_trips() {
        let file = EffectFile::from_toml_str(SAMPLE).unwrap();
        let rendered = file.to_toml_string().unwrap();
        assert_eq!(EffectFile::from_toml_str(&rendered).unwrap(), file);
    }

    #[test]
    fn mesh_scale_follows_aspect() {
        let prism = PrismConfig::default();
        let [x, y, z] = prism.mesh_scale();
        assert_eq!(x, 3.6);
        assert_eq!(z, 3.6);
        assert!((y - 3.6 * 3.5 / 5.5).abs() < 1e-6);
    }

    #[test]
    fn config_change_is_detected() {
        let base = RenderConfig::Blinds(BlindsConfig::default());
        let mut changed = BlindsConfig::default();
        changed.spotlight_softness = 2.0;
        assert_ne!(base, RenderConfig::Blinds(changed));
        assert_eq!(base, RenderConfig::default());
    }
}
