use effectconfig::ConfigError;

/// Failures while creating the presentation surface for a mount.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// No graphics context could be created for the container. The mount
    /// degrades to rendering nothing.
    #[error("rendering surface unavailable: {0}")]
    Unavailable(String),
    /// A shader program failed to build. Fatal for the effect instance.
    #[error("failed to build {label} pipeline: {message}")]
    PipelineCompile { label: &'static str, message: String },
}

/// Failures raised while producing a single frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("GPU device error: {0}")]
    Device(String),
    #[error("surface out of memory")]
    OutOfMemory,
    #[error("surface was released while a frame was in flight")]
    SurfaceLost,
    #[error("surface cannot present a {0} frame")]
    Unsupported(&'static str),
}

/// Errors surfaced to the host when mounting or reconfiguring an effect.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(SurfaceError),
}
