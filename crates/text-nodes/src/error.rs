/// Errors produced while parsing hex color strings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Wrong length or missing leading `#`.
    #[error("color expected in hex format with preceding \"#\", e.g. #00ff00; got {0:?}")]
    InvalidFormat(String),

    /// Right shape, but the digits are not hexadecimal.
    #[error("color {0:?} contains non-hexadecimal digits")]
    InvalidDigits(String),
}

/// Errors surfaced by the render pipeline and its graphics context.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// `render` was called before `load`.
    #[error("text node program used before load()")]
    NotLoaded,

    /// The program does not declare an attribute or uniform with this name.
    #[error("unknown shader location: {0}")]
    UnknownLocation(String),

    /// Shader compilation or pipeline creation failed.
    #[error("shader error: {0}")]
    Shader(String),
}
