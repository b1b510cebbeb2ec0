/// Errors surfaced while setting up a scene.
///
/// Drawing never fails: an unloaded sprite or an empty grid cell is simply
/// skipped, and a stalled image load only leaves progress counters behind.
#[derive(Debug, thiserror::Error)]
pub enum GridlandError {
    /// A required construction parameter is missing or unusable
    /// - sprite without an image source
    /// - tile grid without a palette
    /// - surface without 2d drawing support
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid grid: {len} cells cannot form a {width}x{height} grid")]
    InvalidGrid { width: u32, height: u32, len: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GridlandError {
    pub fn configuration(message: impl Into<String>) -> Self {
        GridlandError::Configuration(message.into())
    }
}
