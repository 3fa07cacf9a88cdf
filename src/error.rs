use thiserror::Error;

/// Errors reported synchronously by [`LabelLayout`](crate::LabelLayout).
///
/// A rejected call never mutates solver state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid object geometry ({left}, {top}, {right}, {bottom}): {reason}")]
    InvalidGeometry {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        reason: &'static str,
    },

    #[error("invalid measurement for {text:?} at font size {font_size}: {width}x{height}")]
    InvalidMeasurement {
        text: String,
        font_size: f32,
        width: f32,
        height: f32,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
