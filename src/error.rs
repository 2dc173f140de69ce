/// Errors produced by palette extraction, pixel sampling and hex parsing.
///
/// `InvalidInput` and `OutOfBounds` both come from ordinary interaction (no
/// image yet, pointer drifting past the edge). Callers are expected to drop
/// them locally rather than surface them.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("pixel ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("invalid hex color: {0:?}")]
    InvalidHex(String),

    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

impl InspectError {
    /// True for the pointer-left-the-image case, which should never update UI state.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, InspectError::OutOfBounds { .. })
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
