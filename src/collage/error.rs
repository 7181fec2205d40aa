use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollageError {
    #[error("no images to compose")]
    NoImages,

    #[error("image {index} decode error: {reason}")]
    Decode { index: usize, reason: String },

    #[error("collage encode error: {0}")]
    Encode(String),

    #[error("collage worker failed: {0}")]
    Task(String),
}
