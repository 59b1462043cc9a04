use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToneMapError>;

#[derive(Debug, Error)]
pub enum ToneMapError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ToneMapError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ToneMapError::InvalidArgument(msg.into())
    }
}
