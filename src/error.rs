use enough::StopReason;

use crate::format::ImageFormat;

/// Errors from image decoding and encoding.
///
/// [`ImageError::UnrecognizedFormat`] means "this stream is not in the format
/// that was tried". Every other variant means the container was recognized
/// (or the caller asked for it explicitly) and then failed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImageError {
    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported format variant: {0}")]
    UnsupportedVariant(String),

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("{codec} codec error: {message}")]
    Codec {
        codec: &'static str,
        message: String,
    },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("cannot determine image container from {0:?}")]
    UnknownContainer(String),

    #[error("encoding to {0:?} is not supported")]
    EncodeUnsupported(ImageFormat),

    #[error("cannot encode an empty image")]
    EmptyImage,

    #[error("I/O error: {0}")]
    Io(std::io::Error),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl ImageError {
    /// Whether this error only says "not this format", so another decoder may
    /// still recognize the stream.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ImageError::UnrecognizedFormat)
    }

    pub(crate) fn codec(codec: &'static str, message: impl Into<String>) -> Self {
        ImageError::Codec {
            codec,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ImageError::UnexpectedEof
        } else {
            ImageError::Io(e)
        }
    }
}

impl From<StopReason> for ImageError {
    fn from(r: StopReason) -> Self {
        ImageError::Cancelled(r)
    }
}
