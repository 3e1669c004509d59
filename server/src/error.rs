use core::fmt;

use anyhow::anyhow;
use axum::{http::StatusCode, response::IntoResponse};

pub type Result<T> = anyhow::Result<T>;
pub type WebResult<T> = std::result::Result<T, WebError>;

/// Why a single file was left out of the batch. None of these stop the batch.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Skipped non-image file (type '{mime}').")]
    NotAnImage { mime: String },
    #[error(
        "Direct conversion of GIF files not supported yet. But you can select multiple frame files as individual."
    )]
    UnsupportedAnimation,
    #[error("Unsupported or corrupt image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image has no pixels.")]
    Empty,
}

impl From<image::ImageError> for FileError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(e) => Self::Io(e),
            e => Self::Decode(e),
        }
    }
}

/// Failures while rendering the header. The converted frames stay untouched.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("No converted images. Select at least one static image first.")]
    EmptyBatch,
    #[error("Size error. Choose smaller images. ({needed} bytes needed, limit is {limit})")]
    SizeOverflow { needed: u64, limit: u64 },
    #[error("{file} is {width}x{height} but the first frame is {first_width}x{first_height}.")]
    FrameMismatch {
        file: String,
        width: u32,
        height: u32,
        first_width: u32,
        first_height: u32,
    },
    #[error("Error {0}")]
    Format(#[from] fmt::Error),
}

#[derive(Debug)]
pub struct WebError {
    code: StatusCode,
    error: anyhow::Error,
}

impl WebError {
    pub const fn new(code: StatusCode, error: anyhow::Error) -> Self {
        Self { code, error }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            error: anyhow!("{}", msg),
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.error)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log::warn!("Request failed: {self}");
        (self.code, format!("{}", self.error)).into_response()
    }
}

impl From<anyhow::Error> for WebError {
    fn from(error: anyhow::Error) -> Self {
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl From<HeaderError> for WebError {
    fn from(error: HeaderError) -> Self {
        let code = match error {
            HeaderError::EmptyBatch => StatusCode::CONFLICT,
            HeaderError::SizeOverflow { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HeaderError::FrameMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HeaderError::Format(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(code, error.into())
    }
}
