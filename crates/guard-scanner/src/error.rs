use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScannerError>;

/// Errors raised by the scanning pipeline (C2-C8, C18).
///
/// C8/C9/C10/C11 never swallow errors; they surface structured failures
/// upward and let the caller (the Facade, in guard-core) decide recovery.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("custom pattern failed to compile: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("media file too large: {size} bytes exceeds limit of {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("media extraction failed: {cause}")]
    ExtractionFailed { cause: String },
}
