//! # Multi-Modal Scanner (C18)
//!
//! Runs an injected extractor over non-text media, then feeds the
//! extracted text through the same [`crate::scanner::InputScanner`] used
//! for plain-text input. The extractor is a caller-supplied closure so
//! this crate never depends on any particular OCR/ASR/PDF library.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScannerError};
use crate::scanner::{InputScanner, ScanResult};

pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Audio,
    Video,
    Pdf,
    Document,
}

#[derive(Debug, Clone)]
pub struct MultiModalConfig {
    pub max_file_size: usize,
    pub allowed_media_types: Vec<MediaType>,
}

impl Default for MultiModalConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_media_types: vec![
                MediaType::Image,
                MediaType::Audio,
                MediaType::Video,
                MediaType::Pdf,
                MediaType::Document,
            ],
        }
    }
}

/// Text an extractor pulled out of a media blob, with a confidence score
/// and optional extractor-specific metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub text: String,
    pub confidence: f64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaScanResult {
    pub extracted: ExtractedContent,
    pub media_type: MediaType,
    pub scan_result: ScanResult,
    pub file_size: usize,
    pub safe: bool,
}

/// A caller-supplied function that turns raw media bytes into extracted
/// text. Kept as a plain function pointer-shaped trait object so callers
/// can plug in any OCR/ASR/document pipeline.
pub trait MediaExtractor {
    fn extract(&self, content: &[u8], media_type: MediaType) -> Result<ExtractedContent>;
}

pub struct MultiModalScanner<'a> {
    config: MultiModalConfig,
    scanner: &'a InputScanner,
    extractor: Box<dyn MediaExtractor + 'a>,
}

impl<'a> MultiModalScanner<'a> {
    pub fn new(
        config: MultiModalConfig,
        scanner: &'a InputScanner,
        extractor: Box<dyn MediaExtractor + 'a>,
    ) -> Self {
        Self {
            config,
            scanner,
            extractor,
        }
    }

    pub fn scan_media(&self, content: &[u8], media_type: MediaType) -> Result<MediaScanResult> {
        if content.len() > self.config.max_file_size {
            return Err(ScannerError::FileTooLarge {
                size: content.len(),
                max: self.config.max_file_size,
            });
        }

        if !self.config.allowed_media_types.contains(&media_type) {
            return Err(ScannerError::UnsupportedType(format!("{media_type:?}")));
        }

        let extracted = self.extractor.extract(content, media_type)?;
        let scan_result = self.scanner.scan_text(&extracted.text);
        let safe = scan_result.safe;

        Ok(MediaScanResult {
            extracted,
            media_type,
            scan_result,
            file_size: content.len(),
            safe,
        })
    }
}
