//! Media classification and conversion targets.
//!
//! Inbound attachments are classified by MIME type into the three domains
//! the converter supports (PDF, Word documents, images). Conversion targets
//! are the literal menu tokens the state machine matches, case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type Twilio reports for `.docx` attachments.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Broad kind of an uploaded file, derived from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Pdf,
    Docx,
    Image,
}

impl MediaKind {
    /// Classifies a content type, returning `None` for unsupported types.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.trim().to_ascii_lowercase();
        if ct == "application/pdf" {
            Some(Self::Pdf)
        } else if ct == DOCX_MIME {
            Some(Self::Docx)
        } else if ct.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// A supported conversion output, one per menu token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionTarget {
    /// PDF -> Word document.
    Word,
    /// PDF or DOCX -> plain text.
    Text,
    /// DOCX -> PDF.
    Pdf,
    /// DOCX -> HTML.
    Html,
    /// DOCX -> Markdown.
    Markdown,
    /// Image re-encode as JPG.
    Jpg,
    /// Image re-encode as JPEG.
    Jpeg,
    /// Image re-encode as PNG.
    Png,
    /// Image re-encode as WebP.
    Webp,
    /// Quality-reduced JPEG.
    Compress,
    /// Grayscale conversion (menu token `black&white`).
    Grayscale,
}

impl ConversionTarget {
    /// Parses a menu token for the given source kind, case-insensitively.
    ///
    /// Returns `None` when the token is not an option of that kind's menu,
    /// which the state machine treats as a re-prompt rather than an abort.
    pub fn parse(kind: MediaKind, token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        match kind {
            MediaKind::Pdf => match token.as_str() {
                "word" => Some(Self::Word),
                "text" => Some(Self::Text),
                _ => None,
            },
            MediaKind::Docx => match token.as_str() {
                "pdf" => Some(Self::Pdf),
                "text" => Some(Self::Text),
                "html" => Some(Self::Html),
                "markdown" => Some(Self::Markdown),
                _ => None,
            },
            MediaKind::Image => match token.as_str() {
                "jpg" => Some(Self::Jpg),
                "jpeg" => Some(Self::Jpeg),
                "png" => Some(Self::Png),
                "webp" => Some(Self::Webp),
                "compress" => Some(Self::Compress),
                "black&white" => Some(Self::Grayscale),
                _ => None,
            },
        }
    }

    /// File extension of the conversion output.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Word => "docx",
            Self::Text => "txt",
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Jpg | Self::Compress => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Grayscale => "png",
        }
    }

    /// True for targets produced by the image converter.
    pub fn is_image_target(&self) -> bool {
        matches!(
            self,
            Self::Jpg | Self::Jpeg | Self::Png | Self::Webp | Self::Compress | Self::Grayscale
        )
    }
}

/// Maps a content type to the file extension used for staged downloads.
///
/// Unknown types default to `.bin` so a download never fails on an exotic
/// attachment; downstream classification rejects it separately.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "audio/mpeg" => "mp3",
        DOCX_MIME => "docx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.ms-powerpoint" => "ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "text/plain" => "txt",
        "application/rtf" => "rtf",
        "application/json" => "json",
        _ => "bin",
    }
}
