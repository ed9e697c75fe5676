//! Format converter port.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::media::ConversionTarget;

/// Conversion failures.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("unsupported conversion to {0:?} for this input")]
    Unsupported(ConversionTarget),

    #[error("conversion tool failed: {0}")]
    Tool(String),

    #[error("conversion timed out after {0}s")]
    Timeout(u64),

    #[error("could not read or write conversion files: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for converting a staged file to a target format.
///
/// Implementations are effectively pure: `(input file, target)` maps to an
/// output file next to the input; nothing else observable changes.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    /// Converts `input` to `target`, returning the output path.
    async fn convert(
        &self,
        input: &Path,
        target: ConversionTarget,
    ) -> Result<PathBuf, ConvertError>;
}
