//! Image conversions backed by the `image` crate.
//!
//! All operations are synchronous CPU work; the converter runs them on the
//! blocking pool. Output files land next to the input with a prefix naming
//! the operation, so repeated conversions of the same staged file never
//! overwrite each other.

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::domain::media::ConversionTarget;
use crate::ports::ConvertError;

/// JPEG quality used for the `compress` option.
const COMPRESS_QUALITY: u8 = 70;

/// Converts `input` according to an image target, returning the output path.
pub fn convert_image(input: &Path, target: ConversionTarget) -> Result<PathBuf, ConvertError> {
    let img = image::open(input).map_err(|e| ConvertError::Tool(e.to_string()))?;
    let output = output_path(input, target);

    match target {
        ConversionTarget::Jpg | ConversionTarget::Jpeg => {
            // JPEG has no alpha channel; flatten first.
            img.to_rgb8()
                .save_with_format(&output, ImageFormat::Jpeg)
                .map_err(|e| ConvertError::Tool(e.to_string()))?;
        }
        ConversionTarget::Png => {
            img.save_with_format(&output, ImageFormat::Png)
                .map_err(|e| ConvertError::Tool(e.to_string()))?;
        }
        ConversionTarget::Webp => {
            img.save_with_format(&output, ImageFormat::WebP)
                .map_err(|e| ConvertError::Tool(e.to_string()))?;
        }
        ConversionTarget::Compress => {
            let file = File::create(&output)?;
            let encoder =
                JpegEncoder::new_with_quality(BufWriter::new(file), COMPRESS_QUALITY);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| ConvertError::Tool(e.to_string()))?;
        }
        ConversionTarget::Grayscale => {
            img.grayscale()
                .save_with_format(&output, ImageFormat::Png)
                .map_err(|e| ConvertError::Tool(e.to_string()))?;
        }
        other => return Err(ConvertError::Unsupported(other)),
    }

    Ok(output)
}

/// Output path: `<prefix><stem>.<target extension>` next to the input.
pub fn output_path(input: &Path, target: ConversionTarget) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let prefix = match target {
        ConversionTarget::Compress => "compressed-",
        ConversionTarget::Grayscale => "bw-",
        _ => "converted-",
    };
    input.with_file_name(format!(
        "{prefix}{stem}.{}",
        target.output_extension()
    ))
}
