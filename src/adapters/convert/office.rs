//! Document conversions via external tools.
//!
//! LibreOffice handles the format pairs it natively understands
//! (docx↔pdf, anything→txt for docx), pandoc covers docx→html/markdown,
//! and pdftotext extracts plain text from PDFs. Each invocation runs under
//! a timeout so a wedged tool cannot stall a conversation forever.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::domain::media::ConversionTarget;
use crate::ports::{ConvertError, FormatConverter};

use super::image_ops;

/// Tool binaries and limits for [`StandardConverter`].
#[derive(Debug, Clone)]
pub struct ConverterSettings {
    pub libreoffice_bin: String,
    pub pandoc_bin: String,
    pub pdftotext_bin: String,
    pub timeout: Duration,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            libreoffice_bin: "libreoffice".into(),
            pandoc_bin: "pandoc".into(),
            pdftotext_bin: "pdftotext".into(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Converter that shells out to LibreOffice, pandoc and pdftotext, and uses
/// the `image` crate for image targets.
pub struct StandardConverter {
    settings: ConverterSettings,
}

impl StandardConverter {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    async fn run_tool(&self, mut command: Command) -> Result<(), ConvertError> {
        let timeout_secs = self.settings.timeout.as_secs();
        let output = tokio::time::timeout(self.settings.timeout, command.output())
            .await
            .map_err(|_| ConvertError::Timeout(timeout_secs))??;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::Tool(format!(
                "exit {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// `libreoffice --headless --convert-to <filter> --outdir <dir> <input>`.
    ///
    /// LibreOffice names the output itself: input stem plus the filter's
    /// extension, in the outdir.
    async fn libreoffice(&self, input: &Path, filter: &str) -> Result<PathBuf, ConvertError> {
        let outdir = parent_dir(input)?;
        let mut cmd = Command::new(&self.settings.libreoffice_bin);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg(filter)
            .arg("--outdir")
            .arg(outdir)
            .arg(input);
        debug!(tool = "libreoffice", filter, input = %input.display(), "running converter");
        self.run_tool(cmd).await?;

        let extension = filter.split(':').next().unwrap_or(filter);
        let output = input.with_extension(extension);
        ensure_exists(output)
    }

    async fn pandoc(&self, input: &Path, extension: &str) -> Result<PathBuf, ConvertError> {
        let output = input.with_extension(extension);
        let mut cmd = Command::new(&self.settings.pandoc_bin);
        cmd.arg(input).arg("-o").arg(&output);
        debug!(tool = "pandoc", extension, input = %input.display(), "running converter");
        self.run_tool(cmd).await?;
        ensure_exists(output)
    }

    async fn pdftotext(&self, input: &Path) -> Result<PathBuf, ConvertError> {
        let output = input.with_extension("txt");
        let mut cmd = Command::new(&self.settings.pdftotext_bin);
        cmd.arg(input).arg(&output);
        debug!(tool = "pdftotext", input = %input.display(), "running converter");
        self.run_tool(cmd).await?;
        ensure_exists(output)
    }
}

#[async_trait]
impl FormatConverter for StandardConverter {
    async fn convert(
        &self,
        input: &Path,
        target: ConversionTarget,
    ) -> Result<PathBuf, ConvertError> {
        if target.is_image_target() {
            let input = input.to_path_buf();
            return tokio::task::spawn_blocking(move || {
                image_ops::convert_image(&input, target)
            })
            .await
            .map_err(|e| ConvertError::Tool(format!("image task panicked: {e}")))?;
        }

        match target {
            ConversionTarget::Word => self.libreoffice(input, "docx").await,
            ConversionTarget::Pdf => self.libreoffice(input, "pdf").await,
            ConversionTarget::Text => {
                if input.extension().and_then(|e| e.to_str()) == Some("pdf") {
                    self.pdftotext(input).await
                } else {
                    self.libreoffice(input, "txt:Text").await
                }
            }
            ConversionTarget::Html => self.pandoc(input, "html").await,
            ConversionTarget::Markdown => self.pandoc(input, "md").await,
            other => Err(ConvertError::Unsupported(other)),
        }
    }
}

fn parent_dir(input: &Path) -> Result<&Path, ConvertError> {
    input.parent().ok_or_else(|| {
        ConvertError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "input file has no parent directory",
        ))
    })
}

fn ensure_exists(path: PathBuf) -> Result<PathBuf, ConvertError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ConvertError::Tool(format!(
            "tool reported success but produced no output at {}",
            path.display()
        )))
    }
}
