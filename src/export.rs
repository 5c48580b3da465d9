// ============================================================================
// EXPORT — one-shot full-resolution render and encode
// ============================================================================
//
// Export re-runs the identical render pipeline at the source's native
// resolution — never a cached preview bitmap — then encodes to the chosen
// format. An export runs to completion once started; a second request while
// one is in flight is rejected, not interleaved.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use thiserror::Error;

use crate::ops::layers::LayerAssets;
use crate::project::Project;
use crate::render::{render, RenderTarget};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Webp,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Webp => "webp",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Encoding quality is 50–100 and saturates; it only affects JPEG — the
/// PNG and WEBP paths are lossless.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub quality: u8,
    /// Suffix appended to the title stem in the artifact name.
    pub suffix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 100,
            suffix: "Lumen".to_string(),
        }
    }
}

/// A finished export: encoded bytes plus the download file name
/// `<title-stem>_<suffix>.<ext>`.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its own file name.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(&self.data)?;
        Ok(path)
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("an export is already in flight")]
    Busy,
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Guard marking an export in flight; dropping it releases the slot.
pub struct ExportTicket<'a> {
    exporter: &'a Exporter,
}

impl Drop for ExportTicket<'_> {
    fn drop(&mut self) {
        self.exporter.in_flight.set(false);
    }
}

/// One-shot export runner with an in-flight guard.
#[derive(Default)]
pub struct Exporter {
    in_flight: Cell<bool>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the export slot. `Busy` while another ticket is alive.
    pub fn begin(&self) -> Result<ExportTicket<'_>, ExportError> {
        if self.in_flight.get() {
            return Err(ExportError::Busy);
        }
        self.in_flight.set(true);
        Ok(ExportTicket { exporter: self })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    /// Render the project at native resolution and encode it.
    pub fn export(
        &self,
        project: &Project,
        source: &RgbaImage,
        assets: &dyn LayerAssets,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError> {
        let _ticket = self.begin()?;

        let frame = render(source, &project.settings, RenderTarget::Native, assets);
        let quality = options.quality.clamp(50, 100);
        let data = encode(&frame, options.format, quality)?;

        let stem = project.title.split('.').next().unwrap_or(&project.title);
        let file_name = format!("{stem}_{}.{}", options.suffix, options.format.extension());
        log::debug!(
            "exported {}x{} frame as {file_name} ({} bytes)",
            frame.width(),
            frame.height(),
            data.len()
        );
        Ok(ExportArtifact { file_name, data })
    }
}

fn encode(frame: &RgbaImage, format: ExportFormat, quality: u8) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(Cursor::new(&mut out)).write_image(
                frame.as_raw(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(frame.clone()).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut out), quality).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::Webp => {
            WebPEncoder::new_lossless(Cursor::new(&mut out)).write_image(
                frame.as_raw(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(out)
}
