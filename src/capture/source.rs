use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;

/// Produces one raster per call. Implementations are called from a blocking
/// worker, so they may do slow synchronous I/O.
pub trait CaptureSource: Send + Sync + 'static {
    fn grab(&self) -> Result<DynamicImage>;

    fn describe(&self) -> String;
}

/// Primary monitor, falling back to the first monitor the OS reports.
#[cfg(feature = "screen-capture")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenSource;

#[cfg(feature = "screen-capture")]
impl CaptureSource for ScreenSource {
    fn grab(&self) -> Result<DynamicImage> {
        let monitors = xcap::Monitor::all().context("failed to enumerate monitors")?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| monitors.first())
            .ok_or_else(|| anyhow::anyhow!("no monitors found"))?;

        let frame = monitor
            .capture_image()
            .with_context(|| format!("capture of monitor '{}' failed", monitor.name()))?;
        Ok(DynamicImage::ImageRgba8(frame))
    }

    fn describe(&self) -> String {
        "primary screen".into()
    }
}

/// Re-reads an image file on every grab. Stands in for the screen on
/// headless machines and in demos.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileSource {
    fn grab(&self) -> Result<DynamicImage> {
        image::open(&self.path)
            .with_context(|| format!("failed to read image {}", self.path.display()))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
