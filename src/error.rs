use thiserror::Error;

/// Raster could not be turned into PNG bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode an empty {width}x{height} raster")]
    EmptyImage { width: u32, height: u32 },
    #[error("png encoding failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// Why a single tracker tick was abandoned. None of these stop the loop.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("screen capture failed: {0:#}")]
    Capture(anyhow::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("capture store unavailable: {0:#}")]
    Persistence(anyhow::Error),
    #[error("{0} worker failed to join")]
    Worker(&'static str, #[source] tokio::task::JoinError),
}
