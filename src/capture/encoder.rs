use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::EncodeError;

/// Encodes a raster as PNG. Same raster in, same bytes out.
pub fn encode_png(raster: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (raster.width(), raster.height());
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage { width, height });
    }

    let mut buf = Cursor::new(Vec::new());
    raster.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
