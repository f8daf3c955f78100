use anyhow::Result;
use image::ImageFormat;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Double-gradient perceptual hash of a PNG capture, base64 encoded.
pub fn compute_phash(png_bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory_with_format(png_bytes, ImageFormat::Png)?;
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();

    Ok(hasher.hash_image(&img).to_base64())
}

/// Bits that differ between two hashes; `None` if either one does not parse.
pub fn hamming_distance(lhs: &str, rhs: &str) -> Option<u32> {
    let h1 = ImageHash::<Vec<u8>>::from_base64(lhs).ok()?;
    let h2 = ImageHash::<Vec<u8>>::from_base64(rhs).ok()?;
    Some(h1.dist(&h2))
}
