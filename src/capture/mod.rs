pub mod encoder;
pub mod phash;
pub mod similarity;
pub mod source;

pub use encoder::encode_png;
pub use phash::{compute_phash, hamming_distance};
pub use similarity::{checksum, score};
#[cfg(feature = "screen-capture")]
pub use source::ScreenSource;
pub use source::{CaptureSource, FileSource};
