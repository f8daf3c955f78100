pub mod capture;

pub use capture::{CaptureRecord, CaptureSummary, NewCapture};
