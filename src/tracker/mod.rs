pub mod controller;
pub mod events;
pub mod loop_worker;
pub mod state;

pub use controller::{TrackerController, TrackerSnapshot};
pub use events::{StoredCapture, TrackerEvent};
pub use state::{TrackerState, TrackerStatus};
