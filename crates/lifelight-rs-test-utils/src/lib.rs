//! Test helpers shared across LifeLight crates.

pub mod clock;
pub mod dispatch;

pub use clock::{ManualClock, local};
pub use dispatch::{FailingDispatcher, RecordingDispatcher};
