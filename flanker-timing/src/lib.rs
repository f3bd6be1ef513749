pub mod clock;
pub mod timer;

pub use clock::ResponseClock;
pub use timer::{CalibrationStats, HighPrecisionTimer, Timer};
