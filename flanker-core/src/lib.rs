pub mod color;
pub mod error;
pub mod phase;
pub mod stimulus;

pub use color::Color;
pub use error::{FlankerError, Result};
pub use phase::SessionPhase;
pub use stimulus::{Congruency, Direction, Stimulus, classify};
