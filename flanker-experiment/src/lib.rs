pub mod config;
pub mod frontend;
pub mod messages;
pub mod response;
pub mod results;
pub mod sequence;
pub mod session;
pub mod trial;

pub use config::SessionConfig;
pub use frontend::{
    Display, Frontend, Input, KeyPress, Resolution, ScreenProbe, Visual, check_frame_rate,
    measure_frame_rate,
};
pub use response::{Response, ResponseKeys};
pub use results::{FinalizeGuard, ResultsLog, SessionSummary, TrialRecord};
pub use sequence::{StimulusSequence, generate};
pub use session::Session;
pub use trial::{TrialOutcome, TrialRunner, TrialState};
