/// Per-trial reaction-time clock.
///
/// Reset with the timestamp of the flip that first shows the stimulus; key
/// timestamps from the same time base are then read relative to it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseClock {
    onset: Option<f64>,
}

impl ResponseClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_at(&mut self, flip_timestamp: f64) {
        self.onset = Some(flip_timestamp);
    }

    /// Seconds from onset to `timestamp`. Events queued before onset read as 0.
    pub fn reaction_time(&self, timestamp: f64) -> Option<f64> {
        self.onset.map(|onset| (timestamp - onset).max(0.0))
    }
}
