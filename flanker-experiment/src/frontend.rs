//! Seams to the display and keyboard. The session drives these once per
//! frame; it never renders or reads devices itself.

use flanker_core::{FlankerError, Result, Stimulus};
use flanker_timing::{HighPrecisionTimer, Timer};
use std::time::Duration;
use tracing::info;

/// Something the session asks the display to show on the next flip.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    Fixation,
    Stimulus(Stimulus),
    /// Instruction or prompt text.
    Message(String),
    Feedback { correct: bool },
}

impl Visual {
    pub fn feedback_text(correct: bool) -> &'static str {
        if correct { "Correct" } else { "Incorrect" }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    /// Lowercase key name, e.g. `"a"`, `"space"`, `"f7"`.
    pub key: String,
    /// Seconds, in the same time base as [`Display::flip`].
    pub timestamp: f64,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, timestamp: f64) -> Self {
        Self {
            key: key.into(),
            timestamp,
        }
    }
}

pub trait Display {
    /// Queues a visual for the next flip.
    fn draw(&mut self, visual: &Visual);
    /// Presents queued visuals, advancing one frame. Returns the flip time in seconds.
    fn flip(&mut self) -> Result<f64>;
}

pub trait Input {
    /// Non-blocking: pending presses of `allowed` keys, oldest first.
    fn poll_keys(&mut self, allowed: &[&str]) -> Vec<KeyPress>;
    /// Blocks until one of `allowed` is pressed.
    fn wait_keys(&mut self, allowed: &[&str]) -> Result<Vec<KeyPress>>;
    fn clear_events(&mut self);
}

pub trait Frontend: Display + Input {}

impl<T: Display + Input + ?Sized> Frontend for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Platform capability for querying the screen size.
pub trait ScreenProbe {
    fn resolution(&self) -> Result<Resolution>;
}

/// Consecutive identical-looking intervals needed before trusting a rate.
pub const STABLE_FRAMES: usize = 30;
pub const MAX_MEASURE_FRAMES: usize = 200;
/// Largest frame-interval standard deviation accepted as a steady refresh.
pub const MAX_FRAME_JITTER: Duration = Duration::from_millis(1);

/// Flips blank frames until [`STABLE_FRAMES`] consecutive intervals agree,
/// then returns the rounded refresh rate in Hz.
pub fn measure_frame_rate<D: Display + ?Sized>(display: &mut D) -> Result<u32> {
    let mut window = HighPrecisionTimer::with_capacity(STABLE_FRAMES);
    let mut last = display.flip()?;
    for _ in 0..MAX_MEASURE_FRAMES {
        let now = display.flip()?;
        window.record_frame(Duration::from_secs_f64((now - last).max(0.0)));
        last = now;

        if window.frame_count() == STABLE_FRAMES {
            let stats = window.calibration_stats();
            if stats.is_steady(MAX_FRAME_JITTER) {
                let rate = stats.effective_fps.round() as u32;
                info!(
                    rate,
                    jitter_ms = stats.jitter_ns / 1e6,
                    "detected frame rate"
                );
                return Ok(rate);
            }
        }
    }
    Err(FlankerError::Environment(format!(
        "frame rate did not stabilise within {MAX_MEASURE_FRAMES} frames"
    )))
}

pub fn check_frame_rate(measured: u32, expected: u32) -> Result<()> {
    if measured != expected {
        return Err(FlankerError::Environment(format!(
            "wrong frame rate detected: {measured} Hz, expected {expected} Hz"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ticker {
        t: f64,
        period: f64,
        wobble: f64,
        flips: usize,
    }

    impl Display for Ticker {
        fn draw(&mut self, _visual: &Visual) {}
        fn flip(&mut self) -> Result<f64> {
            self.flips += 1;
            let jitter = if self.flips % 2 == 0 { self.wobble } else { -self.wobble };
            self.t += self.period + jitter;
            Ok(self.t)
        }
    }

    #[test]
    fn steady_display_reports_rounded_rate() {
        let mut display = Ticker {
            t: 0.0,
            period: 1.0 / 59.94,
            wobble: 0.0,
            flips: 0,
        };
        assert_eq!(measure_frame_rate(&mut display).unwrap(), 60);
        assert!(display.flips <= STABLE_FRAMES + 1);
    }

    #[test]
    fn sub_millisecond_vsync_jitter_is_accepted() {
        let mut display = Ticker {
            t: 0.0,
            period: 1.0 / 60.0,
            wobble: 0.0003,
            flips: 0,
        };
        assert_eq!(measure_frame_rate(&mut display).unwrap(), 60);
    }

    #[test]
    fn unstable_display_is_an_environment_error() {
        let mut display = Ticker {
            t: 0.0,
            period: 1.0 / 60.0,
            wobble: 0.005,
            flips: 0,
        };
        let err = measure_frame_rate(&mut display).unwrap_err();
        assert!(matches!(err, FlankerError::Environment(_)));
        assert_eq!(display.flips, MAX_MEASURE_FRAMES + 1);
    }

    #[test]
    fn mismatched_rate_is_rejected() {
        assert!(check_frame_rate(60, 60).is_ok());
        assert!(matches!(
            check_frame_rate(75, 60),
            Err(FlankerError::Environment(_))
        ));
    }
}
