use crate::config::SessionConfig;
use crate::frontend::{Frontend, KeyPress, Visual};
use crate::response::{Response, ResponseKeys};
use crate::sequence::StimulusSequence;
use flanker_core::{Congruency, Direction, FlankerError, Result, Stimulus};
use flanker_timing::ResponseClock;
use tracing::{debug, trace};

/// Trial state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Fixation,
    StimulusWait,
    Responded,
    TimedOut,
    Done,
}

/// Everything one trial hands back to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub stimulus: Stimulus,
    pub congruency: Congruency,
    pub direction: Direction,
    pub response: Response,
}

/// Runs single trials. Holds no memory of earlier trials.
pub struct TrialRunner<'a> {
    config: &'a SessionConfig,
    keys: ResponseKeys,
}

impl<'a> TrialRunner<'a> {
    pub fn new(config: &'a SessionConfig) -> Self {
        Self {
            config,
            keys: ResponseKeys::from_config(config),
        }
    }

    /// Fixation, then the stimulus until a response key or `STIM_TIME` frames.
    ///
    /// Fails with [`FlankerError::UserAbort`] when the abort key shows up in a
    /// poll, and with [`FlankerError::SequenceExhausted`] if `sequence` is drained.
    pub fn run<F: Frontend + ?Sized>(
        &self,
        io: &mut F,
        sequence: &mut StimulusSequence,
    ) -> Result<TrialOutcome> {
        let abort = self.config.abort_key.as_str();
        let [left, right] = self.keys.as_list();
        let allowed = [left, right, abort];

        let mut state = TrialState::Fixation;
        let mut clock = ResponseClock::new();
        let mut current: Option<(Stimulus, Congruency, Direction)> = None;
        let mut pressed: Option<KeyPress> = None;
        let mut response = Response::none();

        loop {
            trace!(?state, "trial state");
            state = match state {
                TrialState::Fixation => {
                    for _ in 0..self.config.fix_cross_time {
                        io.draw(&Visual::Fixation);
                        io.flip()?;
                    }
                    TrialState::StimulusWait
                }
                TrialState::StimulusWait => {
                    let stimulus = sequence.draw()?;
                    let (congruency, direction) = stimulus.classify();
                    current = Some((stimulus, congruency, direction));

                    io.clear_events();
                    for frame in 0..self.config.stim_time {
                        io.draw(&Visual::Stimulus(stimulus));
                        let flipped_at = io.flip()?;
                        if frame == 0 {
                            clock.reset_at(flipped_at);
                        }
                        let keys = io.poll_keys(&allowed);
                        if keys.iter().any(|k| k.key == abort) {
                            return Err(FlankerError::UserAbort(format!(
                                "{abort} pressed during trial"
                            )));
                        }
                        if let Some(first) = keys.into_iter().next() {
                            pressed = Some(first);
                            break;
                        }
                    }
                    if pressed.is_some() {
                        TrialState::Responded
                    } else {
                        TrialState::TimedOut
                    }
                }
                TrialState::Responded => {
                    if let (Some(press), Some((_, _, direction))) = (&pressed, current) {
                        let rt = clock.reaction_time(press.timestamp).unwrap_or(0.0);
                        response = self.keys.evaluate(Some((press.key.as_str(), rt)), direction);
                    }
                    TrialState::Done
                }
                TrialState::TimedOut => {
                    response = Response::none();
                    TrialState::Done
                }
                TrialState::Done => break,
            };
        }

        let (stimulus, congruency, direction) = current.ok_or(
            FlankerError::SequenceExhausted {
                len: sequence.len(),
            },
        )?;
        debug!(
            %stimulus,
            %congruency,
            %direction,
            key = %response.key,
            correct = response.correct,
            rt = response.reaction_time,
            "trial done"
        );
        Ok(TrialOutcome {
            stimulus,
            congruency,
            direction,
            response,
        })
    }
}
