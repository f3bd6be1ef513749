use crate::config::SessionConfig;
use crate::frontend::{Frontend, Visual};
use crate::messages::read_message;
use crate::results::{ResultsLog, SessionSummary, TrialRecord};
use crate::sequence::{generate, generate_at_least};
use crate::trial::TrialRunner;
use flanker_core::{FlankerError, Result, SessionPhase};
use rand::Rng;
use tracing::{error, info};

pub const WELCOME_MESSAGES: [&str; 4] = ["hello.txt", "hello2.txt", "hello3.txt", "hello4.txt"];
pub const BEFORE_TRAINING: &str = "before_training.txt";
pub const RETRAIN_QUESTION: &str = "second_training.txt";
pub const BEFORE_EXPERIMENT: &str = "before_experiment.txt";
pub const BREAK: &str = "break.txt";
pub const END: &str = "end.txt";

/// Runs the fixed protocol: welcome, training, optional second training,
/// blocked experimental trials, then saves the results.
pub struct Session<'a, F: Frontend + ?Sized, R: Rng> {
    config: &'a SessionConfig,
    participant_id: String,
    io: &'a mut F,
    rng: R,
}

impl<'a, F: Frontend + ?Sized, R: Rng> Session<'a, F, R> {
    pub fn new(
        config: &'a SessionConfig,
        participant_id: impl Into<String>,
        io: &'a mut F,
        rng: R,
    ) -> Self {
        Self {
            config,
            participant_id: participant_id.into(),
            io,
            rng,
        }
    }

    /// Appends every finished trial to `results` and saves them before the
    /// closing screen. On error the caller's guard saves what was collected.
    pub fn run(&mut self, results: &mut ResultsLog) -> Result<()> {
        self.run_protocol(results).inspect_err(|e| {
            error!(participant = %self.participant_id, "session terminated: {e}");
        })
    }

    fn run_protocol(&mut self, results: &mut ResultsLog) -> Result<()> {
        for name in WELCOME_MESSAGES {
            self.show_info(name, None)?;
        }

        self.show_info(BEFORE_TRAINING, None)?;
        self.run_phase(
            SessionPhase::Training,
            self.config.no_training_trials,
            0,
            results,
        )?;

        if self.config.no_training2_trials > 0 && self.ask_retraining()? {
            self.run_phase(
                SessionPhase::Retraining,
                self.config.no_training2_trials,
                0,
                results,
            )?;
        }

        self.show_info(BEFORE_EXPERIMENT, None)?;
        for block in 1..=self.config.no_blocks {
            info!(block, of = self.config.no_blocks, "starting block");
            self.run_phase(
                SessionPhase::Experiment,
                self.config.no_trials,
                block,
                results,
            )?;
            let progress = format!("Block {block} of {} finished.\n", self.config.no_blocks);
            self.show_info(BREAK, Some(&progress))?;
        }

        results.finalize()?;
        let summary = SessionSummary::of_phase(results.records(), SessionPhase::Experiment);
        info!(
            trials = summary.trials,
            accuracy = summary.accuracy(),
            flanker_effect_s = summary.flanker_effect(),
            "experiment summary"
        );
        self.show_info(END, None)
    }

    fn run_phase(
        &mut self,
        phase: SessionPhase,
        trials: usize,
        block: usize,
        results: &mut ResultsLog,
    ) -> Result<()> {
        info!(%phase, trials, "phase started");
        let mut sequence = if phase.is_blocked() {
            generate(trials, &mut self.rng)?
        } else {
            generate_at_least(trials, &mut self.rng)?
        };
        let runner = TrialRunner::new(self.config);

        for trial in 1..=trials {
            let outcome = runner.run(&mut *self.io, &mut sequence)?;
            let correct = outcome.response.correct;
            results.push(TrialRecord::new(
                &self.participant_id,
                phase,
                block,
                trial,
                &outcome,
            ));
            if phase.shows_feedback() {
                self.show_feedback(correct)?;
            }
        }
        Ok(())
    }

    fn show_feedback(&mut self, correct: bool) -> Result<()> {
        let config = self.config;
        let abort = config.abort_key.as_str();
        for _ in 0..config.feedback_frames() {
            self.io.draw(&Visual::Feedback { correct });
            self.io.flip()?;
            if !self.io.poll_keys(&[abort]).is_empty() {
                return Err(FlankerError::UserAbort(format!(
                    "{abort} pressed during feedback"
                )));
            }
        }
        Ok(())
    }

    /// Shows a message file until a continue key is pressed.
    fn show_info(&mut self, name: &str, insert: Option<&str>) -> Result<()> {
        let config = self.config;
        let mut allowed: Vec<&str> = config.continue_keys.iter().map(String::as_str).collect();
        allowed.push(&config.abort_key);
        self.prompt(name, insert, &allowed).map(|_| ())
    }

    fn ask_retraining(&mut self) -> Result<bool> {
        let config = self.config;
        let allowed = [config.yes_key(), config.no_key(), config.abort_key.as_str()];
        let key = self.prompt(RETRAIN_QUESTION, None, &allowed)?;
        let again = key == config.yes_key();
        info!(again, "second training prompt answered");
        Ok(again)
    }

    fn prompt(&mut self, name: &str, insert: Option<&str>, allowed: &[&str]) -> Result<String> {
        let text = read_message(self.config.messages_dir.join(name), insert)?;
        self.io.draw(&Visual::Message(text));
        self.io.flip()?;
        let keys = self.io.wait_keys(allowed)?;
        let key = keys
            .into_iter()
            .next()
            .map(|k| k.key)
            .unwrap_or_default();
        if key == self.config.abort_key {
            return Err(FlankerError::UserAbort(format!(
                "{key} pressed on screen {name}"
            )));
        }
        self.io.flip()?;
        Ok(key)
    }
}
