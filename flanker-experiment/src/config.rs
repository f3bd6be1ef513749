use flanker_core::{Color, FlankerError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Session parameters, loaded once from `config.json` and read-only after.
///
/// All durations are in display frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SessionConfig {
    pub no_training_trials: usize,
    pub no_training2_trials: usize,
    pub no_blocks: usize,
    pub no_trials: usize,
    pub fix_cross_time: u32,
    pub stim_time: u32,
    pub frame_rate: u32,
    /// Left response key first, right response key second.
    pub reaction_keys: Vec<String>,
    pub background_color: Color,
    pub stim_color: Color,
    pub fix_cross_color: Color,
    pub stim_height: f32,
    pub text_height: f32,

    #[serde(default = "default_text_color")]
    pub text_color: Color,
    #[serde(default = "default_abort_key")]
    pub abort_key: String,
    /// Defaults to `frame_rate`, i.e. one second.
    #[serde(default)]
    pub feedback_time: Option<u32>,
    #[serde(default = "default_continue_keys")]
    pub continue_keys: Vec<String>,
    /// Yes key first, no key second.
    #[serde(default = "default_retrain_keys")]
    pub retrain_keys: Vec<String>,
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_messages_dir")]
    pub messages_dir: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

fn default_text_color() -> Color {
    Color::BLACK
}

fn default_abort_key() -> String {
    "f7".to_string()
}

fn default_continue_keys() -> Vec<String> {
    vec!["return".to_string(), "space".to_string()]
}

fn default_retrain_keys() -> Vec<String> {
    vec!["y".to_string(), "n".to_string()]
}

fn default_font_path() -> PathBuf {
    PathBuf::from("assets/font.ttf")
}

fn default_messages_dir() -> PathBuf {
    PathBuf::from("messages")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FlankerError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: SessionConfig = serde_json::from_str(text)
            .map_err(|e| FlankerError::Configuration(format!("invalid config: {e}")))?;
        config.normalize_keys();
        config.validate()?;
        Ok(config)
    }

    fn normalize_keys(&mut self) {
        for key in self
            .reaction_keys
            .iter_mut()
            .chain(self.continue_keys.iter_mut())
            .chain(self.retrain_keys.iter_mut())
            .chain(std::iter::once(&mut self.abort_key))
        {
            *key = key.trim().to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(FlankerError::Configuration(msg));

        if self.no_trials == 0 || self.no_trials % 10 != 0 {
            return fail(format!(
                "NO_TRIALS must be a positive multiple of 10, got {}",
                self.no_trials
            ));
        }
        if self.no_blocks == 0 {
            return fail("NO_BLOCKS must be positive".into());
        }
        if self.no_training_trials == 0 {
            return fail("NO_TRAINING_TRIALS must be positive".into());
        }
        for (name, frames) in [
            ("FIX_CROSS_TIME", self.fix_cross_time),
            ("STIM_TIME", self.stim_time),
            ("FRAME_RATE", self.frame_rate),
        ] {
            if frames == 0 {
                return fail(format!("{name} must be positive"));
            }
        }
        if self.feedback_time == Some(0) {
            return fail("FEEDBACK_TIME must be positive".into());
        }
        if self.reaction_keys.len() != 2 || self.reaction_keys[0] == self.reaction_keys[1] {
            return fail(format!(
                "REACTION_KEYS must hold exactly two distinct keys, got {:?}",
                self.reaction_keys
            ));
        }
        if self.reaction_keys.contains(&self.abort_key) {
            return fail(format!(
                "ABORT_KEY {:?} collides with a reaction key",
                self.abort_key
            ));
        }
        if self.retrain_keys.len() != 2 || self.retrain_keys[0] == self.retrain_keys[1] {
            return fail(format!(
                "RETRAIN_KEYS must hold exactly two distinct keys, got {:?}",
                self.retrain_keys
            ));
        }
        if self.continue_keys.is_empty() {
            return fail("CONTINUE_KEYS must not be empty".into());
        }
        if !(self.stim_height > 0.0 && self.text_height > 0.0) {
            return fail("STIM_HEIGHT and TEXT_HEIGHT must be positive".into());
        }
        Ok(())
    }

    pub fn feedback_frames(&self) -> u32 {
        self.feedback_time.unwrap_or(self.frame_rate)
    }

    pub fn left_key(&self) -> &str {
        &self.reaction_keys[0]
    }

    pub fn right_key(&self) -> &str {
        &self.reaction_keys[1]
    }

    pub fn yes_key(&self) -> &str {
        &self.retrain_keys[0]
    }

    pub fn no_key(&self) -> &str {
        &self.retrain_keys[1]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r##"{
        "NO_TRAINING_TRIALS": 10,
        "NO_TRAINING2_TRIALS": 5,
        "NO_BLOCKS": 2,
        "NO_TRIALS": 10,
        "FIX_CROSS_TIME": 3,
        "STIM_TIME": 6,
        "FRAME_RATE": 60,
        "REACTION_KEYS": ["A", "k"],
        "BACKGROUND_COLOR": "grey",
        "STIM_COLOR": "#ffffff",
        "FIX_CROSS_COLOR": [0, 0, 0],
        "STIM_HEIGHT": 60,
        "TEXT_HEIGHT": 30
    }"##;

    pub(crate) fn sample() -> SessionConfig {
        SessionConfig::from_json(SAMPLE).unwrap()
    }

    fn with(key: &str, value: &str) -> String {
        let mut json: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        json[key] = serde_json::from_str(value).unwrap();
        json.to_string()
    }

    #[test]
    fn loads_sample_with_defaults() {
        let config = sample();
        assert_eq!(config.left_key(), "a");
        assert_eq!(config.right_key(), "k");
        assert_eq!(config.abort_key, "f7");
        assert_eq!(config.feedback_frames(), 60);
        assert_eq!(config.yes_key(), "y");
        assert_eq!(config.background_color, Color([128, 128, 128, 255]));
        assert_eq!(config.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn rejects_trial_count_not_divisible_by_ten() {
        let err = SessionConfig::from_json(&with("NO_TRIALS", "15")).unwrap_err();
        assert!(matches!(err, FlankerError::Configuration(_)));
    }

    #[test]
    fn rejects_wrong_number_of_reaction_keys() {
        for keys in [r#"["a"]"#, r#"["a", "k", "l"]"#, r#"["a", "A"]"#] {
            let err = SessionConfig::from_json(&with("REACTION_KEYS", keys)).unwrap_err();
            assert!(matches!(err, FlankerError::Configuration(_)), "{keys}");
        }
    }

    #[test]
    fn rejects_abort_key_shadowing_a_response() {
        let err = SessionConfig::from_json(&with("ABORT_KEY", "\"K\"")).unwrap_err();
        assert!(matches!(err, FlankerError::Configuration(_)));
    }

    #[test]
    fn missing_required_key_is_a_configuration_error() {
        let mut json: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        json.as_object_mut().unwrap().remove("STIM_TIME");
        let err = SessionConfig::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, FlankerError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = SessionConfig::from_json("{\"NO_TRIALS\": 10,").unwrap_err();
        assert!(matches!(
            err,
            FlankerError::Configuration(ref msg) if msg.starts_with("invalid config")
        ));
    }

    #[test]
    fn unreadable_file_is_a_configuration_error() {
        let err = SessionConfig::load("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, FlankerError::Configuration(_)));
    }
}
