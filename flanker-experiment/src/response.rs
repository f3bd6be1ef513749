use crate::config::SessionConfig;
use flanker_core::Direction;
use tracing::warn;

pub const NO_RESPONSE_KEY: &str = "none";
pub const NO_RESPONSE_RT: f64 = -1.0;

/// What a trial recorded about the participant's keypress.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Normalized response key, or [`NO_RESPONSE_KEY`].
    pub key: String,
    pub correct: bool,
    /// Seconds from stimulus onset, or [`NO_RESPONSE_RT`].
    pub reaction_time: f64,
}

impl Response {
    pub fn none() -> Self {
        Self {
            key: NO_RESPONSE_KEY.to_string(),
            correct: false,
            reaction_time: NO_RESPONSE_RT,
        }
    }
}

/// The two logical response keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseKeys {
    pub left: String,
    pub right: String,
}

impl ResponseKeys {
    pub fn new(left: &str, right: &str) -> Self {
        Self {
            left: left.to_lowercase(),
            right: right.to_lowercase(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.left_key(), config.right_key())
    }

    /// Case-insensitive lookup of the direction a key stands for.
    pub fn direction_of(&self, key: &str) -> Option<Direction> {
        let key = key.to_lowercase();
        if key == self.left {
            Some(Direction::Left)
        } else if key == self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> [&str; 2] {
        [&self.left, &self.right]
    }

    /// Maps a captured `(key, reaction_time)` pair to a scored response.
    ///
    /// No key and keys other than the two response keys both score as the
    /// no-response sentinel.
    pub fn evaluate(&self, press: Option<(&str, f64)>, expected: Direction) -> Response {
        let Some((key, reaction_time)) = press else {
            return Response::none();
        };
        match self.direction_of(key) {
            Some(direction) => Response {
                key: key.to_lowercase(),
                correct: direction == expected,
                reaction_time,
            },
            None => {
                warn!(key, "unrecognized key during trial, scored as no response");
                Response::none()
            }
        }
    }
}
