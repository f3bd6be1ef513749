use crate::error::{FlankerError, Result};

/// The six flanker patterns. Each is a five character string whose center
/// character carries the target direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stimulus {
    CongruentRight,
    CongruentLeft,
    IncongruentRight,
    IncongruentLeft,
    NeutralRight,
    NeutralLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Congruency {
    Congruent,
    Incongruent,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Stimulus {
    pub const ALL: [Stimulus; 6] = [
        Stimulus::CongruentRight,
        Stimulus::CongruentLeft,
        Stimulus::IncongruentRight,
        Stimulus::IncongruentLeft,
        Stimulus::NeutralRight,
        Stimulus::NeutralLeft,
    ];

    pub fn pattern(&self) -> &'static str {
        match self {
            Stimulus::CongruentRight => ">>>>>",
            Stimulus::CongruentLeft => "<<<<<",
            Stimulus::IncongruentRight => "<<><<",
            Stimulus::IncongruentLeft => ">><>>",
            Stimulus::NeutralRight => "OO>OO",
            Stimulus::NeutralLeft => "OO<OO",
        }
    }

    pub fn from_pattern(pattern: &str) -> Option<Stimulus> {
        Stimulus::ALL.into_iter().find(|s| s.pattern() == pattern)
    }

    /// Share of a generated sequence taken by this pattern, in tenths.
    pub fn tenths(&self) -> usize {
        match self {
            Stimulus::NeutralRight | Stimulus::NeutralLeft => 1,
            _ => 2,
        }
    }

    pub fn classify(&self) -> (Congruency, Direction) {
        match classify(self.pattern()) {
            Ok(class) => class,
            Err(e) => unreachable!("built-in pattern {:?} failed to classify: {e}", self),
        }
    }

    pub fn congruency(&self) -> Congruency {
        self.classify().0
    }

    pub fn direction(&self) -> Direction {
        self.classify().1
    }
}

impl std::fmt::Display for Stimulus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Maps a raw pattern to its congruency class and target direction.
///
/// Congruency is decided by pattern membership; direction only by the
/// center character. Anything outside the fixed alphabet is rejected.
pub fn classify(pattern: &str) -> Result<(Congruency, Direction)> {
    let congruency = match pattern {
        ">>>>>" | "<<<<<" => Congruency::Congruent,
        ">><>>" | "<<><<" => Congruency::Incongruent,
        "OO>OO" | "OO<OO" => Congruency::Neutral,
        other => {
            return Err(FlankerError::Configuration(format!(
                "unknown stimulus pattern {other:?}"
            )));
        }
    };

    let direction = match pattern.chars().nth(2) {
        Some('>') => Direction::Right,
        Some('<') => Direction::Left,
        center => {
            return Err(FlankerError::Configuration(format!(
                "stimulus {pattern:?} has no directional center ({center:?})"
            )));
        }
    };

    Ok((congruency, direction))
}

impl Congruency {
    pub fn label(&self) -> &'static str {
        match self {
            Congruency::Congruent => "congruent",
            Congruency::Incongruent => "incongruent",
            Congruency::Neutral => "neutral",
        }
    }
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl std::fmt::Display for Congruency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_pattern() {
        let cases = [
            (">>>>>", Congruency::Congruent, Direction::Right),
            ("<<<<<", Congruency::Congruent, Direction::Left),
            ("<<><<", Congruency::Incongruent, Direction::Right),
            (">><>>", Congruency::Incongruent, Direction::Left),
            ("OO>OO", Congruency::Neutral, Direction::Right),
            ("OO<OO", Congruency::Neutral, Direction::Left),
        ];
        for (pattern, congruency, direction) in cases {
            assert_eq!(classify(pattern).unwrap(), (congruency, direction), "{pattern}");
        }
    }

    #[test]
    fn enum_and_pattern_classification_agree() {
        for stim in Stimulus::ALL {
            assert_eq!(stim.classify(), classify(stim.pattern()).unwrap());
            assert_eq!(Stimulus::from_pattern(stim.pattern()), Some(stim));
        }
    }

    #[test]
    fn rejects_patterns_outside_the_alphabet() {
        assert!(matches!(classify("xx>xx"), Err(FlankerError::Configuration(_))));
        assert!(matches!(classify("<<"), Err(FlankerError::Configuration(_))));
        assert!(Stimulus::from_pattern("OOOOO").is_none());
    }

    #[test]
    fn proportions_sum_to_ten_tenths() {
        let total: usize = Stimulus::ALL.iter().map(Stimulus::tenths).sum();
        assert_eq!(total, 10);
    }
}
