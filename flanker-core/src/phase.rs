/// Session phases that produce trial records, in protocol order.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Training,
    Retraining,
    Experiment,
}

impl SessionPhase {
    /// Session label written to the results log.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Training => "training",
            SessionPhase::Retraining => "training-2",
            SessionPhase::Experiment => "experiment",
        }
    }

    pub fn shows_feedback(&self) -> bool {
        !self.is_blocked()
    }

    /// Only the experimental phase is split into numbered blocks.
    pub fn is_blocked(&self) -> bool {
        matches!(self, SessionPhase::Experiment)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
