use crate::trial::TrialOutcome;
use flanker_core::{Congruency, Direction, FlankerError, Result, SessionPhase};
use rand::Rng;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use tracing::{error, info, warn};

pub const HEADER: [&str; 9] = [
    "participant_id",
    "trial",
    "session",
    "block",
    "congruency",
    "direction",
    "key",
    "reaction_time",
    "correct",
];

/// One row of the results file. Written once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub participant_id: String,
    /// 1-based within the block (or the training phase).
    pub trial: usize,
    pub session: SessionPhase,
    /// 0 for training, 1-based for experimental blocks.
    pub block: usize,
    pub congruency: Congruency,
    pub direction: Direction,
    pub key: String,
    pub reaction_time: f64,
    pub correct: bool,
}

impl TrialRecord {
    pub fn new(
        participant_id: &str,
        session: SessionPhase,
        block: usize,
        trial: usize,
        outcome: &TrialOutcome,
    ) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            trial,
            session,
            block,
            congruency: outcome.congruency,
            direction: outcome.direction,
            key: outcome.response.key.clone(),
            reaction_time: outcome.response.reaction_time,
            correct: outcome.response.correct,
        }
    }

    fn fields(&self) -> [String; 9] {
        [
            self.participant_id.clone(),
            self.trial.to_string(),
            self.session.label().to_string(),
            self.block.to_string(),
            self.congruency.label().to_string(),
            self.direction.label().to_string(),
            self.key.clone(),
            format!("{:.4}", self.reaction_time),
            self.correct.to_string(),
        ]
    }
}

/// Ordered trial records for one run, persisted at most once.
#[derive(Debug)]
pub struct ResultsLog {
    participant_id: String,
    dir: PathBuf,
    records: Vec<TrialRecord>,
    finalized: bool,
}

impl ResultsLog {
    pub fn new(participant_id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            participant_id: participant_id.into(),
            dir: dir.into(),
            records: Vec::new(),
            finalized: false,
        }
    }

    pub fn push(&mut self, record: TrialRecord) {
        if self.finalized {
            warn!(trial = record.trial, "record appended after results were saved");
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn write_csv<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write_row(w, HEADER.iter().copied())?;
        for record in &self.records {
            let fields = record.fields();
            write_row(w, fields.iter().map(String::as_str))?;
        }
        Ok(())
    }

    /// Saves the log as `<dir>/<participant>_<NNN>_beh.csv`.
    ///
    /// Only the first call writes; later calls return `Ok(None)`.
    pub fn finalize(&mut self) -> Result<Option<PathBuf>> {
        self.finalize_with(&mut rand::rng())
    }

    pub fn finalize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<PathBuf>> {
        if self.finalized {
            return Ok(None);
        }
        self.finalized = true;
        std::fs::create_dir_all(&self.dir)?;

        for _ in 0..100 {
            let suffix: u16 = rng.random_range(100..1000);
            let path = self
                .dir
                .join(format!("{}_{}_beh.csv", self.participant_id, suffix));
            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            let mut out = BufWriter::new(file);
            self.write_csv(&mut out)?;
            out.flush()?;
            info!(path = %path.display(), records = self.records.len(), "results saved");
            return Ok(Some(path));
        }
        Err(FlankerError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free results file name for {}", self.participant_id),
        )))
    }
}

fn write_row<'a, W: Write>(w: &mut W, fields: impl Iterator<Item = &'a str>) -> std::io::Result<()> {
    let mut first = true;
    for field in fields {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        if field.contains([',', '"', '\n', '\r']) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Owns the [`ResultsLog`] and saves it when dropped, so records survive an
/// early return, a propagated error or a panic.
#[derive(Debug)]
pub struct FinalizeGuard {
    log: ResultsLog,
}

impl FinalizeGuard {
    pub fn new(log: ResultsLog) -> Self {
        Self { log }
    }
}

impl Deref for FinalizeGuard {
    type Target = ResultsLog;

    fn deref(&self) -> &ResultsLog {
        &self.log
    }
}

impl DerefMut for FinalizeGuard {
    fn deref_mut(&mut self) -> &mut ResultsLog {
        &mut self.log
    }
}

impl Drop for FinalizeGuard {
    fn drop(&mut self) {
        if self.log.is_finalized() {
            return;
        }
        if let Err(e) = self.log.finalize() {
            error!("failed to save results on exit: {e}");
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CongruencyStats {
    pub trials: usize,
    pub correct: usize,
    /// Mean over correct responses, seconds.
    pub mean_rt: Option<f64>,
}

/// Accuracy and reaction-time overview of one phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub trials: usize,
    pub responses: usize,
    pub correct: usize,
    pub congruent: CongruencyStats,
    pub incongruent: CongruencyStats,
    pub neutral: CongruencyStats,
}

impl SessionSummary {
    pub fn of_phase(records: &[TrialRecord], phase: SessionPhase) -> Self {
        let rows: Vec<_> = records.iter().filter(|r| r.session == phase).collect();
        let stats = |class: Congruency| {
            let class_rows: Vec<_> = rows.iter().filter(|r| r.congruency == class).collect();
            let rts: Vec<f64> = class_rows
                .iter()
                .filter(|r| r.correct && r.reaction_time >= 0.0)
                .map(|r| r.reaction_time)
                .collect();
            CongruencyStats {
                trials: class_rows.len(),
                correct: class_rows.iter().filter(|r| r.correct).count(),
                mean_rt: (!rts.is_empty()).then(|| rts.iter().sum::<f64>() / rts.len() as f64),
            }
        };
        Self {
            trials: rows.len(),
            responses: rows.iter().filter(|r| r.reaction_time >= 0.0).count(),
            correct: rows.iter().filter(|r| r.correct).count(),
            congruent: stats(Congruency::Congruent),
            incongruent: stats(Congruency::Incongruent),
            neutral: stats(Congruency::Neutral),
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.correct as f64 / self.trials as f64
        }
    }

    /// Incongruent minus congruent mean RT, the classic flanker effect.
    pub fn flanker_effect(&self) -> Option<f64> {
        Some(self.incongruent.mean_rt? - self.congruent.mean_rt?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record(trial: usize, congruency: Congruency, key: &str, rt: f64, correct: bool) -> TrialRecord {
        TrialRecord {
            participant_id: "p01".into(),
            trial,
            session: SessionPhase::Experiment,
            block: 1,
            congruency,
            direction: Direction::Right,
            key: key.into(),
            reaction_time: rt,
            correct,
        }
    }

    #[test]
    fn csv_has_header_and_rows_in_order() {
        let mut log = ResultsLog::new("p01", "unused");
        log.push(record(1, Congruency::Congruent, "k", 0.35, true));
        log.push(record(2, Congruency::Neutral, "none", -1.0, false));
        let mut out = Vec::new();
        log.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "p01,1,experiment,1,congruent,right,k,0.3500,true");
        assert_eq!(lines[2], "p01,2,experiment,1,neutral,right,none,-1.0000,false");
    }

    #[test]
    fn awkward_participant_ids_are_quoted() {
        let mut log = ResultsLog::new("a,\"b\"", "unused");
        log.push(TrialRecord {
            participant_id: "a,\"b\"".into(),
            ..record(1, Congruency::Congruent, "k", 0.3, true)
        });
        let mut out = Vec::new();
        log.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("\"a,\"\"b\"\"\",1,"));
    }

    #[test]
    fn finalize_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ResultsLog::new("p01", dir.path().join("results"));
        log.push(record(1, Congruency::Congruent, "k", 0.35, true));
        let mut rng = StdRng::seed_from_u64(11);

        let path = log.finalize_with(&mut rng).unwrap().unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("p01_") && name.ends_with("_beh.csv"), "{name}");
        let suffix: u16 = name[4..7].parse().unwrap();
        assert!((100..1000).contains(&suffix));

        assert_eq!(log.finalize_with(&mut rng).unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path().join("results")).unwrap().count(), 1);
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 2);
    }

    #[test]
    fn guard_saves_on_drop_and_not_twice() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut guard = FinalizeGuard::new(ResultsLog::new("p02", dir.path()));
            guard.push(record(1, Congruency::Incongruent, "a", 0.5, false));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let other = tempfile::tempdir().unwrap();
        {
            let mut guard = FinalizeGuard::new(ResultsLog::new("p03", other.path()));
            guard.finalize().unwrap();
        }
        assert_eq!(std::fs::read_dir(other.path()).unwrap().count(), 1);
    }

    #[test]
    fn summary_splits_by_congruency() {
        let records = vec![
            record(1, Congruency::Congruent, "k", 0.30, true),
            record(2, Congruency::Congruent, "k", 0.40, true),
            record(3, Congruency::Incongruent, "k", 0.50, true),
            record(4, Congruency::Incongruent, "a", 0.20, false),
            record(5, Congruency::Neutral, "none", -1.0, false),
        ];
        let summary = SessionSummary::of_phase(&records, SessionPhase::Experiment);
        assert_eq!(summary.trials, 5);
        assert_eq!(summary.responses, 4);
        assert_eq!(summary.correct, 3);
        assert!((summary.accuracy() - 0.6).abs() < 1e-12);
        assert!((summary.congruent.mean_rt.unwrap() - 0.35).abs() < 1e-12);
        assert!((summary.flanker_effect().unwrap() - 0.15).abs() < 1e-12);
        assert_eq!(summary.neutral.mean_rt, None);
        assert_eq!(
            SessionSummary::of_phase(&records, SessionPhase::Training).trials,
            0
        );
    }
}
