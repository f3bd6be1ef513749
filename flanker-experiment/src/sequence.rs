use flanker_core::{FlankerError, Result, Stimulus};
use rand::Rng;
use rand::seq::SliceRandom;

/// Pre-shuffled, immutable stimulus order for one block or training phase,
/// consumed front to back through a cursor.
#[derive(Debug, Clone)]
pub struct StimulusSequence {
    items: Vec<Stimulus>,
    cursor: usize,
}

/// Builds a balanced sequence of `n` stimuli in uniformly random order.
///
/// Each congruent and incongruent pattern makes up 20% of the sequence and
/// each neutral pattern 10%, so `n` must be a multiple of 10.
pub fn generate<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<StimulusSequence> {
    if n == 0 || n % 10 != 0 {
        return Err(FlankerError::Configuration(format!(
            "stimulus sequence length must be a positive multiple of 10, got {n}"
        )));
    }
    let tenth = n / 10;
    let mut items = Vec::with_capacity(n);
    for stim in Stimulus::ALL {
        items.extend(std::iter::repeat_n(stim, stim.tenths() * tenth));
    }
    items.shuffle(rng);
    Ok(StimulusSequence { items, cursor: 0 })
}

/// Like [`generate`] for phases whose length need not be a multiple of 10:
/// the sequence is rounded up and only the first `n` draws are meant to be used.
pub fn generate_at_least<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<StimulusSequence> {
    generate(n.max(1).div_ceil(10) * 10, rng)
}

impl StimulusSequence {
    /// Draws the next stimulus. A drained sequence is never recycled.
    pub fn draw(&mut self) -> Result<Stimulus> {
        let stim = self
            .items
            .get(self.cursor)
            .copied()
            .ok_or(FlankerError::SequenceExhausted {
                len: self.items.len(),
            })?;
        self.cursor += 1;
        Ok(stim)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn drawn(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn as_slice(&self) -> &[Stimulus] {
        &self.items
    }

    /// Occurrences of each pattern, in [`Stimulus::ALL`] order.
    pub fn counts(&self) -> [usize; 6] {
        let mut counts = [0; 6];
        for (slot, stim) in counts.iter_mut().zip(Stimulus::ALL) {
            *slot = self.items.iter().filter(|s| **s == stim).count();
        }
        counts
    }
}
