//! Run-scoped pseudonyms for actors.

#![warn(clippy::all, rust_2018_idioms)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

use crate::app::error::{ReportError, Result};

/// Length of generated labels
pub const LABEL_LEN: usize = 5;

/// Number of distinct labels of `LABEL_LEN` lowercase letters (26^5)
pub const LABEL_SPACE: usize = 11_881_376;

/// Assigns each distinct actor a random lowercase label, once per run.
///
/// Labels are unique within one anonymizer: a label that is already taken is
/// re-rolled. Labels carry no meaning and differ between runs. One anonymizer
/// must serve exactly one region's aggregation.
pub struct Anonymizer<R: Rng = StdRng> {
    rng: R,
    labels: HashMap<String, String>,
    taken: HashSet<String>,
    capacity: usize,
}

impl Anonymizer<StdRng> {
    /// Anonymizer seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for Anonymizer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Anonymizer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            labels: HashMap::new(),
            taken: HashSet::new(),
            capacity: LABEL_SPACE,
        }
    }

    /// Label for `actor`, generating one on first sight.
    ///
    /// Fails with [`ReportError::LabelSpaceExhausted`] once every label is
    /// taken and a new actor shows up.
    pub fn label_for(&mut self, actor: &str) -> Result<&str> {
        if !self.labels.contains_key(actor) {
            if self.taken.len() >= self.capacity {
                return Err(ReportError::LabelSpaceExhausted {
                    capacity: self.capacity,
                });
            }
            let label = self.fresh_label();
            self.taken.insert(label.clone());
            self.labels.insert(actor.to_string(), label);
        }
        Ok(&self.labels[actor])
    }

    /// Number of distinct actors seen
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Caller guarantees at least one label is free
    fn fresh_label(&mut self) -> String {
        loop {
            let label: String = (0..LABEL_LEN)
                .map(|_| char::from(self.rng.gen_range(b'a'..=b'z')))
                .collect();
            if !self.taken.contains(&label) {
                return label;
            }
        }
    }
}
