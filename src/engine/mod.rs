//! The substitution engine.
//!
//! Every strategy implements the same contract: each occurrence of an old id
//! that is not directly preceded by the protected prefix is replaced with its
//! new id, protected occurrences stay as they are. They differ in cost and in
//! how they treat mappings where one replacement feeds into another:
//!
//! | strategy       | passes                        | cascades | historical run time |
//! |----------------|-------------------------------|----------|---------------------|
//! | `sequential`   | one regex scan per pair       | yes      | ~100 min            |
//! | `alternation`  | one scan in total             | no       | ~40 min             |
//! | `mark-restore` | three literal passes per pair | yes      | ~9 min              |
//!
//! The run times were measured on the production catalog and are not a
//! guarantee; `benches/strategies.rs` reproduces the comparison.

use std::{fmt::Display, str::FromStr};

use crate::{
    directory::{IdPair, IdentifierMapping},
    protected::ProtectedContext,
    utils::Counts,
};

mod alternation;
mod mark_restore;
mod sequential;

pub use alternation::AlternationEngine;
pub use mark_restore::{MarkRestoreEngine, SENTINEL_CLOSE, SENTINEL_OPEN};
pub use sequential::SequentialEngine;

#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    #[error("sentinel {sentinel:?} already occurs in {location}")]
    SentinelCollision {
        sentinel: char,
        location: String,
    },
    #[error(
        "old id `{old_id}` is mapped to different new ids in rows {first_row} and {second_row}"
    )]
    AmbiguousMapping {
        old_id: String,
        first_row: u64,
        second_row: u64,
    },
    #[error("the protected prefix must not be empty")]
    EmptyProtectedPrefix,
    #[error("row {row}: old id must not be empty")]
    EmptyOldId { row: u64 },
    #[error("failed to compile pattern for old id `{old_id}`")]
    Pattern {
        old_id: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to build the identifier automaton")]
    Automaton(#[from] aho_corasick::BuildError),
}

/// Selects the substitution algorithm. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// One regex scan per pair, each over the output of the previous one.
    Sequential,
    /// A single leftmost-longest scan over all old ids at once.
    Alternation,
    /// Literal mark, restore and replace passes per pair.
    #[default]
    MarkRestore,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Sequential,
        Strategy::Alternation,
        Strategy::MarkRestore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Alternation => "alternation",
            Strategy::MarkRestore => "mark-restore",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown strategy `{0}`, expected one of: sequential, alternation, mark-restore")]
pub struct UnknownStrategy(String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Summary of one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionStats {
    pub pairs: usize,
    pub replaced: usize,
    pub protected: usize,
}

impl SubstitutionStats {
    fn record(&mut self, counts: Counts) {
        self.replaced += counts.replaced;
        self.protected += counts.protected;
    }
}

/// Receives progress notifications from an engine run.
///
/// The engine itself never logs progress; whoever drives it decides how (and
/// whether) progress is shown.
pub trait ProgressReporter {
    /// Called after the pair at `index` has been applied. Single-pass
    /// strategies call this once per pair after the scan.
    fn pair_applied(&mut self, _index: usize, _pair: &IdPair) {}

    fn finished(&mut self, _stats: &SubstitutionStats) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Logs every `every`-th pair through `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    pub every: usize,
}

impl Default for LogProgress {
    fn default() -> Self {
        Self { every: 100 }
    }
}

impl ProgressReporter for LogProgress {
    fn pair_applied(&mut self, index: usize, pair: &IdPair) {
        if self.every != 0 && index % self.every == 0 {
            tracing::info!(line = index, old_id = %pair.old_id, "replacing directory line");
        }
    }

    fn finished(&mut self, stats: &SubstitutionStats) {
        tracing::info!(
            pairs = stats.pairs,
            replaced = stats.replaced,
            protected = stats.protected,
            "substitution finished"
        );
    }
}

/// Common interface of the three strategies.
pub trait Substitute {
    fn substitute(
        &self,
        document: String,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<(String, SubstitutionStats), SubstitutionError>;
}

/// A strategy prepared for one mapping.
///
/// All mapping-level checks (empty old ids, ambiguous ids, sentinel
/// collisions inside ids, pattern compilation for the alternation) run in [`Engine::new`], before
/// any document is touched.
#[derive(Debug)]
pub enum Engine {
    Sequential(SequentialEngine),
    Alternation(AlternationEngine),
    MarkRestore(MarkRestoreEngine),
}

impl Engine {
    pub fn new(
        strategy: Strategy,
        mapping: IdentifierMapping,
        context: ProtectedContext,
    ) -> Result<Self, SubstitutionError> {
        check_old_ids(&mapping)?;
        for (inner, outer) in mapping.nested_ids() {
            let (inner, outer) = (&mapping.pairs()[inner], &mapping.pairs()[outer]);
            tracing::warn!(
                inner = %inner.old_id,
                inner_row = inner.row,
                outer = %outer.old_id,
                outer_row = outer.row,
                "old id occurs inside another old id, strategies may disagree"
            );
        }
        for index in mapping.overlapping_ids(context.prefix()) {
            let pair = &mapping.pairs()[index];
            tracing::warn!(
                old_id = %pair.old_id,
                row = pair.row,
                "old id overlaps itself or the protected prefix, mark-restore may disagree"
            );
        }

        tracing::debug!(%strategy, pairs = mapping.len(), ?context, "preparing engine");
        Ok(match strategy {
            Strategy::Sequential => Engine::Sequential(SequentialEngine::new(mapping, context)?),
            Strategy::Alternation => {
                Engine::Alternation(AlternationEngine::new(mapping, context)?)
            }
            Strategy::MarkRestore => {
                Engine::MarkRestore(MarkRestoreEngine::new(mapping, context)?)
            }
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Engine::Sequential(_) => Strategy::Sequential,
            Engine::Alternation(_) => Strategy::Alternation,
            Engine::MarkRestore(_) => Strategy::MarkRestore,
        }
    }
}

impl Substitute for Engine {
    fn substitute(
        &self,
        document: String,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<(String, SubstitutionStats), SubstitutionError> {
        match self {
            Engine::Sequential(engine) => engine.substitute(document, reporter),
            Engine::Alternation(engine) => engine.substitute(document, reporter),
            Engine::MarkRestore(engine) => engine.substitute(document, reporter),
        }
    }
}

// an empty old id matches everywhere, including inside multibyte characters
fn check_old_ids(mapping: &IdentifierMapping) -> Result<(), SubstitutionError> {
    match mapping.iter().find(|pair| pair.old_id.is_empty()) {
        Some(pair) => Err(SubstitutionError::EmptyOldId { row: pair.row }),
        None => Ok(()),
    }
}

/// Convenience wrapper: prepare `strategy` for `mapping` and run it once.
pub fn substitute(
    strategy: Strategy,
    document: String,
    mapping: IdentifierMapping,
    context: ProtectedContext,
) -> Result<String, SubstitutionError> {
    let engine = Engine::new(strategy, mapping, context)?;
    let (output, _) = engine.substitute(document, &mut NoProgress)?;
    Ok(output)
}
