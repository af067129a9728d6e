use std::collections::hash_map::Entry;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, Input, MatchKind};
use rustc_hash::FxHashMap;

use super::{check_old_ids, ProgressReporter, Substitute, SubstitutionError, SubstitutionStats};
use crate::{
    directory::IdentifierMapping, protected::ProtectedContext, utils::replace_unprotected,
};

/// All old ids compiled into one automaton, applied in a single scan.
///
/// Matching is leftmost-longest, so an old id that is a prefix of another one
/// never shadows the longer id. Replacements are never rescanned, which means
/// pairs do not cascade.
#[derive(Debug)]
pub struct AlternationEngine {
    automaton: AhoCorasick,
    // indexed by pattern id
    new_ids: Vec<String>,
    mapping: IdentifierMapping,
    context: ProtectedContext,
}

impl AlternationEngine {
    pub fn new(
        mapping: IdentifierMapping,
        context: ProtectedContext,
    ) -> Result<Self, SubstitutionError> {
        check_old_ids(&mapping)?;
        let (automaton, new_ids) = {
            // old id -> pattern index
            let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
            let mut patterns: Vec<&str> = Vec::new();
            let mut new_ids = Vec::new();
            let mut rows = Vec::new();

            for pair in mapping.iter() {
                match seen.entry(pair.old_id.as_str()) {
                    Entry::Occupied(entry) => {
                        let index = *entry.get();
                        if new_ids[index] != pair.new_id {
                            return Err(SubstitutionError::AmbiguousMapping {
                                old_id: pair.old_id.clone(),
                                first_row: rows[index],
                                second_row: pair.row,
                            });
                        }
                        tracing::debug!(old_id = %pair.old_id, row = pair.row, "skipping repeated pair");
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(patterns.len());
                        patterns.push(pair.old_id.as_str());
                        new_ids.push(pair.new_id.clone());
                        rows.push(pair.row);
                    }
                }
            }

            let mut builder = AhoCorasickBuilder::new();
            builder.match_kind(MatchKind::LeftmostLongest);
            let automaton = builder.build(&patterns)?;
            tracing::debug!(
                "built aho-corasick successfully, kind: {:?}, patterns: {}, memory: {} bytes",
                automaton.kind(),
                patterns.len(),
                automaton.memory_usage()
            );

            (automaton, new_ids)
        };

        Ok(Self {
            automaton,
            new_ids,
            mapping,
            context,
        })
    }
}

impl Substitute for AlternationEngine {
    fn substitute(
        &self,
        document: String,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<(String, SubstitutionStats), SubstitutionError> {
        let mut stats = SubstitutionStats {
            pairs: self.mapping.len(),
            ..Default::default()
        };
        if self.new_ids.is_empty() {
            reporter.finished(&stats);
            return Ok((document, stats));
        }

        let (text, _, counts) =
            replace_unprotected(document, &self.context, String::new(), |hay, at| {
                self.automaton
                    .find(Input::new(hay).range(at..))
                    .map(|m| (m.range(), self.new_ids[m.pattern().as_usize()].as_str()))
            });
        stats.record(counts);

        for (index, pair) in self.mapping.iter().enumerate() {
            reporter.pair_applied(index, pair);
        }
        reporter.finished(&stats);
        Ok((text, stats))
    }
}
