use regex::Regex;

use super::{check_old_ids, ProgressReporter, Substitute, SubstitutionError, SubstitutionStats};
use crate::{
    directory::IdentifierMapping, protected::ProtectedContext, utils::replace_unprotected,
};

/// One regex scan per pair, each over the previous pair's output.
///
/// Patterns are compiled lazily, one at a time, the same way a repeated
/// `re.sub` would; this is the slow baseline the other strategies are
/// measured against.
#[derive(Debug)]
pub struct SequentialEngine {
    mapping: IdentifierMapping,
    context: ProtectedContext,
}

impl SequentialEngine {
    pub fn new(
        mapping: IdentifierMapping,
        context: ProtectedContext,
    ) -> Result<Self, SubstitutionError> {
        check_old_ids(&mapping)?;
        Ok(Self { mapping, context })
    }
}

impl Substitute for SequentialEngine {
    fn substitute(
        &self,
        document: String,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<(String, SubstitutionStats), SubstitutionError> {
        let mut stats = SubstitutionStats {
            pairs: self.mapping.len(),
            ..Default::default()
        };
        let (mut text, mut scratch_buffer) = (document, String::new());

        for (index, pair) in self.mapping.iter().enumerate() {
            // the regex crate has no lookbehind, the prefix is checked by hand
            let pattern = Regex::new(&regex::escape(&pair.old_id)).map_err(|source| {
                SubstitutionError::Pattern {
                    old_id: pair.old_id.clone(),
                    source,
                }
            })?;

            let counts;
            (text, scratch_buffer, counts) =
                replace_unprotected(text, &self.context, scratch_buffer, |hay, at| {
                    pattern
                        .find_at(hay, at)
                        .map(|m| (m.range(), pair.new_id.as_str()))
                });

            stats.record(counts);
            reporter.pair_applied(index, pair);
        }

        reporter.finished(&stats);
        Ok((text, stats))
    }
}
