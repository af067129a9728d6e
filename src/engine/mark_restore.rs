use memchr::memmem;

use super::{check_old_ids, ProgressReporter, Substitute, SubstitutionError, SubstitutionStats};
use crate::{
    directory::IdentifierMapping,
    protected::ProtectedContext,
    utils::{str_replace_counted, Counts},
};

/// Opening delimiter of a marked occurrence (private use area).
pub const SENTINEL_OPEN: char = '\u{E000}';
/// Closing delimiter of a marked occurrence (private use area).
pub const SENTINEL_CLOSE: char = '\u{E001}';

#[derive(Debug)]
struct PairPasses {
    find_old: memmem::Finder<'static>,
    marked: String,
    find_marked: memmem::Finder<'static>,
    protected_marked: memmem::Finder<'static>,
    protected_plain: String,
}

/// Literal mark, restore and replace passes, pair by pair.
///
/// 1. every occurrence of the old id is wrapped in the sentinels,
/// 2. wrapped occurrences right after the protected prefix are unwrapped,
/// 3. the remaining wrapped occurrences become the new id.
///
/// Unlike the lookbehind check, marking works on the raw text: it consumes a
/// protected occurrence and may mark characters that belong to the prefix
/// itself. Old ids that overlap themselves, or overlap the prefix at either
/// end or inside it, can therefore come out differently than with the other
/// strategies (see [`IdentifierMapping::overlapping_ids`]).
#[derive(Debug)]
pub struct MarkRestoreEngine {
    passes: Vec<PairPasses>,
    mapping: IdentifierMapping,
}

impl MarkRestoreEngine {
    pub fn new(
        mapping: IdentifierMapping,
        context: ProtectedContext,
    ) -> Result<Self, SubstitutionError> {
        check_old_ids(&mapping)?;
        for pair in mapping.iter() {
            for id in [&pair.old_id, &pair.new_id] {
                check_sentinels(id, || format!("identifier `{id}` (row {})", pair.row))?;
            }
        }
        check_sentinels(context.prefix(), || "the protected prefix".to_string())?;

        let passes = mapping
            .iter()
            .map(|pair| {
                let marked = format!("{SENTINEL_OPEN}{}{SENTINEL_CLOSE}", pair.old_id);
                let protected_marked = format!("{}{marked}", context.prefix());
                PairPasses {
                    find_old: memmem::Finder::new(pair.old_id.as_bytes()).into_owned(),
                    find_marked: memmem::Finder::new(marked.as_bytes()).into_owned(),
                    protected_marked: memmem::Finder::new(protected_marked.as_bytes())
                        .into_owned(),
                    protected_plain: format!("{}{}", context.prefix(), pair.old_id),
                    marked,
                }
            })
            .collect();

        Ok(Self { passes, mapping })
    }
}

fn check_sentinels(
    text: &str,
    location: impl FnOnce() -> String,
) -> Result<(), SubstitutionError> {
    match text
        .chars()
        .find(|&c| c == SENTINEL_OPEN || c == SENTINEL_CLOSE)
    {
        Some(sentinel) => Err(SubstitutionError::SentinelCollision {
            sentinel,
            location: location(),
        }),
        None => Ok(()),
    }
}

impl Substitute for MarkRestoreEngine {
    fn substitute(
        &self,
        document: String,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<(String, SubstitutionStats), SubstitutionError> {
        let mut stats = SubstitutionStats {
            pairs: self.mapping.len(),
            ..Default::default()
        };
        if self.passes.is_empty() {
            reporter.finished(&stats);
            return Ok((document, stats));
        }
        check_sentinels(&document, || "the document".to_string())?;

        let (mut text, mut scratch_buffer) = (document, String::new());
        for (index, (pair, passes)) in self.mapping.iter().zip(&self.passes).enumerate() {
            let marked;
            (text, scratch_buffer, marked) =
                str_replace_counted(text, &passes.find_old, &passes.marked, scratch_buffer);

            if marked > 0 {
                let (restored, replaced);
                (text, scratch_buffer, restored) = str_replace_counted(
                    text,
                    &passes.protected_marked,
                    &passes.protected_plain,
                    scratch_buffer,
                );
                (text, scratch_buffer, replaced) =
                    str_replace_counted(text, &passes.find_marked, &pair.new_id, scratch_buffer);

                stats.record(Counts {
                    replaced,
                    protected: restored,
                });
            }

            reporter.pair_applied(index, pair);
        }

        reporter.finished(&stats);
        Ok((text, stats))
    }
}
