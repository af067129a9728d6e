use std::ops::Range;

use memchr::memmem;

use crate::protected::ProtectedContext;

/// Occurrence counters accumulated while rewriting a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub replaced: usize,
    pub protected: usize,
}

/// Replace all occurrences of `from` with `to` in `input`.
///
/// This function is optimized for the case where no replacements are made.
///
/// # Arguments
///
/// * `input` - The input string to search for replacements.
/// * `from` - The `Finder` to search for. Must be created from valid UTF-8.
/// * `to` - The string to replace `from` with.
/// * `scratch_buffer` - A buffer to store the result in. Is expected to be empty.
///
/// # Returns
///
/// A tuple containing the modified `input`, the `clear`ed `scratch_buffer`
/// and the number of replacements made.
///
/// # Panics
///
/// Might panic if `from` is not valid UTF-8.
pub(crate) fn str_replace_counted(
    mut input: String,
    from: &memmem::Finder,
    to: &str,
    scratch_buffer: String,
) -> (String, String, usize) {
    let mut result = scratch_buffer;
    let mut last_end = 0;
    let mut count = 0;
    for start in from.find_iter(input.as_bytes()) {
        let end = start + from.needle().len();

        // string indexing could panic if the Finder is not valid UTF-8
        result.push_str(&input[last_end..start]);
        result.push_str(to);

        last_end = end;
        count += 1;
    }

    if count == 0 {
        // no need to clear the scratch buffer, since it's already empty
        (input, result, 0)
    } else {
        // copy the remaining text
        result.push_str(&input[last_end..]);

        input.clear();
        (result, input, count)
    }
}

/// Replace every match produced by `next_match` unless the protected prefix
/// sits directly in front of it.
///
/// `next_match(text, at)` must return the leftmost match starting at or after
/// byte `at`, together with its replacement. A protected match is not
/// consumed: the search resumes one character after its start, so a later
/// overlapping candidate may still be replaced (lookbehind semantics).
///
/// Buffer handling follows [`str_replace_counted`].
pub(crate) fn replace_unprotected<'r, F>(
    mut input: String,
    context: &ProtectedContext,
    scratch_buffer: String,
    mut next_match: F,
) -> (String, String, Counts)
where
    F: FnMut(&str, usize) -> Option<(Range<usize>, &'r str)>,
{
    let mut result = scratch_buffer;
    let mut counts = Counts::default();
    let mut last_end = 0;
    let mut at = 0;

    while at <= input.len() {
        let Some((range, replacement)) = next_match(&input, at) else {
            break;
        };

        if context.protects(&input, range.start) {
            counts.protected += 1;
            at = next_char_boundary(&input, range.start);
            continue;
        }

        result.push_str(&input[last_end..range.start]);
        result.push_str(replacement);
        counts.replaced += 1;

        last_end = range.end;
        at = range.end;
    }

    if counts.replaced == 0 {
        (input, result, counts)
    } else {
        result.push_str(&input[last_end..]);

        input.clear();
        (result, input, counts)
    }
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    index
        + text[index..]
            .chars()
            .next()
            .map_or(1, |c| c.len_utf8())
}
