//! Loading of the old-id → new-id directory.
//!
//! The directory is a CSV file with a header row. Two named columns hold the
//! old and the new identifier of each row; any other columns are ignored.
//! Rows are yielded lazily in file order and are neither deduplicated nor
//! normalised.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use aho_corasick::{AhoCorasick, MatchKind};

/// Names of the CSV columns holding the old and the new identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub old: String,
    pub new: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            old: "oldID".to_string(),
            new: "newID".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to open directory file `{}`", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("directory is missing the required column `{column}`")]
    MissingColumn { column: String },
    #[error("row {row}: missing value for column `{column}`")]
    MissingValue { row: u64, column: String },
    #[error("row {row}: malformed CSV")]
    Csv {
        row: u64,
        #[source]
        source: csv::Error,
    },
}

/// One row of the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPair {
    pub old_id: String,
    pub new_id: String,
    /// Line of the record in the source file (the header is line 1).
    pub row: u64,
}

impl IdPair {
    pub fn new(old_id: impl Into<String>, new_id: impl Into<String>, row: u64) -> Self {
        Self {
            old_id: old_id.into(),
            new_id: new_id.into(),
            row,
        }
    }
}

/// Lazy reader over the rows of a directory file.
pub struct DirectoryReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    old_index: usize,
    new_index: usize,
    columns: Columns,
}

impl DirectoryReader<BufReader<File>> {
    pub fn open(path: &Path, columns: Columns) -> Result<Self, DirectoryError> {
        let file = File::open(path).map_err(|source| DirectoryError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), columns)
    }
}

impl<R: Read> DirectoryReader<R> {
    pub fn from_reader(reader: R, columns: Columns) -> Result<Self, DirectoryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|source| DirectoryError::Csv { row: 1, source })?;
        let find_column = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| DirectoryError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let old_index = find_column(&columns.old)?;
        let new_index = find_column(&columns.new)?;

        tracing::debug!(
            old_column = %columns.old,
            old_index,
            new_column = %columns.new,
            new_index,
            "located directory columns"
        );

        Ok(Self {
            records: csv_reader.into_records(),
            old_index,
            new_index,
            columns,
        })
    }

    fn pair_from_record(&self, record: csv::StringRecord) -> Result<IdPair, DirectoryError> {
        let row = record.position().map_or(0, |position| position.line());
        let value = |index: usize, column: &str| match record.get(index) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(DirectoryError::MissingValue {
                row,
                column: column.to_string(),
            }),
        };

        Ok(IdPair {
            old_id: value(self.old_index, &self.columns.old)?,
            new_id: value(self.new_index, &self.columns.new)?,
            row,
        })
    }
}

impl<R: Read> Iterator for DirectoryReader<R> {
    type Item = Result<IdPair, DirectoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(match record {
            Ok(record) => self.pair_from_record(record),
            Err(source) => Err(DirectoryError::Csv {
                row: source.position().map_or(0, |position| position.line()),
                source,
            }),
        })
    }
}

/// The ordered, immutable list of identifier pairs for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMapping {
    pairs: Vec<IdPair>,
}

impl IdentifierMapping {
    pub fn new(pairs: Vec<IdPair>) -> Self {
        Self { pairs }
    }

    /// Drain a directory reader, stopping at the first bad row.
    pub fn load<R: Read>(reader: DirectoryReader<R>) -> Result<Self, DirectoryError> {
        reader.collect()
    }

    pub fn pairs(&self) -> &[IdPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IdPair> {
        self.pairs.iter()
    }

    /// Find pairs whose old id occurs inside the old id of another pair.
    ///
    /// Returns `(inner, outer)` index pairs into [`Self::pairs`]. Identical old
    /// ids are not reported here. On such mappings the strategies are not
    /// guaranteed to agree.
    pub fn nested_ids(&self) -> Vec<(usize, usize)> {
        if self.pairs.len() < 2 {
            return Vec::new();
        }

        let patterns = self.pairs.iter().map(|pair| pair.old_id.as_str());
        let automaton = match AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(patterns)
        {
            Ok(automaton) => automaton,
            Err(error) => {
                tracing::warn!(%error, "could not build automaton for nesting check");
                return Vec::new();
            }
        };

        let mut nested = Vec::new();
        for (outer, pair) in self.pairs.iter().enumerate() {
            for m in automaton.find_overlapping_iter(pair.old_id.as_str()) {
                let inner = m.pattern().as_usize();
                if self.pairs[inner].old_id != pair.old_id {
                    nested.push((inner, outer));
                }
            }
        }
        nested.sort_unstable();
        nested.dedup();
        nested
    }

    /// Find pairs whose old id overlaps itself (a proper prefix that is also
    /// a suffix, like `ABA`) or overlaps `protected_prefix`: either string
    /// contains the other, or the end of one is the start of the other.
    ///
    /// Returns indices into [`Self::pairs`]. Literal marking can consume text
    /// a lookbehind check would leave alone for such ids.
    pub fn overlapping_ids(&self, protected_prefix: &str) -> Vec<usize> {
        self.pairs
            .iter()
            .enumerate()
            .filter(|(_, pair)| {
                let old_id = pair.old_id.as_str();
                ends_overlap(old_id, old_id)
                    || protected_prefix.contains(old_id)
                    || old_id.contains(protected_prefix)
                    || ends_overlap(protected_prefix, old_id)
                    || ends_overlap(old_id, protected_prefix)
            })
            .map(|(index, _)| index)
            .collect()
    }
}

// some proper, non-empty suffix of `left` is a prefix of `right`
fn ends_overlap(left: &str, right: &str) -> bool {
    let (left, right) = (left.as_bytes(), right.as_bytes());
    (1..left.len().min(right.len())).any(|len| left.ends_with(&right[..len]))
}

impl FromIterator<IdPair> for IdentifierMapping {
    fn from_iter<T: IntoIterator<Item = IdPair>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IdentifierMapping {
    type Item = &'a IdPair;
    type IntoIter = std::slice::Iter<'a, IdPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
