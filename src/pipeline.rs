//! File-level driver: directory → engine → output file.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use tracing::instrument;

use crate::{
    config::ReplaceConfig,
    directory::{DirectoryError, DirectoryReader, IdentifierMapping},
    engine::{Engine, ProgressReporter, Substitute, SubstitutionError, SubstitutionStats},
    protected::ProtectedContext,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read input document `{}`", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output document `{}`", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
}

/// Paths of one run.
#[derive(Debug, Clone)]
pub struct Paths {
    pub input: PathBuf,
    pub directory: PathBuf,
    pub output: PathBuf,
}

/// Rewrite `paths.input` into `paths.output` using the directory at
/// `paths.directory`.
///
/// The whole directory is loaded and the engine prepared before the input is
/// read, so mapping errors surface without touching any document. The output
/// is written to a temporary file next to the destination and renamed into
/// place only after the substitution succeeded.
#[instrument(skip(config, reporter), fields(strategy = %config.strategy))]
pub fn replace_product_ids(
    paths: &Paths,
    config: &ReplaceConfig,
    reporter: &mut dyn ProgressReporter,
) -> Result<SubstitutionStats, Error> {
    let started = Instant::now();

    let reader = DirectoryReader::open(&paths.directory, config.columns.clone())?;
    let mapping = IdentifierMapping::load(reader)?;
    tracing::info!(pairs = mapping.len(), "loaded directory");

    let context = ProtectedContext::new(config.protected_prefix.clone())?;
    let engine = Engine::new(config.strategy, mapping, context)?;

    let document = std::fs::read_to_string(&paths.input).map_err(|source| Error::ReadInput {
        path: paths.input.clone(),
        source,
    })?;
    tracing::info!(bytes = document.len(), "loaded input document");

    let substitution_started = Instant::now();
    let (output, stats) = engine.substitute(document, reporter)?;
    tracing::info!(
        elapsed = ?substitution_started.elapsed(),
        replaced = stats.replaced,
        protected = stats.protected,
        "substitution done"
    );

    write_atomically(&paths.output, &output)?;
    tracing::info!(output = %paths.output.display(), elapsed = ?started.elapsed(), "wrote output document");

    Ok(stats)
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), Error> {
    let to_error = |source: std::io::Error| Error::WriteOutput {
        path: path.to_path_buf(),
        source,
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(to_error)?;
    file.write_all(contents.as_bytes()).map_err(to_error)?;
    file.as_file().sync_all().map_err(to_error)?;
    file.persist(path).map_err(|e| to_error(e.error))?;
    Ok(())
}
