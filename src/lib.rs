// SPDX-License-Identifier: MPL-2.0
//! # idswap
//!
//! Bulk rewriting of product identifiers in large text/XML catalogs.
//!
//! ## Overview
//!
//! `idswap` takes a document (typically a catalog export of several hundred
//! megabytes) and a directory of `(old id, new id)` pairs loaded from a CSV
//! file, and replaces every occurrence of each old id with its new id. One
//! exclusion applies: an old id directly preceded by the protected prefix
//! (by default the product URL `https://www.northcountryfire.com/products/`)
//! is left alone, because product links must keep pointing at the old pages.
//!
//! Identifiers are opaque strings and the document is opaque text: nothing
//! is parsed as XML, and the exclusion is purely lexical.
//!
//! ## Getting Started
//!
//! ```rust
//! use idswap::directory::{IdPair, IdentifierMapping};
//! use idswap::engine::{substitute, Strategy};
//! use idswap::protected::ProtectedContext;
//!
//! let mapping: IdentifierMapping = [IdPair::new("ABC123", "XYZ999", 2)].into_iter().collect();
//! let output = substitute(
//!     Strategy::MarkRestore,
//!     "see https://www.northcountryfire.com/products/ABC123 and also ABC123 alone".to_string(),
//!     mapping,
//!     ProtectedContext::default(),
//! )?;
//!
//! assert_eq!(
//!     output,
//!     "see https://www.northcountryfire.com/products/ABC123 and also XYZ999 alone"
//! );
//! # Ok::<(), idswap::engine::SubstitutionError>(())
//! ```
//!
//! ### Processing Files
//!
//! ```rust,no_run
//! use idswap::{config::ReplaceConfig, engine::LogProgress, pipeline::{replace_product_ids, Paths}};
//!
//! let paths = Paths {
//!     input: "data/ncfCatalogIdSwitch.xml".into(),
//!     directory: "data/productIdDirectory.csv".into(),
//!     output: "data/ncfCatalogIdSwitch-fixed.xml".into(),
//! };
//! let stats = replace_product_ids(&paths, &ReplaceConfig::default(), &mut LogProgress::default())?;
//! println!("replaced {} occurrences", stats.replaced);
//! # Ok::<(), idswap::pipeline::Error>(())
//! ```
//!
//! ## Modules and API
//!
//! ### `directory` Module
//!
//! Reads the CSV directory lazily (`DirectoryReader`) into an ordered
//! `IdentifierMapping`. Rows are kept in file order, duplicates included.
//!
//! ### `engine` Module
//!
//! The three substitution strategies behind the common `Substitute` trait:
//!
//! - **`Sequential`**: one regex scan per pair, chained. Slow baseline.
//! - **`Alternation`**: one aho-corasick scan over all old ids. Does not
//!   cascade (`X→Y, Y→Z` turns `X` into `Y`), rejects old ids mapped to
//!   different new ids.
//! - **`MarkRestore`**: literal mark, restore and replace passes per pair.
//!   Fastest on the historical workload and the default.
//!
//! On mappings where no old id occurs inside another and replacements do not
//! create new old ids, all three produce identical output.
//!
//! ### `pipeline` Module
//!
//! `replace_product_ids` wires the pieces together for files, writing the
//! output atomically.
//!
//! ## Logging and Error Handling
//!
//! - Uses the `tracing` crate for logging; the library never installs a
//!   subscriber. Progress is reported through an injected `ProgressReporter`.
//! - All errors are fatal for a run and carry the path, row or identifier
//!   needed to fix the input.

pub mod config;
pub mod directory;
pub mod engine;
#[cfg(test)]
mod integration_tests;
pub mod pipeline;
pub mod protected;
#[cfg(test)]
mod test_support;
mod utils;
