use std::{fs, path::Path};

use crate::{
    config::ReplaceConfig,
    directory::DirectoryError,
    engine::{NoProgress, Strategy, SubstitutionError},
    pipeline::{replace_product_ids, Error, Paths},
};

fn setup(dir: &Path, document: &str, directory: &str) -> Paths {
    let paths = Paths {
        input: dir.join("ncfCatalogIdSwitch.xml"),
        directory: dir.join("productIdDirectory.csv"),
        output: dir.join("ncfCatalogIdSwitch-fixed.xml"),
    };
    fs::write(&paths.input, document).unwrap();
    fs::write(&paths.directory, directory).unwrap();
    paths
}

fn config(strategy: Strategy) -> ReplaceConfig {
    ReplaceConfig {
        strategy,
        ..ReplaceConfig::default()
    }
}

#[test]
fn test_single_row_directory() {
    for strategy in Strategy::ALL {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path(), "A1-A1", "oldID,newID\nA1,B2\n");

        let stats = replace_product_ids(&paths, &config(strategy), &mut NoProgress).unwrap();

        assert_eq!(fs::read_to_string(&paths.output).unwrap(), "B2-B2", "{strategy}");
        assert_eq!(stats.replaced, 2, "{strategy}");
    }
}

#[test]
fn test_catalog_document() {
    let document = r#"<catalog>
  <product product-id="1001-BLK">
    <page-attributes><page-url>https://www.northcountryfire.com/products/1001-BLK</page-url></page-attributes>
    <variations><variant product-id="2002-WHT"/></variations>
  </product>
</catalog>
"#;
    let expected = r#"<catalog>
  <product product-id="napoleon-1001-black">
    <page-attributes><page-url>https://www.northcountryfire.com/products/1001-BLK</page-url></page-attributes>
    <variations><variant product-id="napoleon-2002-white"/></variations>
  </product>
</catalog>
"#;
    let directory = "oldID,newID,brand\n1001-BLK,napoleon-1001-black,Napoleon\n2002-WHT,napoleon-2002-white,Napoleon\n";

    for strategy in Strategy::ALL {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path(), document, directory);

        replace_product_ids(&paths, &config(strategy), &mut NoProgress).unwrap();

        assert_eq!(fs::read_to_string(&paths.output).unwrap(), expected, "{strategy}");
    }
}

#[test]
fn test_output_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let paths = setup(dir.path(), "A1", "oldID,newID\nA1,B2\n");
    fs::write(&paths.output, "stale content that is much longer than the result").unwrap();

    replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap();

    assert_eq!(fs::read_to_string(&paths.output).unwrap(), "B2");
}

#[test]
fn test_missing_input_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = setup(dir.path(), "", "oldID,newID\nA1,B2\n");
    paths.input = dir.path().join("does-not-exist.xml");

    let error = replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap_err();

    assert!(matches!(error, Error::ReadInput { .. }));
    assert!(!paths.output.exists());
}

#[test]
fn test_unwritable_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = setup(dir.path(), "A1", "oldID,newID\nA1,B2\n");
    paths.output = dir.path().join("missing").join("ncfCatalogIdSwitch-fixed.xml");

    let error = replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap_err();

    assert!(matches!(error, Error::WriteOutput { ref path, .. } if *path == paths.output));
    assert!(!paths.output.exists());
    assert!(!dir.path().join("missing").exists());
}

#[test]
fn test_missing_directory_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = setup(dir.path(), "A1", "");
    paths.directory = dir.path().join("does-not-exist.csv");

    let error = replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap_err();

    assert!(matches!(
        error,
        Error::Directory(DirectoryError::FileAccess { .. })
    ));
}

#[test]
fn test_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let paths = setup(dir.path(), "A1", "old,new\nA1,B2\n");

    let error = replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap_err();

    assert!(matches!(
        error,
        Error::Directory(DirectoryError::MissingColumn { .. })
    ));
    assert!(!paths.output.exists());
}

#[test]
fn test_sentinel_collision_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let paths = setup(dir.path(), "A1 \u{E000}", "oldID,newID\nA1,B2\n");

    let error = replace_product_ids(&paths, &config(Strategy::MarkRestore), &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Substitution(SubstitutionError::SentinelCollision { .. })
    ));
    assert!(!paths.output.exists());
}

#[test]
fn test_ambiguous_mapping_is_detected_before_reading_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = setup(dir.path(), "", "oldID,newID\nA1,B2\nA1,C3\n");
    // would fail with ReadInput if the document were read first
    paths.input = dir.path().join("does-not-exist.xml");

    let error = replace_product_ids(&paths, &config(Strategy::Alternation), &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Substitution(SubstitutionError::AmbiguousMapping {
            first_row: 2,
            second_row: 3,
            ..
        })
    ));
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = setup(
        dir.path(),
        "https://www.northcountryfire.com/products/X9 X9",
        "oldID,newID\nX9,Y8\n",
    );

    replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap();
    let first = fs::read_to_string(&paths.output).unwrap();
    replace_product_ids(&paths, &ReplaceConfig::default(), &mut NoProgress).unwrap();
    let second = fs::read_to_string(&paths.output).unwrap();

    assert_eq!(first, "https://www.northcountryfire.com/products/X9 Y8");
    assert_eq!(first, second);
}
