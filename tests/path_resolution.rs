//! Reported paths are absolute regardless of how roots are spelled.

use std::fs;
use std::path::PathBuf;

use justone::duplicates::{DuplicateFinder, FinderConfig};
use tempfile::TempDir;

// Sole test in this binary: it owns the process working directory.
#[test]
fn test_relative_root_yields_absolute_paths() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"pair of duplicates").unwrap();
    fs::write(data.join("b.txt"), b"pair of duplicates").unwrap();

    std::env::set_current_dir(dir.path()).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::new().with_io_threads(2));
    let (groups, summary) = finder.find_duplicates(&[PathBuf::from("data")]).unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    for file in &groups[0].files {
        assert!(
            file.path.is_absolute(),
            "expected absolute path, got {}",
            file.path.display()
        );
        assert!(file.path.exists());
    }
}
