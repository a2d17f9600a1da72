use proptest::prelude::*;
use justone::duplicates::{group_by_size, DuplicateFinder, FinderConfig, StrictnessMode};
use justone::scanner::{FileRecord, Hasher, StatSignature};
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

proptest! {
    #[test]
    fn test_digest_determinism(content in proptest::collection::vec(any::<u8>(), 0..10_000)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::new();
        let first = hasher.digest(&path, content.len() as u64).unwrap();
        let second = hasher.digest(&path, content.len() as u64).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_prehash_agrees_with_digest_for_small_files(
        content in proptest::collection::vec(any::<u8>(), 0..4096)
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::new();
        let prehash = hasher.prehash(&path).unwrap();
        let digest = hasher.digest(&path, content.len() as u64).unwrap();

        prop_assert_eq!(prehash, digest);
    }

    #[test]
    fn test_group_by_size_invariants(sizes in prop::collection::vec(0u64..1000, 0..50)) {
        let records: Vec<FileRecord> = sizes.iter().enumerate().map(|(i, &size)| {
            let mut r = FileRecord::new(
                std::path::PathBuf::from(format!("/fake/path/{}", i)),
                size,
                StatSignature::default(),
            );
            r.index = i;
            r
        }).collect();

        let (buckets, stats) = group_by_size(records.clone());

        // All files in a bucket share the bucket's size, and every bucket
        // has at least two members.
        for (size, files) in &buckets {
            for file in files {
                prop_assert_eq!(file.size, *size);
            }
            prop_assert!(files.len() >= 2);
        }

        prop_assert_eq!(stats.total_files, records.len());

        let surviving: usize = buckets.values().map(Vec::len).sum();
        prop_assert_eq!(stats.potential_duplicates, surviving);
        prop_assert_eq!(stats.eliminated_unique + surviving, records.len());
    }

    #[test]
    fn test_finder_partition_invariants(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 2..12)
    ) {
        let dir = TempDir::new().unwrap();
        for (i, content) in contents.iter().enumerate() {
            fs::write(dir.path().join(format!("f{i:02}")), content).unwrap();
        }

        let finder = DuplicateFinder::new(
            FinderConfig::new()
                .with_strictness(StrictnessMode::Exhaustive)
                .with_io_threads(2),
        );
        let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

        prop_assert_eq!(summary.total_files, contents.len());

        // Groups are disjoint, have at least two members, and are
        // size-uniform.
        let mut seen = HashSet::new();
        for group in &groups {
            prop_assert!(group.len() >= 2);
            for file in &group.files {
                prop_assert_eq!(file.size, group.size);
                prop_assert!(seen.insert(file.path.clone()), "file in two groups");
            }
        }

        // Group membership matches content equality exactly.
        let mut by_content: std::collections::HashMap<&[u8], usize> = std::collections::HashMap::new();
        for content in &contents {
            *by_content.entry(content.as_slice()).or_default() += 1;
        }
        let expected_groups = by_content.values().filter(|&&n| n > 1).count();
        prop_assert_eq!(groups.len(), expected_groups);
    }

    #[test]
    fn test_all_modes_agree(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..100), 2..8)
    ) {
        let dir = TempDir::new().unwrap();
        for (i, content) in contents.iter().enumerate() {
            fs::write(dir.path().join(format!("f{i}")), content).unwrap();
        }
        let roots = [dir.path().to_path_buf()];

        let mut results = Vec::new();
        for mode in [StrictnessMode::Hash, StrictnessMode::Shallow, StrictnessMode::Exhaustive] {
            let finder = DuplicateFinder::new(
                FinderConfig::new().with_strictness(mode).with_io_threads(2),
            );
            let (groups, _) = finder.find_duplicates(&roots).unwrap();
            let paths: Vec<Vec<_>> = groups
                .iter()
                .map(|g| g.files.iter().map(|f| f.path.clone()).collect())
                .collect();
            results.push(paths);
        }

        prop_assert_eq!(&results[0], &results[1]);
        prop_assert_eq!(&results[1], &results[2]);
    }
}
