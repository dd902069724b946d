use hashstamp::hashing::{hash_bytes, hash_file, hash_path, Accumulator, PathPolicy};
use proptest::prelude::*;
use proptest::test_runner::{RngAlgorithm, TestRng};
use std::collections::HashSet;
use tempfile::TempDir;

fn random_bytes(rng: &mut TestRng, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}

#[test]
fn test_ten_thousand_random_files_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let mut rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    let mut contents = HashSet::new();
    let mut hashes = HashSet::new();

    for i in 0..10_000 {
        let len = (rng.next_u64() % 200) as usize;
        let content = random_bytes(&mut rng, len);
        if !contents.insert(content.clone()) {
            continue;
        }

        let path = dir.path().join(format!("{}.bin", i));
        std::fs::write(&path, &content).unwrap();
        let hash = hash_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(hashes.insert(hash), "collision for file {}", i);
    }

    assert_eq!(contents.len(), hashes.len());
}

#[test]
fn test_empty_and_zero_byte_files_differ() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty");
    let zero = dir.path().join("zero");
    std::fs::write(&empty, b"").unwrap();
    std::fs::write(&zero, [0u8]).unwrap();

    assert_ne!(hash_file(&empty).unwrap(), hash_file(&zero).unwrap());
}

#[test]
fn test_multi_chunk_file_hashes_identically_twice() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.bin");
    let mut rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    let content = random_bytes(&mut rng, 300 * 1024);
    std::fs::write(&path, &content).unwrap();

    assert_eq!(hash_file(&path).unwrap(), hash_file(&path).unwrap());
    assert_eq!(hash_file(&path).unwrap(), hash_bytes(&content));
}

#[test]
fn test_path_into_shared_accumulator() {
    // Path and content folded into one stream stay order sensitive
    let mut path_first = Accumulator::new();
    hash_path("/src/Main.java", &mut path_first, false, true);
    path_first.update(b"class Main {}");

    let mut content_first = Accumulator::new();
    content_first.update(b"class Main {}");
    hash_path("/src/Main.java", &mut content_first, false, true);

    assert_ne!(path_first.finish(), content_first.finish());
}

#[test]
fn test_empty_path_differs_from_root() {
    let policy = PathPolicy::new(false, false);
    assert_eq!(policy.fingerprint(""), policy.fingerprint(""));
    assert_ne!(policy.fingerprint(""), policy.fingerprint("/"));
}

proptest! {
    #[test]
    fn test_identical_bytes_hash_identically(
        content in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, &content).unwrap();
        std::fs::write(&b, &content).unwrap();

        prop_assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_appended_byte_changes_file_hash(
        content in prop::collection::vec(any::<u8>(), 0..512),
        extra in any::<u8>(),
    ) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, &content).unwrap();
        let mut longer = content.clone();
        longer.push(extra);
        std::fs::write(&b, &longer).unwrap();

        prop_assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_portable_mode_ignores_fs_case(path in "/[a-zA-Z0-9/._-]{0,64}") {
        prop_assert_eq!(
            PathPolicy::new(true, false).fingerprint(&path),
            PathPolicy::new(true, true).fingerprint(&path)
        );
    }
}
