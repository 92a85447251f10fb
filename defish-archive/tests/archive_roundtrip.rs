//! End-to-end archive tests over real temporary directories.

use defish_archive::Engine;
use defish_core::error::DefishError;
use std::fs;
use std::path::Path;

fn populate_nested(root: &Path) {
    fs::create_dir_all(root.join("docs/old")).unwrap();
    fs::write(root.join("readme.txt"), b"hello archive world, hello again").unwrap();
    fs::write(root.join("docs/a.bin"), (0..=255u8).collect::<Vec<u8>>()).unwrap();
    fs::write(root.join("docs/old/log.txt"), vec![b'z'; 5000]).unwrap();
    fs::write(root.join("docs/old/empty.dat"), b"").unwrap();
}

fn assert_same_tree(expected: &Path, actual: &Path) {
    for entry in fs::read_dir(expected).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name();
        let counterpart = actual.join(&name);
        if entry.path().is_dir() {
            assert!(counterpart.is_dir(), "missing directory {counterpart:?}");
            assert_same_tree(&entry.path(), &counterpart);
        } else {
            assert_eq!(
                fs::read(entry.path()).unwrap(),
                fs::read(&counterpart).unwrap(),
                "content mismatch for {counterpart:?}"
            );
        }
    }
}

fn roundtrip_with(seed: Option<u64>, lz77: bool) {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("source");
    populate_nested(&src);

    let mut compressor = Engine::new(&src, work.path()).with_lz77(lz77);
    if let Some(seed) = seed {
        compressor = compressor.with_seed(seed);
    }
    let report = compressor.compress().unwrap();
    assert_eq!(report.files_stored, 4);

    let out = work.path().join("restored");
    fs::create_dir_all(&out).unwrap();
    let mut extractor = Engine::new(&report.archive, &out);
    if let Some(seed) = seed {
        extractor = extractor.with_seed(seed);
    }
    let result = extractor.decompress().unwrap();
    assert_eq!(result.files_restored, 4);
    assert!(!result.quota_exhausted);
    assert_same_tree(&src, &out.join("source"));
}

#[test]
fn test_roundtrip_plain() {
    roundtrip_with(None, false);
}

#[test]
fn test_roundtrip_lz77() {
    roundtrip_with(None, true);
}

#[test]
fn test_roundtrip_cipher() {
    roundtrip_with(Some(0x0123_4567_89AB_CDEF), false);
}

#[test]
fn test_roundtrip_cipher_and_lz77() {
    roundtrip_with(Some(42), true);
}

#[test]
fn test_single_file_archive_exact_bytes() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("a.txt");
    fs::write(&src, b"a").unwrap();

    let report = Engine::new(&src, work.path()).compress().unwrap();
    let bytes = fs::read(&report.archive).unwrap();

    // flags: neither stage enabled
    assert_eq!(bytes[0], 0);
    // one Huffman block: 3-byte table record, 1 data byte, 7 filler bits
    let region = [
        0, 0, 0, 3, b'a', 1, 0x00, // table
        0, 0, 0, 1, 7, 0x00, // data
    ];
    assert_eq!(&bytes[5..18], &region);
    // tree pointer lands right after the single region
    let pointer = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    assert_eq!(pointer, 18);
    assert_eq!(report.bytes_written, bytes.len() as u64);
}

#[test]
fn test_tree_records_region_addresses() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("source");
    populate_nested(&src);

    let report = Engine::new(&src, work.path()).compress().unwrap();
    let engine = Engine::new(&report.archive, work.path());
    let (flags, tree) = engine.read_tree().unwrap();
    assert!(!flags.cipher());
    assert!(!flags.lz77());

    // Regions tile the span between the header and the tree with no gaps.
    let files = tree.all_files();
    assert_eq!(files.len(), 4);
    let mut expected_offset = 5u32;
    for file in &files {
        assert_eq!(file.offset, expected_offset, "gap before {}", file.name);
        expected_offset += file.length;
    }
    let archive_bytes = fs::read(&report.archive).unwrap();
    let pointer = u32::from_be_bytes([
        archive_bytes[1],
        archive_bytes[2],
        archive_bytes[3],
        archive_bytes[4],
    ]);
    assert_eq!(pointer, expected_offset);
}

#[test]
fn test_compress_write_limit_is_fatal() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("source");
    populate_nested(&src);

    let result = Engine::new(&src, work.path()).with_write_limit(64).compress();
    assert!(matches!(
        result,
        Err(DefishError::WriteLimitReached { limit: 64 })
    ));
}

#[test]
fn test_compress_write_limit_covers_tree_region() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("source");
    fs::create_dir_all(&src).unwrap();
    for i in 0..40 {
        fs::write(src.join(format!("f{i:02}.txt")), b"a").unwrap();
    }

    // 40 one-byte files make 13-byte regions (525 bytes with the header),
    // while their tree entries need far more than the remaining 75 bytes.
    // The limit must still be fatal when only the tree region overflows.
    let result = Engine::new(&src, work.path()).with_write_limit(600).compress();
    assert!(matches!(
        result,
        Err(DefishError::WriteLimitReached { limit: 600 })
    ));
}

#[test]
fn test_decompress_quota_exhaustion_is_reported() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("source");
    populate_nested(&src);
    let report = Engine::new(&src, work.path()).compress().unwrap();

    let out = work.path().join("restored");
    fs::create_dir_all(&out).unwrap();
    let result = Engine::new(&report.archive, &out)
        .with_write_limit(10)
        .decompress()
        .unwrap();
    assert!(result.quota_exhausted);
    assert!(result.files_restored < 4);
    assert!(result.bytes_written <= 10);
}

#[test]
fn test_read_tree_distinguishes_truncation_from_io_failure() {
    let work = tempfile::tempdir().unwrap();

    // A 3-byte stub is truncation, not a generic I/O failure.
    let stub = work.path().join("short.defish");
    fs::write(&stub, [0u8, 0, 0]).unwrap();
    assert!(matches!(
        Engine::new(&stub, work.path()).read_tree(),
        Err(DefishError::UnexpectedEof { expected: 5 })
    ));

    // A missing archive is an I/O failure, not truncation.
    let missing = work.path().join("missing.defish");
    assert!(matches!(
        Engine::new(&missing, work.path()).read_tree(),
        Err(DefishError::Io(_))
    ));
}

#[test]
fn test_enciphered_archive_requires_password() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("secret.txt");
    fs::write(&src, b"classified").unwrap();
    let report = Engine::new(&src, work.path())
        .with_seed(99)
        .compress()
        .unwrap();

    let out = work.path().join("restored");
    fs::create_dir_all(&out).unwrap();
    let result = Engine::new(&report.archive, &out).decompress();
    assert!(matches!(result, Err(DefishError::PasswordRequired)));
}

#[test]
fn test_wrong_password_garbles_content() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("secret.txt");
    fs::write(&src, b"classified but not for long").unwrap();
    let report = Engine::new(&src, work.path())
        .with_seed(99)
        .compress()
        .unwrap();

    let out = work.path().join("restored");
    fs::create_dir_all(&out).unwrap();
    Engine::new(&report.archive, &out)
        .with_seed(100)
        .decompress()
        .unwrap();
    let restored = fs::read(out.join("secret/secret.txt")).unwrap();
    assert_eq!(restored.len(), b"classified but not for long".len());
    assert_ne!(restored, b"classified but not for long");
}

#[test]
fn test_empty_directory_archive() {
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("hollow");
    fs::create_dir_all(&src).unwrap();

    let report = Engine::new(&src, work.path()).compress().unwrap();
    assert_eq!(report.files_stored, 0);
    let bytes = fs::read(&report.archive).unwrap();
    // No file regions, so the tree pointer is the header length.
    let pointer = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    assert_eq!(pointer, 5);
}
