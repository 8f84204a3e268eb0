use super::*;
use std::collections::BTreeMap;
use tempfile::TempDir;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing multiple files (stored, no compression)
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

/// Hand-build a one-member stored ZIP whose filename bytes are written
/// verbatim with the UTF-8 flag clear, as legacy zip tools do. The zip
/// writer cannot produce this (it only writes UTF-8 names), so the local
/// file header, central directory and EOCD are laid out manually. The member
/// body is empty, which keeps every CRC and size field zero.
fn create_legacy_name_zip(archive_path: &Path, raw_name: &[u8]) {
    let name_len = raw_name.len() as u16;
    let mut buf: Vec<u8> = Vec::new();

    // local file header
    buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
    buf.extend_from_slice(&0u16.to_le_bytes()); // general-purpose flags, bit 0x800 clear
    buf.extend_from_slice(&0u16.to_le_bytes()); // method: stored
    buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
    buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
    buf.extend_from_slice(&0u32.to_le_bytes()); // crc-32
    buf.extend_from_slice(&0u32.to_le_bytes()); // compressed size
    buf.extend_from_slice(&0u32.to_le_bytes()); // uncompressed size
    buf.extend_from_slice(&name_len.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
    buf.extend_from_slice(raw_name);

    // central directory
    let cd_offset = buf.len() as u32;
    buf.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes()); // version made by
    buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
    buf.extend_from_slice(&0u16.to_le_bytes()); // flags
    buf.extend_from_slice(&0u16.to_le_bytes()); // method
    buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
    buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
    buf.extend_from_slice(&0u32.to_le_bytes()); // crc-32
    buf.extend_from_slice(&0u32.to_le_bytes()); // compressed size
    buf.extend_from_slice(&0u32.to_le_bytes()); // uncompressed size
    buf.extend_from_slice(&name_len.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk number start
    buf.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
    buf.extend_from_slice(&0u32.to_le_bytes()); // external attributes
    buf.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    buf.extend_from_slice(raw_name);
    let cd_size = buf.len() as u32 - cd_offset;

    // end of central directory
    buf.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk number
    buf.extend_from_slice(&0u16.to_le_bytes()); // cd start disk
    buf.extend_from_slice(&1u16.to_le_bytes()); // entries on this disk
    buf.extend_from_slice(&1u16.to_le_bytes()); // entries total
    buf.extend_from_slice(&cd_size.to_le_bytes());
    buf.extend_from_slice(&cd_offset.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length

    std::fs::write(archive_path, buf).unwrap();
}

/// Snapshot a directory tree as relative-path -> file content
fn tree_snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut snapshot = BTreeMap::new();
    for entry in WalkDir::new(root) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            snapshot.insert(relative, std::fs::read(entry.path()).unwrap());
        }
    }
    snapshot
}

// ---------------------------------------------------------------------------
// resolve_target
// ---------------------------------------------------------------------------

#[test]
fn single_rooted_archive_targets_containing_dir() {
    let names = vec!["X/a.txt".to_string(), "X/sub/b.txt".to_string()];
    let target = resolve_target(Path::new("/w/data.zip"), &names);
    assert_eq!(target, PathBuf::from("/w"));
}

#[test]
fn multi_rooted_archive_targets_stem_dir() {
    let names = vec!["a.txt".to_string(), "b.txt".to_string()];
    let target = resolve_target(Path::new("/w/data.zip"), &names);
    assert_eq!(target, PathBuf::from("/w/data"));
}

#[test]
fn two_top_level_dirs_target_stem_dir() {
    let names = vec!["X/a.txt".to_string(), "Y/b.txt".to_string()];
    let target = resolve_target(Path::new("/w/data.zip"), &names);
    assert_eq!(target, PathBuf::from("/w/data"));
}

#[test]
fn backslash_separated_names_count_as_paths() {
    let names = vec!["X\\a.txt".to_string(), "X\\b.txt".to_string()];
    let target = resolve_target(Path::new("/w/data.zip"), &names);
    assert_eq!(target, PathBuf::from("/w"));
}

#[test]
fn empty_member_list_targets_stem_dir() {
    let target = resolve_target(Path::new("/w/data.zip"), &[]);
    assert_eq!(target, PathBuf::from("/w/data"));
}

// ---------------------------------------------------------------------------
// sanitized_relative
// ---------------------------------------------------------------------------

#[test]
fn sanitized_relative_keeps_nested_paths() {
    assert_eq!(
        sanitized_relative("a/b/c.txt"),
        Some(PathBuf::from("a/b/c.txt"))
    );
}

#[test]
fn sanitized_relative_rejects_traversal_and_absolute() {
    assert_eq!(sanitized_relative("../evil.txt"), None);
    assert_eq!(sanitized_relative("a/../../evil.txt"), None);
    assert_eq!(sanitized_relative("/etc/passwd"), None);
    assert_eq!(sanitized_relative(""), None);
}

#[test]
fn sanitized_relative_drops_dot_segments() {
    assert_eq!(
        sanitized_relative("./a//b/./c.txt"),
        Some(PathBuf::from("a/b/c.txt"))
    );
}

// ---------------------------------------------------------------------------
// ArchiveExtractor
// ---------------------------------------------------------------------------

#[test]
fn missing_archive_is_a_silent_no_op() {
    let temp = TempDir::new().unwrap();
    let gone = temp.path().join("vanished.zip");
    ArchiveExtractor::extract(&gone).unwrap();
}

#[test]
fn corrupt_archive_surfaces_one_error() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("broken.zip");
    std::fs::write(&archive, b"this is not a zip file").unwrap();

    let err = ArchiveExtractor::extract(&archive).unwrap_err();
    assert!(err.to_string().contains("broken.zip"));
}

#[test]
fn self_rooted_archive_recreates_root_in_place() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("bundle.zip");
    create_zip_archive(
        &archive,
        &[
            ("project/readme.txt", b"hello".as_ref()),
            ("project/src/main.rs", b"fn main() {}".as_ref()),
        ],
    );

    ArchiveExtractor::extract(&archive).unwrap();

    assert_eq!(
        std::fs::read(temp.path().join("project/readme.txt")).unwrap(),
        b"hello"
    );
    assert_eq!(
        std::fs::read(temp.path().join("project/src/main.rs")).unwrap(),
        b"fn main() {}"
    );
    // No stem-named wrapper directory for a self-rooted archive
    assert!(!temp.path().join("bundle").exists());
}

#[test]
fn multi_rooted_archive_lands_in_stem_dir() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("data.zip");
    create_zip_archive(
        &archive,
        &[("a.txt", b"aaa".as_ref()), ("b.txt", b"bbb".as_ref())],
    );

    ArchiveExtractor::extract(&archive).unwrap();

    assert_eq!(std::fs::read(temp.path().join("data/a.txt")).unwrap(), b"aaa");
    assert_eq!(std::fs::read(temp.path().join("data/b.txt")).unwrap(), b"bbb");
}

#[test]
fn extraction_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("data.zip");
    create_zip_archive(
        &archive,
        &[
            ("one/a.txt", b"alpha".as_ref()),
            ("two/b.txt", b"beta".as_ref()),
        ],
    );

    ArchiveExtractor::extract(&archive).unwrap();
    let first = tree_snapshot(temp.path());

    ArchiveExtractor::extract(&archive).unwrap();
    let second = tree_snapshot(temp.path());

    assert_eq!(first, second);
    assert!(first.contains_key(Path::new("data/one/a.txt")));
}

#[test]
fn traversal_member_is_skipped_not_fatal() {
    let temp = TempDir::new().unwrap();
    let inner = temp.path().join("inner");
    std::fs::create_dir(&inner).unwrap();
    let archive = inner.join("tricky.zip");
    create_zip_archive(
        &archive,
        &[
            ("../escape.txt", b"nope".as_ref()),
            ("ok.txt", b"fine".as_ref()),
        ],
    );

    ArchiveExtractor::extract(&archive).unwrap();

    assert!(!temp.path().join("escape.txt").exists());
    assert_eq!(
        std::fs::read(inner.join("tricky/ok.txt")).unwrap(),
        b"fine"
    );
}

#[test]
fn legacy_encoded_member_name_is_repaired() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("legacy.zip");
    // "中文文件名.txt" in GB2312/GBK, UTF-8 flag clear
    let raw_name: &[u8] = &[
        0xD6, 0xD0, 0xCE, 0xC4, 0xCE, 0xC4, 0xBC, 0xFE, 0xC3, 0xFB, b'.', b't', b'x', b't',
    ];
    create_legacy_name_zip(&archive, raw_name);

    ArchiveExtractor::extract(&archive).unwrap();

    // One member with no path separator: single top-level segment, so it
    // lands directly in the containing directory.
    let extracted: Vec<String> = tree_snapshot(temp.path())
        .keys()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".txt"))
        .collect();
    assert_eq!(extracted.len(), 1, "expected exactly one extracted member");
    // Detection is heuristic, so assert a clean decode rather than the
    // exact recovered string.
    assert!(
        !extracted[0].contains('\u{FFFD}'),
        "decoded name still contains replacement characters: {:?}",
        extracted[0]
    );
}

#[test]
fn utf8_flagged_names_are_taken_verbatim() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("unicode.zip");
    // The zip writer stores non-ASCII names as UTF-8 with the flag set.
    create_zip_archive(
        &archive,
        &[("目录/файл.txt", b"data".as_ref()), ("目录/b.txt", b"x".as_ref())],
    );

    ArchiveExtractor::extract(&archive).unwrap();

    assert_eq!(
        std::fs::read(temp.path().join("目录/файл.txt")).unwrap(),
        b"data"
    );
}
