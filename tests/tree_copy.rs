//! Concurrent tree copy: fidelity, concurrency independence, partial failure.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use backup_guard::fs_ops::copy_tree;
use backup_guard::BackupError;
use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;
use walkdir::WalkDir;

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    is_dir: bool,
    content: Vec<u8>,
    mode: u32,
    mtime: i64,
}

/// Relative path -> (kind, bytes, permission bits, mtime seconds) for a whole tree.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Entry> {
    let mut out = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
        let meta = entry.metadata().unwrap();
        let content = if meta.is_file() {
            fs::read(entry.path()).unwrap()
        } else {
            Vec::new()
        };
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & 0o777
        };
        #[cfg(not(unix))]
        let mode = u32::from(meta.permissions().readonly());
        out.insert(
            rel,
            Entry {
                is_dir: meta.is_dir(),
                content,
                mode,
                mtime: FileTime::from_last_modification_time(&meta).unix_seconds(),
            },
        );
    }
    out
}

#[cfg(unix)]
fn chmod(p: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(p, fs::Permissions::from_mode(mode)).unwrap();
}

/// A small but varied tree with distinct modes and old mtimes.
fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/nested/deeper")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("top.txt"), b"top level").unwrap();
    fs::write(root.join("docs/a.md"), b"# a").unwrap();
    fs::write(root.join("docs/b.md"), vec![7u8; 200_000]).unwrap();
    fs::write(root.join("docs/nested/c.bin"), [0u8, 1, 2, 3]).unwrap();
    fs::write(root.join("docs/nested/deeper/zero"), b"").unwrap();
    for i in 0..20 {
        fs::write(root.join(format!("docs/nested/f{i:02}.txt")), format!("file {i}")).unwrap();
    }

    #[cfg(unix)]
    {
        chmod(&root.join("top.txt"), 0o640);
        chmod(&root.join("docs/a.md"), 0o400);
        chmod(&root.join("docs/nested"), 0o750);
    }

    // Files first, then directories bottom-up so child writes do not bump them.
    let old = FileTime::from_unix_time(1_600_000_000, 0);
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.unwrap();
        set_file_mtime(entry.path(), old).unwrap();
    }
}

#[test]
fn copy_preserves_structure_content_and_metadata() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    build_tree(&src);
    let dst = td.path().join("dst");

    copy_tree(&src, &dst, 4).unwrap();

    assert_eq!(snapshot(&src), snapshot(&dst));
}

#[test]
fn result_does_not_depend_on_concurrency() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    build_tree(&src);
    let expected = snapshot(&src);

    for limit in [0usize, 1, 2, 8] {
        let dst = td.path().join(format!("dst_{limit}"));
        copy_tree(&src, &dst, limit).unwrap();
        assert_eq!(snapshot(&dst), expected, "concurrency {limit}");
    }
}

#[test]
fn existing_destination_is_replaced_not_merged() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    build_tree(&src);
    let dst = td.path().join("dst");
    fs::create_dir_all(dst.join("stale_dir")).unwrap();
    fs::write(dst.join("stale.txt"), b"old").unwrap();

    copy_tree(&src, &dst, 2).unwrap();

    assert!(!dst.join("stale.txt").exists());
    assert!(!dst.join("stale_dir").exists());
    assert_eq!(snapshot(&src), snapshot(&dst));
}

#[cfg(unix)]
#[test]
fn failure_in_one_subtree_keeps_completed_siblings() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    fs::create_dir_all(src.join("a_good")).unwrap();
    fs::create_dir_all(src.join("z_bad")).unwrap();
    fs::write(src.join("a_good/one.txt"), b"one").unwrap();
    fs::write(src.join("a_good/two.txt"), b"two").unwrap();
    std::os::unix::fs::symlink(td.path().join("missing"), src.join("z_bad/dangling")).unwrap();

    let dst = td.path().join("dst");
    let err = copy_tree(&src, &dst, 2).unwrap_err();

    // Outer group wraps the failing subdirectory, which wraps the file error.
    let BackupError::ConcurrentCopyFailed { source, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    let BackupError::ConcurrentCopyFailed { source: inner, .. } = source.as_ref() else {
        panic!("unexpected inner error: {source:?}");
    };
    assert_eq!(inner.code(), "file_stat_failed");
    assert!(!err.is_cancelled());

    // a_good sorts first and completed before the failure; nothing rolls it back.
    assert_eq!(fs::read(dst.join("a_good/one.txt")).unwrap(), b"one");
    assert_eq!(fs::read(dst.join("a_good/two.txt")).unwrap(), b"two");
}

#[test]
fn missing_source_fails_without_creating_destination() {
    let td = tempdir().unwrap();
    let dst = td.path().join("dst");
    let err = copy_tree(&td.path().join("absent"), &dst, 2).unwrap_err();
    assert_eq!(err.code(), "file_stat_failed");
    assert!(!dst.exists());
}

#[test]
fn copies_entries_with_long_names() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let long = "n".repeat(240);
    fs::create_dir_all(src.join("d".repeat(240))).unwrap();
    fs::write(src.join(&long), b"top").unwrap();
    fs::write(src.join("d".repeat(240)).join(&long), b"nested").unwrap();

    let dst = td.path().join("dst");
    copy_tree(&src, &dst, 2).unwrap();

    assert_eq!(fs::read(dst.join(&long)).unwrap(), b"top");
    assert_eq!(fs::read(dst.join("d".repeat(240)).join(&long)).unwrap(), b"nested");
}

#[cfg(unix)]
#[test]
fn failing_file_keeps_completed_sibling_in_same_directory() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), b"kept").unwrap();
    std::os::unix::fs::symlink(td.path().join("missing"), src.join("zz")).unwrap();

    let dst = td.path().join("dst");
    let err = copy_tree(&src, &dst, 1).unwrap_err();

    let BackupError::ConcurrentCopyFailed { source, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(source.code(), "file_stat_failed");
    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"kept");
    assert!(!dst.join("zz").exists());
}
