//! Drives the compiled `sbox` binary directly, the way a user would from a
//! shell. Covers the non-interactive flows only; the password prompt reads
//! from a real TTY and isn't exercised here.

use std::path::Path;
use std::process::Command;

fn sbox() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sbox"))
}

fn write_tree(root: &Path) {
    std::fs::write(root.join("a.txt"), b"hello from the cli").unwrap();
    std::fs::create_dir(root.join("sub")).unwrap();
    std::fs::write(root.join("sub").join("b.txt"), b"nested file").unwrap();
}

fn relative_files(root: &Path) -> Vec<String> {
    let mut out: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    out.sort();
    out
}

#[test]
fn create_then_extract_round_trips_a_directory() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_tree(src.path());

    let archive = src.path().with_extension("sbox");
    let status = sbox()
        .args(["-s", "create"])
        .arg(&archive)
        .arg(src.path())
        .status()
        .unwrap();
    assert!(status.success());
    assert!(archive.exists());

    let status = sbox()
        .args(["-s", "extract"])
        .arg(&archive)
        .arg(dst.path())
        .status()
        .unwrap();
    assert!(status.success());

    let extracted_root = dst.path().join(src.path().file_name().unwrap());
    assert_eq!(relative_files(src.path()), relative_files(&extracted_root));
    assert_eq!(
        std::fs::read(src.path().join("sub").join("b.txt")).unwrap(),
        std::fs::read(extracted_root.join("sub").join("b.txt")).unwrap()
    );
}

#[test]
fn list_prints_one_line_per_entry() {
    let src = tempfile::tempdir().unwrap();
    write_tree(src.path());

    let archive = src.path().with_extension("sbox");
    assert!(sbox()
        .args(["-s", "create"])
        .arg(&archive)
        .arg(src.path())
        .status()
        .unwrap()
        .success());

    let output = sbox().args(["list"]).arg(&archive).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("a.txt"));
    assert!(stdout.contains("b.txt"));
}

#[test]
fn test_mode_succeeds_on_an_intact_archive() {
    let src = tempfile::tempdir().unwrap();
    write_tree(src.path());

    let archive = src.path().with_extension("sbox");
    assert!(sbox()
        .args(["-s", "create"])
        .arg(&archive)
        .arg(src.path())
        .status()
        .unwrap()
        .success());

    let status = sbox().args(["-s", "test"]).arg(&archive).status().unwrap();
    assert!(status.success());
}

#[test]
fn test_mode_fails_on_a_corrupted_archive() {
    let src = tempfile::tempdir().unwrap();
    write_tree(src.path());

    let archive = src.path().with_extension("sbox");
    assert!(sbox()
        .args(["-s", "create"])
        .arg(&archive)
        .arg(src.path())
        .status()
        .unwrap()
        .success());

    let mut bytes = std::fs::read(&archive).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&archive, &bytes).unwrap();

    let status = sbox().args(["-s", "test"]).arg(&archive).status().unwrap();
    assert!(!status.success());
}

#[test]
fn extracting_a_missing_archive_reports_an_error() {
    let dst = tempfile::tempdir().unwrap();
    let status = sbox()
        .args(["-s", "extract"])
        .arg(dst.path().join("does-not-exist.sbox"))
        .arg(dst.path())
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn no_compression_flag_still_round_trips() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_tree(src.path());

    let archive = src.path().with_extension("sbox");
    assert!(sbox()
        .args(["-s", "create", "-n"])
        .arg(&archive)
        .arg(src.path())
        .status()
        .unwrap()
        .success());
    assert!(sbox()
        .args(["-s", "extract"])
        .arg(&archive)
        .arg(dst.path())
        .status()
        .unwrap()
        .success());

    let extracted_root = dst.path().join(src.path().file_name().unwrap());
    assert_eq!(relative_files(src.path()), relative_files(&extracted_root));
}
