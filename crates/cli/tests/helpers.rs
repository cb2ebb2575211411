use std::fs;
use std::path::Path;

use tagfix::commands::parse_address_arg;
use tagfix::{default_project_name, resolve_root, snapshot_fingerprint, try_snapshot_fingerprint};
use tempfile::tempdir;

#[test]
fn resolve_root_canonicalizes_existing_and_joins_missing_roots() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = resolve_root("nested").expect("resolve nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));

    let current = resolve_root(".").expect("resolve dot");
    assert_eq!(current, tmp.path().canonicalize().expect("canonicalize tmp"));

    let missing = resolve_root("not-yet").expect("fallback");
    assert!(missing.ends_with("not-yet"));

    let absolute = resolve_root(&subdir.to_string_lossy()).expect("resolve absolute");
    assert_eq!(absolute, subdir.canonicalize().expect("canonicalize subdir"));

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn default_project_name_uses_last_path_component() {
    assert_eq!(default_project_name(Path::new("/work/firmware-v2")), "firmware-v2");
    assert_eq!(default_project_name(Path::new("/")), "tagfix-project");
}

#[test]
fn snapshot_fingerprint_is_the_sha256_of_the_file() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("database.json");
    fs::write(&path, b"abc").expect("write");

    assert_eq!(
        snapshot_fingerprint(&path).expect("hash"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    let missing = tmp.path().join("missing.json");
    let err = snapshot_fingerprint(&missing).unwrap_err();
    assert!(err.to_string().contains("Failed to read snapshot for hashing"));
    assert_eq!(try_snapshot_fingerprint(&missing), None);
}

#[test]
fn parse_address_arg_accepts_hex_and_decimal() {
    assert_eq!(parse_address_arg("0x1000").unwrap(), 0x1000);
    assert_eq!(parse_address_arg("4096").unwrap(), 0x1000);
    let err = parse_address_arg("main").unwrap_err();
    assert!(err.to_string().contains("Invalid address 'main'"));
}
