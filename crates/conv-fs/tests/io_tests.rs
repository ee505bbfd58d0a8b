use conv_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("project.toml"));

    io::write_atomic(&path, b"version = 2\n").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "version = 2\n");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("project.toml");
    fs::write(&file_path, "version = 1\n").unwrap();

    io::write_atomic(&NormalizedPath::new(&file_path), b"version = 2\n").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "version = 2\n");
}

#[test]
fn test_write_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".settings/runConfigurations/app.toml"));

    io::write_text(&path, "version = 1\n").unwrap();

    assert_eq!(io::read_text(&path).unwrap(), "version = 1\n");
}

#[test]
fn test_write_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("workspace.toml"));

    io::write_text(&path, "content").unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
}

#[test]
fn test_read_text_nonexistent_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.toml"));
    assert!(io::read_text(&path).is_err());
}

#[test]
fn test_is_writable_regular_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("project.toml");
    fs::write(&file_path, "version = 1\n").unwrap();

    assert!(io::is_writable(&NormalizedPath::new(&file_path)));
}

#[test]
fn test_is_writable_missing_file_is_false() {
    let temp = TempDir::new().unwrap();
    assert!(!io::is_writable(&NormalizedPath::new(temp.path().join("absent.toml"))));
}

#[test]
fn test_is_writable_readonly_file_is_false() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("locked.toml");
    fs::write(&file_path, "version = 1\n").unwrap();

    let mut perms = fs::metadata(&file_path).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(&file_path, perms).unwrap();

    assert!(!io::is_writable(&NormalizedPath::new(&file_path)));
}
