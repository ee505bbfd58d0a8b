use conv_fs::NormalizedPath;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("foo/bar/baz", "foo/bar/baz")]
#[case("foo\\bar\\baz", "foo/bar/baz")]
#[case("foo/bar\\baz", "foo/bar/baz")]
#[case("foo//bar/./baz", "foo/bar/baz")]
#[case("/ws/modules/../core.module.toml", "/ws/core.module.toml")]
#[case("/ws/", "/ws")]
fn test_normalization(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_same_file_spellings_are_equal() {
    let a = NormalizedPath::new("/ws/./core/core.module.toml");
    let b = NormalizedPath::new("/ws/core//core.module.toml");
    assert_eq!(a, b);
}

#[test]
fn test_join_paths() {
    let base = NormalizedPath::new("/ws");
    assert_eq!(base.join("core/core.module.toml").as_str(), "/ws/core/core.module.toml");
}

#[test]
fn test_join_absolute_replaces_base() {
    let base = NormalizedPath::new("/ws");
    assert_eq!(base.join("/elsewhere/a.toml").as_str(), "/elsewhere/a.toml");
}

#[test]
fn test_parent() {
    let path = NormalizedPath::new("/ws/core/core.module.toml");
    assert_eq!(path.parent().unwrap().as_str(), "/ws/core");
    assert_eq!(NormalizedPath::new("/ws").parent().unwrap().as_str(), "/");
    assert!(NormalizedPath::new("/").parent().is_none());
}

#[test]
fn test_file_name_and_extension() {
    let path = NormalizedPath::new("/ws/core/core.module.toml");
    assert_eq!(path.file_name(), Some("core.module.toml"));
    assert_eq!(path.extension(), Some("toml"));
    assert_eq!(NormalizedPath::new("/ws/.settings").extension(), None);
}

#[test]
fn test_relative_to() {
    let root = NormalizedPath::new("/ws");
    let file = NormalizedPath::new("/ws/core/core.module.toml");
    assert_eq!(file.relative_to(&root), Some("core/core.module.toml"));
    assert_eq!(NormalizedPath::new("/wsx/a").relative_to(&root), None);
}

#[test]
fn test_is_absolute() {
    assert!(NormalizedPath::new("/ws").is_absolute());
    assert!(NormalizedPath::new("C:\\ws").is_absolute());
    assert!(!NormalizedPath::new("ws/a").is_absolute());
}

#[test]
fn test_is_network_path() {
    assert!(NormalizedPath::new("//server/share/path").is_network_path());
    assert!(!NormalizedPath::new("/home/user/project").is_network_path());
}
