//! [`TestWorkspace`] builder for conversion test scenarios.

use std::fs;
use std::path::Path;

use conv_fs::NormalizedPath;
use tempfile::TempDir;

/// A temporary workspace directory with helpers to lay out settings files.
///
/// # Example
///
/// ```rust,no_run
/// use conv_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.project(1, &["core/core.module.toml"]);
/// ws.module("core/core.module.toml", 1);
/// ws.assert_file_exists("project.toml");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `rel` resolved against the root.
    pub fn path(&self, rel: &str) -> NormalizedPath {
        NormalizedPath::new(self.root()).join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> NormalizedPath {
        let path = self.path(rel);
        let native = path.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&native, content).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        let path = self.root().join(rel);
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Single-file `project.toml` at `version` listing `modules` under the
    /// `$PROJECT_DIR$` macro.
    pub fn project(&self, version: i64, modules: &[&str]) -> NormalizedPath {
        self.write("project.toml", &project_source(version, modules))
    }

    /// Directory-based `.settings/` with `misc.toml` at `version` and a
    /// `modules.toml` listing `modules`.
    pub fn directory_project(&self, version: i64, modules: &[&str]) -> NormalizedPath {
        self.write(".settings/modules.toml", &module_list(modules));
        self.write(
            ".settings/misc.toml",
            &format!("version = {version}\n\n[component.ProjectRootManager]\nlanguage_level = \"8\"\n"),
        )
    }

    /// Module descriptor at `rel` with the given version.
    pub fn module(&self, rel: &str, version: i64) -> NormalizedPath {
        self.write(
            rel,
            &format!(
                "# module descriptor\nversion = {version}\n\n[component.Module]\ntype = \"JAVA_MODULE\"\n\n[component.ModuleRootManager]\nsource_folders = [\"src\"]\n"
            ),
        )
    }

    /// `workspace.toml` at `version` with one private run configuration.
    pub fn workspace_settings(&self, version: i64) -> NormalizedPath {
        self.write(
            "workspace.toml",
            &format!(
                "version = {version}\n\n[[component.RunManager.configuration]]\nname = \"local\"\ntype = \"Application\"\n"
            ),
        )
    }

    /// Current bytes of `rel`, for before/after comparisons.
    pub fn snapshot(&self, rel: &str) -> Vec<u8> {
        fs::read(self.root().join(rel)).unwrap()
    }

    pub fn set_readonly(&self, rel: &str, readonly: bool) {
        let path = self.root().join(rel);
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(readonly);
        fs::set_permissions(&path, permissions).unwrap();
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(full_path.exists(), "Expected file to exist: {}", full_path.display());
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(!full_path.exists(), "Expected file NOT to exist: {}", full_path.display());
    }

    /// Assert that the file at `path` contains `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read(path);
        assert!(
            file_content.contains(content),
            "File {path} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }
}

impl Drop for TestWorkspace {
    fn drop(&mut self) {
        // Read-only files would make TempDir cleanup fail on some platforms
        clear_readonly(self.temp_dir.path());
    }
}

fn clear_readonly(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            clear_readonly(&path);
        } else if let Ok(metadata) = fs::metadata(&path)
            && metadata.permissions().readonly()
        {
            let mut permissions = metadata.permissions();
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            let _ = fs::set_permissions(&path, permissions);
        }
    }
}

fn project_source(version: i64, modules: &[&str]) -> String {
    format!(
        "# project descriptor\nversion = {version}\n\n{}\n[component.CompilerConfiguration]\nencoding = \"UTF-8\"\n",
        module_list(modules)
    )
}

fn module_list(modules: &[&str]) -> String {
    let entries = modules
        .iter()
        .map(|m| format!("\"$PROJECT_DIR$/{m}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[component.ProjectModuleManager]\nmodules = [{entries}]\n")
}
