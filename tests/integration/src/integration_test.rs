//! End-to-end conversion of a directory-based workspace
//!
//! Exercises the complete flow: layout detection -> rules loading ->
//! ordered conversion -> backup -> record -> restore.

use std::fs;
use std::path::Path;

use conv_core::{
    BackupManager, ConversionContext, ConversionOptions, ConversionRecord, ConversionService,
    RulesProvider, SilentListener,
};
use conv_fs::{NormalizedPath, StorageScheme};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// A directory-based workspace at schema 1 plus two chained rules files.
fn setup_workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(
        root,
        ".settings/modules.toml",
        r#"[component.ProjectModuleManager]
modules = [
    "$PROJECT_DIR$/app/app.module.toml",
    { path = "$PROJECT_DIR$/lib/lib.module.toml" },
]
"#,
    );
    write(root, ".settings/misc.toml", "version = 1\n\n[component.ProjectRootManager]\nlanguage_level = \"8\"\n");
    write(
        root,
        ".settings/workspace.toml",
        r#"version = 1

[[component.RunManager.configuration]]
name = "local"
type = "Application"
"#,
    );
    write(
        root,
        ".settings/runConfigurations/tests.toml",
        r#"# shared with the team
[[component.ProjectRunConfigurationManager.configuration]]
name = "tests"
type = "Application"
"#,
    );
    for name in ["app", "lib"] {
        write(
            root,
            &format!("{name}/{name}.module.toml"),
            "version = 1\n\n[component.Module]\ntype = \"JAVA_MODULE\"\n\n[component.ModuleRootManager]\nsource_folders = [\"src\"]\n",
        );
    }

    write(
        root,
        "rules/v2.toml",
        r#"
id = "v2"
description = "Schema 2"

[workspace]
to_version = 2

[module]
to_version = 2
rename_components = { ModuleRootManager = "SourceRoots" }

[run_configurations.rename_types]
Application = "JvmApplication"
"#,
    );
    write(
        root,
        "rules/v3.yaml",
        "id: v3\ndescription: Schema 3\npreceding: [v2]\nmodule:\n  to_version: 3\n  remove_components: [SourceRoots]\n",
    );

    temp
}

fn service(root: &Path) -> ConversionService {
    // Registered out of order; v3 declares v2 as its predecessor
    ConversionService::new()
        .with_provider(RulesProvider::from_file(&NormalizedPath::new(root.join("rules/v3.yaml"))).unwrap())
        .with_provider(RulesProvider::from_file(&NormalizedPath::new(root.join("rules/v2.toml"))).unwrap())
}

#[test]
fn test_directory_workspace_full_conversion() {
    let temp = setup_workspace();
    let root = temp.path();
    let misc_before = read(root, ".settings/misc.toml");

    let service = service(root);
    let mut context = ConversionContext::new(root).unwrap();
    assert_eq!(context.storage_scheme(), StorageScheme::DirectoryBased);
    assert_eq!(context.module_files().len(), 2);

    let report = service
        .run(&mut context, ConversionOptions::default(), &mut SilentListener)
        .unwrap();
    assert_eq!(report.converters, vec!["v2".to_string(), "v3".to_string()]);
    assert!(report.backup.is_some());

    // Modules went through both converters in order
    for name in ["app", "lib"] {
        let module = read(root, &format!("{name}/{name}.module.toml"));
        assert!(module.contains("version = 3"), "{module}");
        assert!(module.contains("[component.Module]"));
        assert!(!module.contains("ModuleRootManager"));
        assert!(!module.contains("SourceRoots"));
    }

    // Run configurations converted in both stores
    let workspace = read(root, ".settings/workspace.toml");
    assert!(workspace.contains("version = 2"));
    assert!(workspace.contains("type = \"JvmApplication\""));
    let shared = read(root, ".settings/runConfigurations/tests.toml");
    assert!(shared.starts_with("# shared with the team"));
    assert!(shared.contains("type = \"JvmApplication\""));

    // The project file is never converted in the directory scheme
    assert_eq!(read(root, ".settings/misc.toml"), misc_before);

    let record = ConversionRecord::load(context.layout()).unwrap();
    assert!(record.contains("v2") && record.contains("v3"));
    assert!(root.join(".settings/conversion.toml").is_file());
    assert!(!root.join(".conversion.toml").exists());
}

#[test]
fn test_second_run_is_a_no_op() {
    let temp = setup_workspace();
    let root = temp.path();
    let service = service(root);

    let mut context = ConversionContext::new(root).unwrap();
    service
        .run(&mut context, ConversionOptions::default(), &mut SilentListener)
        .unwrap();
    let after = read(root, "app/app.module.toml");

    let mut context = ConversionContext::new(root).unwrap();
    let pending = service.prepare(&mut context).unwrap();
    assert!(!pending.is_conversion_needed());
    assert!(pending.affected_files().is_empty());

    let report = service
        .convert(&mut context, pending, ConversionOptions::default(), &mut SilentListener)
        .unwrap();
    assert!(report.saved_files.is_empty());
    assert!(report.backup.is_none());
    assert_eq!(read(root, "app/app.module.toml"), after);
}

#[test]
fn test_backup_restores_previous_state() {
    let temp = setup_workspace();
    let root = temp.path();
    let originals: Vec<(&str, String)> = [
        ".settings/workspace.toml",
        ".settings/runConfigurations/tests.toml",
        "app/app.module.toml",
        "lib/lib.module.toml",
    ]
    .into_iter()
    .map(|rel| (rel, read(root, rel)))
    .collect();

    let mut context = ConversionContext::new(root).unwrap();
    let report = service(root)
        .run(&mut context, ConversionOptions::default(), &mut SilentListener)
        .unwrap();
    assert_eq!(report.saved_files.len(), originals.len());

    let manager = BackupManager::new(context.layout());
    let backup = manager.latest_backup().unwrap().expect("backup exists");
    assert_eq!(Some(&backup.path), report.backup.as_ref());
    assert_eq!(backup.metadata.converters, vec!["v2".to_string(), "v3".to_string()]);
    assert_eq!(backup.metadata.files.len(), originals.len());

    let restored = manager.restore_backup(&backup).unwrap();
    assert_eq!(restored.len(), originals.len());
    for (rel, content) in &originals {
        assert_eq!(&read(root, rel), content, "{rel} not restored");
    }
}
