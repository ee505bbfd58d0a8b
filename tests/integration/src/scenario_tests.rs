//! Conversion scenarios grouped by concern
//!
//! Each module covers one area of the pipeline against real files on disk.

use conv_core::{
    ConversionContext, ConversionOptions, ConversionRules, ConversionService, Error, FileRules,
    RulesProvider, RunConfigurationRules, SilentListener,
};
use conv_test_utils::TestWorkspace;

fn module_rules(id: &str, to_version: i64, preceding: &[&str]) -> RulesProvider {
    RulesProvider::new(ConversionRules {
        id: id.to_string(),
        description: String::new(),
        preceding: preceding.iter().map(|s| s.to_string()).collect(),
        record_only: false,
        project: None,
        workspace: None,
        module: Some(FileRules {
            to_version,
            rename_components: Default::default(),
            remove_components: Vec::new(),
        }),
        run_configurations: None,
    })
    .unwrap()
}

// ============================================================================
// S1: single-file workspaces
// ============================================================================

mod s1_single_file {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Shared run configurations live in the project file in this scheme
    #[test]
    fn s1_1_shared_run_configurations_in_project_file() {
        let ws = TestWorkspace::new();
        ws.project(2, &[]);
        let project = ws.read("project.toml");
        ws.write(
            "project.toml",
            &format!(
                "{project}\n[[component.ProjectRunConfigurationManager.configuration]]\nname = \"shared\"\ntype = \"Application\"\n"
            ),
        );

        let mut rename_types = std::collections::BTreeMap::new();
        rename_types.insert("Application".to_string(), "JvmApplication".to_string());
        let provider = RulesProvider::new(ConversionRules {
            id: "run-types".to_string(),
            description: String::new(),
            preceding: Vec::new(),
            record_only: false,
            project: None,
            workspace: None,
            module: None,
            run_configurations: Some(RunConfigurationRules { rename_types }),
        })
        .unwrap();

        let service = ConversionService::new().with_provider(provider);
        let mut context = ConversionContext::new(ws.root()).unwrap();
        let pending = service.prepare(&mut context).unwrap();
        // workspace.toml does not exist, so only the project file is affected
        assert_eq!(pending.affected_files(), &[ws.path("project.toml")]);

        service
            .convert(&mut context, pending, ConversionOptions::default(), &mut SilentListener)
            .unwrap();
        ws.assert_file_contains("project.toml", "type = \"JvmApplication\"");
        ws.assert_file_contains("project.toml", "# project descriptor");
        ws.assert_file_not_exists("workspace.toml");
    }

    #[test]
    fn s1_2_explicit_project_file_path() {
        let ws = TestWorkspace::new();
        let project = ws.project(1, &["core/core.module.toml"]);
        ws.module("core/core.module.toml", 1);

        let service = ConversionService::new().with_provider(module_rules("m2", 2, &[]));
        let mut context = ConversionContext::new(project.to_native()).unwrap();
        let report = service
            .run(&mut context, ConversionOptions::default(), &mut SilentListener)
            .unwrap();

        assert_eq!(report.saved_files, vec![ws.path("core/core.module.toml")]);
        ws.assert_file_contains("core/core.module.toml", "version = 2");
        ws.assert_file_contains("project.toml", "version = 1");
    }

    /// A dry run previews even when files are read-only
    #[test]
    fn s1_3_dry_run_ignores_read_only_gate() {
        let ws = TestWorkspace::new();
        ws.project(1, &["core/core.module.toml"]);
        ws.module("core/core.module.toml", 1);
        ws.set_readonly("core/core.module.toml", true);

        let service = ConversionService::new().with_provider(module_rules("m2", 2, &[]));
        let mut context = ConversionContext::new(ws.root()).unwrap();
        let options = ConversionOptions {
            backup: true,
            dry_run: true,
        };
        let report = service.run(&mut context, options, &mut SilentListener).unwrap();

        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].0, ws.path("core/core.module.toml"));
        ws.assert_file_contains("core/core.module.toml", "version = 1");
    }
}

// ============================================================================
// S2: converter ordering
// ============================================================================

mod s2_ordering {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(service: &ConversionService) -> Vec<String> {
        service
            .ordered_providers()
            .unwrap()
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    #[test]
    fn s2_1_diamond_keeps_registration_order_for_ties() {
        let service = ConversionService::new()
            .with_provider(module_rules("d", 5, &["b", "c"]))
            .with_provider(module_rules("c", 4, &["a"]))
            .with_provider(module_rules("b", 3, &["a"]))
            .with_provider(module_rules("a", 2, &[]));

        assert_eq!(ids(&service), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn s2_2_unknown_predecessor_is_ignored() {
        let service = ConversionService::new()
            .with_provider(module_rules("late", 3, &["not-registered"]))
            .with_provider(module_rules("early", 2, &[]));

        assert_eq!(ids(&service), vec!["late", "early"]);
    }

    #[test]
    fn s2_3_chain_leaves_final_version() {
        let ws = TestWorkspace::new();
        ws.project(1, &["core/core.module.toml"]);
        ws.module("core/core.module.toml", 1);

        let service = ConversionService::new()
            .with_provider(module_rules("to-3", 3, &["to-2"]))
            .with_provider(module_rules("to-2", 2, &[]));
        let mut context = ConversionContext::new(ws.root()).unwrap();
        let report = service
            .run(&mut context, ConversionOptions::default(), &mut SilentListener)
            .unwrap();

        assert_eq!(report.converters, vec!["to-2".to_string(), "to-3".to_string()]);
        ws.assert_file_contains("core/core.module.toml", "version = 3");
        ws.assert_file_contains(".conversion.toml", "to-3");
    }

    #[test]
    fn s2_4_self_reference_is_rejected() {
        let err = RulesProvider::new(ConversionRules {
            id: "loop".to_string(),
            description: String::new(),
            preceding: vec!["loop".to_string()],
            record_only: false,
            project: None,
            workspace: None,
            module: None,
            run_configurations: None,
        })
        .unwrap_err();
        assert!(matches!(err, Error::CannotConvert { .. }));
    }
}

// ============================================================================
// S3: modules added after conversion
// ============================================================================

mod s3_late_modules {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn s3_1_late_module_is_converted_and_saved() {
        let ws = TestWorkspace::new();
        ws.project(1, &["core/core.module.toml"]);
        ws.module("core/core.module.toml", 1);

        let service = ConversionService::new().with_provider(module_rules("m2", 2, &[]));
        let mut context = ConversionContext::new(ws.root()).unwrap();
        service
            .run(&mut context, ConversionOptions::default(), &mut SilentListener)
            .unwrap();

        let late = ws.module("plugins/extra.module.toml", 1);
        assert!(service.convert_module(&mut context, &late).unwrap());
        ws.assert_file_contains("plugins/extra.module.toml", "version = 2");
        ws.assert_file_contains("plugins/extra.module.toml", "# module descriptor");
    }

    #[test]
    fn s3_2_converters_without_module_rules_leave_it_alone() {
        let ws = TestWorkspace::new();
        ws.project(1, &[]);
        let provider = RulesProvider::new(ConversionRules {
            id: "project-only".to_string(),
            description: String::new(),
            preceding: Vec::new(),
            record_only: false,
            project: Some(FileRules {
                to_version: 2,
                rename_components: Default::default(),
                remove_components: Vec::new(),
            }),
            workspace: None,
            module: None,
            run_configurations: None,
        })
        .unwrap();

        let service = ConversionService::new().with_provider(provider);
        let mut context = ConversionContext::new(ws.root()).unwrap();
        let late = ws.module("late/late.module.toml", 1);
        let before = ws.snapshot("late/late.module.toml");

        assert!(!service.convert_module(&mut context, &late).unwrap());
        assert_eq!(ws.snapshot("late/late.module.toml"), before);
    }
}

// ============================================================================
// S4: failures
// ============================================================================

mod s4_failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn s4_1_rename_collision_aborts_without_saving() {
        let ws = TestWorkspace::new();
        ws.project(1, &["core/core.module.toml"]);
        ws.module("core/core.module.toml", 1);
        let rules = ws.write(
            "rules.toml",
            "id = \"clash\"\n\n[project]\nto_version = 2\n\n[module]\nto_version = 2\nrename_components = { ModuleRootManager = \"Module\" }\n",
        );
        let project_before = ws.snapshot("project.toml");
        let module_before = ws.snapshot("core/core.module.toml");

        let service = ConversionService::new().with_provider(RulesProvider::from_file(&rules).unwrap());
        let mut context = ConversionContext::new(ws.root()).unwrap();
        let err = service
            .run(&mut context, ConversionOptions::default(), &mut SilentListener)
            .unwrap_err();

        match err {
            Error::CannotConvertFile { path, message } => {
                assert_eq!(path, ws.path("core/core.module.toml").to_native());
                assert!(message.contains("'Module' already exists"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ws.snapshot("project.toml"), project_before);
        assert_eq!(ws.snapshot("core/core.module.toml"), module_before);
        ws.assert_file_not_exists(".conversion.toml");
    }

    #[test]
    fn s4_2_malformed_module_file_is_reported() {
        let ws = TestWorkspace::new();
        ws.project(1, &["core/core.module.toml"]);
        ws.write("core/core.module.toml", "version = 1\n[component.Module\n");

        let service = ConversionService::new().with_provider(module_rules("m2", 2, &[]));
        let mut context = ConversionContext::new(ws.root()).unwrap();
        let err = service.prepare(&mut context).unwrap_err();
        assert!(matches!(err, Error::CannotConvertFile { .. }), "got {err:?}");
    }
}
