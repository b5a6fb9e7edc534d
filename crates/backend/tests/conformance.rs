//! Runs the `MacroService` conformance suite against every shipped backend.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use macrostore_backend::{FileMacroService, InMemoryMacroService};
use macrostore_storage::conformance::{self, MacroFields};
use macrostore_storage::{macro_service_conformance_tests, MacroError};

mod memory {
    use super::*;

    macro_service_conformance_tests!(|fields: MacroFields| async move {
        InMemoryMacroService::from_fields(fields)
    });
}

mod file {
    use super::*;

    async fn open_seeded(
        path: PathBuf,
        fields: MacroFields,
    ) -> Result<FileMacroService, MacroError> {
        let service = FileMacroService::new(path, fields.id_generator);
        conformance::seed(&service, fields.macros).await?;
        Ok(service)
    }

    // Each generated test owns one temp dir, removed when the test ends;
    // every scenario gets its own document inside it.
    macro_service_conformance_tests!({
        let dir = tempfile::tempdir().expect("create temp dir");
        let next = AtomicUsize::new(0);
        move |fields: MacroFields| {
            let path = dir
                .path()
                .join(format!("scenario-{}.json", next.fetch_add(1, Ordering::Relaxed)));
            open_seeded(path, fields)
        }
    });

    #[tokio::test]
    async fn scenario_documents_go_away_with_the_init_closure() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let next = AtomicUsize::new(0);
        let init = move |fields: MacroFields| {
            let path = dir
                .path()
                .join(format!("scenario-{}.json", next.fetch_add(1, Ordering::Relaxed)));
            open_seeded(path, fields)
        };

        let report =
            conformance::run_operation_suite(conformance::Operation::Delete, &init).await;
        assert!(report.is_success(), "{report}");
        assert!(root.join("scenario-0.json").exists());

        drop(init);
        assert!(!root.exists());
    }
}

#[tokio::test]
async fn full_suite_passes_for_memory_backend() {
    let report = conformance::run_conformance_suite(|fields: MacroFields| async move {
        InMemoryMacroService::from_fields(fields)
    })
    .await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.total, 21);
}

#[tokio::test]
async fn full_suite_passes_for_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let next = AtomicUsize::new(0);
    let report = conformance::run_conformance_suite(|fields: MacroFields| {
        let path = dir
            .path()
            .join(format!("{}.json", next.fetch_add(1, Ordering::Relaxed)));
        async move {
            let service = FileMacroService::new(path, fields.id_generator);
            conformance::seed(&service, fields.macros).await?;
            Ok::<_, MacroError>(service)
        }
    })
    .await;
    assert!(report.is_success(), "{report}");
}
