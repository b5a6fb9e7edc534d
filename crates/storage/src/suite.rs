//! The `macro_service_conformance_tests!` macro.
//!
//! This macro generates one `#[tokio::test]` function per `MacroService`
//! operation for any backend that can be built from a `MacroFields` fixture.
//!
//! # Usage
//!
//! ```rust,ignore
//! use macrostore_storage::conformance::MacroFields;
//! use macrostore_storage::macro_service_conformance_tests;
//!
//! mod memory {
//!     use super::*;
//!
//!     macro_service_conformance_tests!(|fields: MacroFields| async move {
//!         Ok(MyBackend::from_fields(fields))
//!     });
//! }
//! ```
//!
//! Each generated test function is named `conformance_<operation>` and can
//! be run with `cargo test conformance_`. The calling crate needs `tokio`
//! (with the `macros` and `rt` features) as a dev-dependency.

/// Generate conformance tests for a `MacroService` implementation.
///
/// `$init` must be an expression usable as
/// `Fn(MacroFields) -> impl Future<Output = Result<S, MacroError>>`. It is
/// evaluated fresh in every generated test, and called once per scenario so
/// every scenario gets an independent backend instance.
#[macro_export]
macro_rules! macro_service_conformance_tests {
    ($init:expr) => {
        #[tokio::test]
        async fn conformance_create() {
            let init = $init;
            let report = $crate::conformance::run_operation_suite(
                $crate::conformance::Operation::Create,
                &init,
            )
            .await;
            assert!(report.failed == 0, "{report}");
        }

        #[tokio::test]
        async fn conformance_find_by_id() {
            let init = $init;
            let report = $crate::conformance::run_operation_suite(
                $crate::conformance::Operation::FindById,
                &init,
            )
            .await;
            assert!(report.failed == 0, "{report}");
        }

        #[tokio::test]
        async fn conformance_list() {
            let init = $init;
            let report = $crate::conformance::run_operation_suite(
                $crate::conformance::Operation::List,
                &init,
            )
            .await;
            assert!(report.failed == 0, "{report}");
        }

        #[tokio::test]
        async fn conformance_update() {
            let init = $init;
            let report = $crate::conformance::run_operation_suite(
                $crate::conformance::Operation::Update,
                &init,
            )
            .await;
            assert!(report.failed == 0, "{report}");
        }

        #[tokio::test]
        async fn conformance_replace() {
            let init = $init;
            let report = $crate::conformance::run_operation_suite(
                $crate::conformance::Operation::Replace,
                &init,
            )
            .await;
            assert!(report.failed == 0, "{report}");
        }

        #[tokio::test]
        async fn conformance_delete() {
            let init = $init;
            let report = $crate::conformance::run_operation_suite(
                $crate::conformance::Operation::Delete,
                &init,
            )
            .await;
            assert!(report.failed == 0, "{report}");
        }
    };
}
