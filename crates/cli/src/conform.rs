//! `macrostore conform`: run the conformance suite against a backend kind.

use std::sync::atomic::{AtomicUsize, Ordering};

use macrostore_backend::{BackendKind, FileMacroService, InMemoryMacroService};
use macrostore_storage::conformance::{self, ConformanceReport, MacroFields};
use macrostore_storage::MacroError;
use serde_json::json;

use crate::{die, OutputFormat};

/// Returns `true` when every scenario passed.
pub(crate) async fn cmd_conform(kind: BackendKind, output: OutputFormat, quiet: bool) -> bool {
    tracing::info!(?kind, "running macro service conformance suite");
    let report = match kind {
        BackendKind::Memory => run_memory().await,
        BackendKind::File => run_file().await,
    };

    match output {
        OutputFormat::Json => {
            let results: Vec<_> = report
                .results
                .iter()
                .map(|r| {
                    json!({
                        "operation": r.operation.as_str(),
                        "name": r.name,
                        "passed": r.passed,
                        "message": r.message,
                    })
                })
                .collect();
            let doc = json!({
                "backend": backend_name(kind),
                "passed": report.passed,
                "failed": report.failed,
                "total": report.total,
                "results": results,
            });
            match serde_json::to_string_pretty(&doc) {
                Ok(text) => println!("{}", text),
                Err(e) => die(format!("failed to serialize report: {}", e)),
            }
        }
        OutputFormat::Text => {
            if !quiet {
                for r in &report.results {
                    let mark = if r.passed { "ok  " } else { "FAIL" };
                    println!("{} [{}] {}", mark, r.operation, r.name);
                }
                println!();
            }
            print!("{}", report);
        }
    }

    report.is_success()
}

fn backend_name(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Memory => "memory",
        BackendKind::File => "file",
    }
}

async fn run_memory() -> ConformanceReport {
    conformance::run_conformance_suite(|fields: MacroFields| async move {
        InMemoryMacroService::from_fields(fields)
    })
    .await
}

/// Every scenario gets its own document inside one scratch directory.
async fn run_file() -> ConformanceReport {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => die(format!("failed to create scratch directory: {}", e)),
    };
    let next = AtomicUsize::new(0);

    conformance::run_conformance_suite(|fields: MacroFields| {
        let path = dir
            .path()
            .join(format!("scenario-{}.json", next.fetch_add(1, Ordering::Relaxed)));
        async move {
            let service = FileMacroService::new(path, fields.id_generator);
            conformance::seed(&service, fields.macros).await?;
            Ok::<_, MacroError>(service)
        }
    })
    .await
}
