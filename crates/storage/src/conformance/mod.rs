//! Conformance test suite for `MacroService` implementations.
//!
//! This module provides a backend-agnostic scenario table per operation that
//! any `MacroService` implementation can run to verify correctness. The
//! suite covers:
//!
//! - **Create**: id assignment from the generator, visibility in list-all
//! - **Find by id**: lookup, not-found error text and empty result
//! - **List**: every fixture macro is returned
//! - **Update**: partial updates persist, missing ids leave the store alone
//! - **Replace**: upsert by id
//! - **Delete**: removal, missing ids leave the store alone
//!
//! Each scenario builds a fresh backend from its [`MacroFields`] fixture,
//! runs one operation, compares the returned error by message text, then
//! re-lists the store and compares it with the expected post-state.
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with an init function that
//! builds a backend seeded with the fixture:
//!
//! ```ignore
//! use macrostore_storage::conformance::{run_conformance_suite, MacroFields};
//!
//! #[tokio::test]
//! async fn memory_conformance() {
//!     let report = run_conformance_suite(|fields: MacroFields| async move {
//!         InMemoryMacroService::from_fields(fields)
//!     })
//!     .await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```
//!
//! or use [`macro_service_conformance_tests!`](crate::macro_service_conformance_tests)
//! to get one test per operation.

mod compare;
mod create;
mod delete;
mod find;
mod list;
mod replace;
mod update;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub use compare::{diff_errors, diff_macro, diff_macro_sets};

use crate::{Id, IdGenerator, Macro, MacroArguments, MacroError, MacroService, RandomIdGenerator};

/// Fixed ids used by the scenario tables.
pub const ID_A: &str = "020f755c3c082000";
pub const ID_B: &str = "020f755c3c082001";
pub const ID_C: &str = "020f755c3c082002";

/// The state a scenario's backend is initialized with.
#[derive(Clone)]
pub struct MacroFields {
    /// Macros that exist before the operation runs.
    pub macros: Vec<Macro>,
    /// Generator the backend must use for `create_macro`.
    pub id_generator: Arc<dyn IdGenerator>,
}

impl Default for MacroFields {
    fn default() -> Self {
        Self {
            macros: Vec::new(),
            id_generator: Arc::new(RandomIdGenerator),
        }
    }
}

impl fmt::Debug for MacroFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroFields")
            .field("macros", &self.macros)
            .finish_non_exhaustive()
    }
}

impl MacroFields {
    pub fn with_macros(macros: Vec<Macro>) -> Self {
        Self {
            macros,
            ..Self::default()
        }
    }
}

/// Seed a backend with fixture macros through `replace_macro`.
///
/// Backends without a cheaper bulk path can use this in their init function.
pub async fn seed<S: MacroService>(service: &S, macros: Vec<Macro>) -> Result<(), MacroError> {
    for m in macros {
        service.replace_macro(m).await?;
    }
    Ok(())
}

/// The operation a scenario table exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    FindById,
    List,
    Update,
    Replace,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::FindById,
        Operation::List,
        Operation::Update,
        Operation::Replace,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::FindById => "find_by_id",
            Operation::List => "list",
            Operation::Update => "update",
            Operation::Replace => "replace",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single conformance scenario.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Operation under test.
    pub operation: Operation,
    /// Scenario name (e.g. "deleting a macro that doesn't exist").
    pub name: String,
    /// Whether the scenario passed.
    pub passed: bool,
    /// Error message if the scenario failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(operation: Operation, name: &str) -> Self {
        Self {
            operation,
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(operation: Operation, name: &str, msg: String) -> Self {
        Self {
            operation,
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(operation: Operation, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(operation, name),
            Err(msg) => {
                tracing::warn!(%operation, scenario = name, "conformance scenario failed");
                Self::fail(operation, name, msg)
            }
        }
    }
}

/// Aggregated report from a conformance run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ConformanceReport {
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let total = results.len();
        Self {
            results,
            passed,
            failed: total - passed,
            total,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.operation,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run every scenario table against a backend.
///
/// `init` is called once per scenario with that scenario's fixture and must
/// return a fresh backend seeded with `fields.macros` that draws new ids from
/// `fields.id_generator`. The backend is dropped when the scenario ends.
pub async fn run_conformance_suite<S, F, Fut>(init: F) -> ConformanceReport
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let mut results = Vec::new();
    for operation in Operation::ALL {
        results.extend(run_operation(operation, &init).await);
    }
    let report = ConformanceReport::from_results(results);
    tracing::info!(
        passed = report.passed,
        failed = report.failed,
        "macro service conformance finished"
    );
    report
}

/// Run the scenario table for a single operation.
pub async fn run_operation_suite<S, F, Fut>(operation: Operation, init: &F) -> ConformanceReport
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    ConformanceReport::from_results(run_operation(operation, init).await)
}

async fn run_operation<S, F, Fut>(operation: Operation, init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    match operation {
        Operation::Create => create::run_create_tests(init).await,
        Operation::FindById => find::run_find_tests(init).await,
        Operation::List => list::run_list_tests(init).await,
        Operation::Update => update::run_update_tests(init).await,
        Operation::Replace => replace::run_replace_tests(init).await,
        Operation::Delete => delete::run_delete_tests(init).await,
    }
}

// ── Helpers shared by the scenario tables ────────────────────────────────────

fn fixture_id(s: &str) -> Result<Id, String> {
    s.parse()
        .map_err(|e| format!("invalid fixture id {:?}: {}", s, e))
}

/// A macro with empty constant arguments, the shape every fixture uses.
fn constant_macro(id: Id, name: &str) -> Macro {
    Macro {
        id,
        name: name.to_string(),
        arguments: MacroArguments::Constant(Vec::new()),
    }
}

async fn init_backend<S, F, Fut>(init: &F, fields: MacroFields) -> Result<S, String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    init(fields)
        .await
        .map_err(|e| format!("failed to initialize backend: {}", e))
}

async fn list_all<S: MacroService>(service: &S) -> Result<Vec<Macro>, String> {
    service
        .find_macros()
        .await
        .map_err(|e| format!("failed to retrieve macros: {}", e))
}

/// Turn a table (or the failure to build one) into results.
async fn run_table<T, Fut>(
    operation: Operation,
    table: Result<Vec<(&'static str, T)>, String>,
    mut run: impl FnMut(T) -> Fut,
) -> Vec<TestResult>
where
    Fut: Future<Output = Result<(), String>>,
{
    let table = match table {
        Ok(table) => table,
        Err(msg) => return vec![TestResult::fail(operation, "build scenario table", msg)],
    };

    let mut results = Vec::with_capacity(table.len());
    for (name, scenario) in table {
        tracing::debug!(%operation, scenario = name, "running conformance scenario");
        results.push(TestResult::from_result(operation, name, run(scenario).await));
    }
    results
}
