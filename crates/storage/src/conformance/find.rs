use std::future::Future;

use super::{
    compare, constant_macro, fixture_id, init_backend, run_table, MacroFields, Operation,
    TestResult, ID_A, ID_B,
};
use crate::{Id, Macro, MacroError, MacroService};

struct Scenario {
    fields: MacroFields,
    id: Id,
    wants: Wants,
}

struct Wants {
    err: Option<MacroError>,
    found: Option<Macro>,
}

fn scenarios() -> Result<Vec<(&'static str, Scenario)>, String> {
    let id_a = fixture_id(ID_A)?;
    let id_b = fixture_id(ID_B)?;

    Ok(vec![
        (
            "finding a macro that exists by id",
            Scenario {
                fields: MacroFields::with_macros(vec![
                    constant_macro(id_a, "existing-macro-a"),
                    constant_macro(id_b, "existing-macro-b"),
                ]),
                id: id_b,
                wants: Wants {
                    err: None,
                    found: Some(constant_macro(id_b, "existing-macro-b")),
                },
            },
        ),
        (
            "finding a non-existent macro",
            Scenario {
                fields: MacroFields::with_macros(vec![]),
                id: id_a,
                wants: Wants {
                    err: Some(MacroError::NotFound { id: id_a }),
                    found: None,
                },
            },
        ),
        (
            "finding a non-existent macro among others",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro-a")]),
                id: id_b,
                wants: Wants {
                    err: Some(MacroError::NotFound { id: id_b }),
                    found: None,
                },
            },
        ),
    ])
}

pub(super) async fn run_find_tests<S, F, Fut>(init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    run_table(Operation::FindById, scenarios(), |sc| find_macro_by_id(init, sc)).await
}

async fn find_macro_by_id<S, F, Fut>(init: &F, sc: Scenario) -> Result<(), String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let s = init_backend(init, sc.fields).await?;

    let result = s.find_macro_by_id(sc.id).await;
    compare::diff_errors(result.as_ref().err(), sc.wants.err.as_ref())?;
    compare::diff_macro(result.as_ref().ok(), sc.wants.found.as_ref())
}
