use std::future::Future;

use super::{
    compare, constant_macro, fixture_id, init_backend, list_all, run_table, MacroFields,
    Operation, TestResult, ID_A, ID_B, ID_C,
};
use crate::{Id, Macro, MacroError, MacroService};

struct Scenario {
    fields: MacroFields,
    id: Id,
    wants: Wants,
}

struct Wants {
    err: Option<MacroError>,
    macros: Vec<Macro>,
}

fn scenarios() -> Result<Vec<(&'static str, Scenario)>, String> {
    let id_a = fixture_id(ID_A)?;
    let id_b = fixture_id(ID_B)?;
    let id_c = fixture_id(ID_C)?;

    Ok(vec![
        (
            "deleting a macro",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro")]),
                id: id_a,
                wants: Wants {
                    err: None,
                    macros: vec![],
                },
            },
        ),
        (
            "deleting a macro that doesn't exist",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro")]),
                id: id_b,
                wants: Wants {
                    err: Some(MacroError::NotFound { id: id_b }),
                    macros: vec![constant_macro(id_a, "existing-macro")],
                },
            },
        ),
        (
            "deleting a macro leaves the others in place",
            Scenario {
                fields: MacroFields::with_macros(vec![
                    constant_macro(id_a, "existing-macro-a"),
                    constant_macro(id_b, "existing-macro-b"),
                    constant_macro(id_c, "existing-macro-c"),
                ]),
                id: id_b,
                wants: Wants {
                    err: None,
                    macros: vec![
                        constant_macro(id_a, "existing-macro-a"),
                        constant_macro(id_c, "existing-macro-c"),
                    ],
                },
            },
        ),
    ])
}

pub(super) async fn run_delete_tests<S, F, Fut>(init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    run_table(Operation::Delete, scenarios(), |sc| delete_macro(init, sc)).await
}

async fn delete_macro<S, F, Fut>(init: &F, sc: Scenario) -> Result<(), String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let s = init_backend(init, sc.fields).await?;

    let result = s.delete_macro(sc.id).await;
    compare::diff_errors(result.as_ref().err(), sc.wants.err.as_ref())?;

    // A deleted id must no longer resolve.
    if result.is_ok() {
        match s.find_macro_by_id(sc.id).await {
            Err(MacroError::NotFound { id }) if id == sc.id => {}
            other => {
                return Err(format!(
                    "expected NotFound for deleted macro {}, got {:?}",
                    sc.id, other
                ))
            }
        }
    }

    let macros = list_all(&s).await?;
    compare::diff_macro_sets(macros, sc.wants.macros)
}
