use std::future::Future;

use super::{
    compare, constant_macro, fixture_id, init_backend, list_all, run_table, MacroFields,
    Operation, TestResult, ID_A, ID_B,
};
use crate::{Macro, MacroArguments, MacroError, MacroService};

struct Scenario {
    fields: MacroFields,
    replacement: Macro,
    wants: Wants,
}

struct Wants {
    err: Option<MacroError>,
    macros: Vec<Macro>,
}

fn scenarios() -> Result<Vec<(&'static str, Scenario)>, String> {
    let id_a = fixture_id(ID_A)?;
    let id_b = fixture_id(ID_B)?;

    let renamed = Macro {
        id: id_a,
        name: "renamed-macro".to_string(),
        arguments: MacroArguments::Constant(vec!["one".into(), "two".into()]),
    };

    Ok(vec![
        (
            "replacing a macro that doesn't exist inserts it",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro")]),
                replacement: constant_macro(id_b, "new-macro"),
                wants: Wants {
                    err: None,
                    macros: vec![
                        constant_macro(id_a, "existing-macro"),
                        constant_macro(id_b, "new-macro"),
                    ],
                },
            },
        ),
        (
            "replacing an existing macro overwrites it",
            Scenario {
                fields: MacroFields::with_macros(vec![
                    constant_macro(id_a, "existing-macro"),
                    constant_macro(id_b, "other-macro"),
                ]),
                replacement: renamed.clone(),
                wants: Wants {
                    err: None,
                    macros: vec![renamed, constant_macro(id_b, "other-macro")],
                },
            },
        ),
        (
            "replacing a macro with a blank name fails",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro")]),
                replacement: constant_macro(id_a, ""),
                wants: Wants {
                    err: Some(MacroError::Invalid {
                        reason: "name is required".to_string(),
                    }),
                    macros: vec![constant_macro(id_a, "existing-macro")],
                },
            },
        ),
    ])
}

pub(super) async fn run_replace_tests<S, F, Fut>(init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    run_table(Operation::Replace, scenarios(), |sc| replace_macro(init, sc)).await
}

async fn replace_macro<S, F, Fut>(init: &F, sc: Scenario) -> Result<(), String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let s = init_backend(init, sc.fields).await?;

    let result = s.replace_macro(sc.replacement).await;
    compare::diff_errors(result.as_ref().err(), sc.wants.err.as_ref())?;

    let macros = list_all(&s).await?;
    compare::diff_macro_sets(macros, sc.wants.macros)
}
