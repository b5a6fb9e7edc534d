use std::future::Future;

use super::{
    compare, constant_macro, fixture_id, init_backend, list_all, run_table, MacroFields,
    Operation, TestResult, ID_A, ID_B,
};
use crate::{Id, Macro, MacroArguments, MacroError, MacroService, MacroUpdate};

struct Scenario {
    fields: MacroFields,
    id: Id,
    update: MacroUpdate,
    wants: Wants,
}

struct Wants {
    err: Option<MacroError>,
    macros: Vec<Macro>,
}

fn scenarios() -> Result<Vec<(&'static str, Scenario)>, String> {
    let id_a = fixture_id(ID_A)?;
    let id_b = fixture_id(ID_B)?;

    let query = MacroArguments::Query {
        query: "buckets()".to_string(),
        language: "flux".to_string(),
    };
    let mut a_with_query = constant_macro(id_a, "existing-macro-a");
    a_with_query.arguments = query.clone();

    Ok(vec![
        (
            "updating a macro's name",
            Scenario {
                fields: MacroFields::with_macros(vec![
                    constant_macro(id_a, "existing-macro-a"),
                    constant_macro(id_b, "existing-macro-b"),
                ]),
                id: id_b,
                update: MacroUpdate {
                    name: Some("new-macro-b-name".to_string()),
                    arguments: None,
                },
                wants: Wants {
                    err: None,
                    macros: vec![
                        constant_macro(id_a, "existing-macro-a"),
                        constant_macro(id_b, "new-macro-b-name"),
                    ],
                },
            },
        ),
        (
            "updating a non-existent macro fails",
            Scenario {
                fields: MacroFields::with_macros(vec![]),
                id: id_a,
                update: MacroUpdate::default(),
                wants: Wants {
                    err: Some(MacroError::NotFound { id: id_a }),
                    macros: vec![],
                },
            },
        ),
        (
            "updating a macro's arguments keeps its name",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro-a")]),
                id: id_a,
                update: MacroUpdate {
                    name: None,
                    arguments: Some(query),
                },
                wants: Wants {
                    err: None,
                    macros: vec![a_with_query],
                },
            },
        ),
        (
            "updating a macro to a blank name fails",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro-a")]),
                id: id_a,
                update: MacroUpdate {
                    name: Some(String::new()),
                    arguments: None,
                },
                wants: Wants {
                    err: Some(MacroError::Invalid {
                        reason: "name is required".to_string(),
                    }),
                    macros: vec![constant_macro(id_a, "existing-macro-a")],
                },
            },
        ),
        (
            "updating a non-existent macro reports not found before validating",
            Scenario {
                fields: MacroFields::with_macros(vec![constant_macro(id_a, "existing-macro-a")]),
                id: id_b,
                update: MacroUpdate {
                    name: Some(String::new()),
                    arguments: None,
                },
                wants: Wants {
                    err: Some(MacroError::NotFound { id: id_b }),
                    macros: vec![constant_macro(id_a, "existing-macro-a")],
                },
            },
        ),
    ])
}

pub(super) async fn run_update_tests<S, F, Fut>(init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    run_table(Operation::Update, scenarios(), |sc| update_macro(init, sc)).await
}

async fn update_macro<S, F, Fut>(init: &F, sc: Scenario) -> Result<(), String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let s = init_backend(init, sc.fields).await?;

    let result = s.update_macro(sc.id, &sc.update).await;
    compare::diff_errors(result.as_ref().err(), sc.wants.err.as_ref())?;

    if let (Ok(updated), Some(name)) = (&result, &sc.update.name) {
        if updated.name != *name {
            return Err(format!(
                "macro name not updated: expected {:?}, got {:?}",
                name, updated.name
            ));
        }
    }

    let macros = list_all(&s).await?;
    compare::diff_macro_sets(macros, sc.wants.macros)
}
