use std::future::Future;
use std::sync::Arc;

use super::{
    compare, constant_macro, fixture_id, init_backend, list_all, run_table, MacroFields,
    Operation, TestResult, ID_A, ID_B,
};
use crate::{Macro, MacroArguments, MacroError, MacroService, NewMacro, StaticIdGenerator};

struct Scenario {
    fields: MacroFields,
    args: NewMacro,
    wants: Wants,
}

struct Wants {
    err: Option<MacroError>,
    macros: Vec<Macro>,
}

fn scenarios() -> Result<Vec<(&'static str, Scenario)>, String> {
    let id_a = fixture_id(ID_A)?;
    let id_b = fixture_id(ID_B)?;

    let mut with_map = constant_macro(id_a, "region");
    with_map.arguments = MacroArguments::Map(
        [("east", "us-east-1"), ("west", "us-west-2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );

    Ok(vec![
        (
            "creating a macro assigns the macro an id and adds it to the store",
            Scenario {
                fields: MacroFields {
                    id_generator: Arc::new(StaticIdGenerator::new(id_a)),
                    macros: vec![constant_macro(id_b, "existing-macro")],
                },
                args: NewMacro::new("my-macro", MacroArguments::Constant(Vec::new())),
                wants: Wants {
                    err: None,
                    macros: vec![
                        constant_macro(id_b, "existing-macro"),
                        constant_macro(id_a, "my-macro"),
                    ],
                },
            },
        ),
        (
            "creating a macro keeps its argument payload",
            Scenario {
                fields: MacroFields {
                    id_generator: Arc::new(StaticIdGenerator::new(id_a)),
                    macros: vec![],
                },
                args: NewMacro::new("region", with_map.arguments.clone()),
                wants: Wants {
                    err: None,
                    macros: vec![with_map],
                },
            },
        ),
        (
            "creating a macro with a blank name fails",
            Scenario {
                fields: MacroFields {
                    id_generator: Arc::new(StaticIdGenerator::new(id_a)),
                    macros: vec![constant_macro(id_b, "existing-macro")],
                },
                args: NewMacro::new("  ", MacroArguments::Constant(Vec::new())),
                wants: Wants {
                    err: Some(MacroError::Invalid {
                        reason: "name is required".to_string(),
                    }),
                    macros: vec![constant_macro(id_b, "existing-macro")],
                },
            },
        ),
        (
            "creating a macro whose generated id is taken fails",
            Scenario {
                fields: MacroFields {
                    id_generator: Arc::new(StaticIdGenerator::new(id_b)),
                    macros: vec![constant_macro(id_b, "existing-macro")],
                },
                args: NewMacro::new("my-macro", MacroArguments::Constant(Vec::new())),
                wants: Wants {
                    err: Some(MacroError::Conflict { id: id_b }),
                    macros: vec![constant_macro(id_b, "existing-macro")],
                },
            },
        ),
    ])
}

pub(super) async fn run_create_tests<S, F, Fut>(init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    run_table(Operation::Create, scenarios(), |sc| create_macro(init, sc)).await
}

async fn create_macro<S, F, Fut>(init: &F, sc: Scenario) -> Result<(), String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let s = init_backend(init, sc.fields).await?;

    let result = s.create_macro(sc.args).await;
    compare::diff_errors(result.as_ref().err(), sc.wants.err.as_ref())?;

    let macros = list_all(&s).await?;
    if let Ok(created) = &result {
        if !macros.contains(created) {
            return Err(format!(
                "created macro {} was not returned by find_macros",
                created.id
            ));
        }
    }
    compare::diff_macro_sets(macros, sc.wants.macros)
}
