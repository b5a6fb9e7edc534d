use std::future::Future;

use super::{
    compare, constant_macro, fixture_id, init_backend, list_all, run_table, MacroFields,
    Operation, TestResult, ID_A, ID_B, ID_C,
};
use crate::{Macro, MacroArguments, MacroError, MacroService};

struct Scenario {
    fields: MacroFields,
    wants: Vec<Macro>,
}

fn scenarios() -> Result<Vec<(&'static str, Scenario)>, String> {
    let id_a = fixture_id(ID_A)?;
    let id_b = fixture_id(ID_B)?;
    let id_c = fixture_id(ID_C)?;

    let all = vec![
        constant_macro(id_a, "existing-macro-a"),
        constant_macro(id_b, "existing-macro-b"),
        constant_macro(id_c, "existing-macro-c"),
    ];

    let mixed = vec![
        Macro {
            id: id_a,
            name: "hosts".to_string(),
            arguments: MacroArguments::Constant(vec!["alpha".into(), "beta".into()]),
        },
        Macro {
            id: id_b,
            name: "regions".to_string(),
            arguments: MacroArguments::Map(
                [("east".to_string(), "us-east-1".to_string())].into_iter().collect(),
            ),
        },
        Macro {
            id: id_c,
            name: "buckets".to_string(),
            arguments: MacroArguments::Query {
                query: "buckets()".to_string(),
                language: "flux".to_string(),
            },
        },
    ];

    Ok(vec![
        (
            "listing an empty store",
            Scenario {
                fields: MacroFields::with_macros(vec![]),
                wants: vec![],
            },
        ),
        (
            "listing returns every stored macro",
            Scenario {
                fields: MacroFields::with_macros(all.clone()),
                wants: all,
            },
        ),
        (
            "listing preserves every argument kind",
            Scenario {
                fields: MacroFields::with_macros(mixed.clone()),
                wants: mixed,
            },
        ),
    ])
}

pub(super) async fn run_list_tests<S, F, Fut>(init: &F) -> Vec<TestResult>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    run_table(Operation::List, scenarios(), |sc| find_macros(init, sc)).await
}

async fn find_macros<S, F, Fut>(init: &F, sc: Scenario) -> Result<(), String>
where
    S: MacroService,
    F: Fn(MacroFields) -> Fut,
    Fut: Future<Output = Result<S, MacroError>>,
{
    let s = init_backend(init, sc.fields).await?;
    let macros = list_all(&s).await?;
    compare::diff_macro_sets(macros, sc.wants)
}
