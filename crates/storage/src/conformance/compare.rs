//! Comparison helpers shared by every scenario table.

use difference::{Changeset, Difference};
use serde::Serialize;

use crate::{Macro, MacroError};

/// Compare an observed error against the expected one by message text.
///
/// Both absent, or both present with identical text, is a match.
pub fn diff_errors(actual: Option<&MacroError>, expected: Option<&MacroError>) -> Result<(), String> {
    match (actual, expected) {
        (None, None) => Ok(()),
        (Some(actual), None) => Err(format!("unexpected error {:?}", actual.to_string())),
        (None, Some(expected)) => Err(format!(
            "expected error {:?} but received nil",
            expected.to_string()
        )),
        (Some(actual), Some(expected)) => {
            let (actual, expected) = (actual.to_string(), expected.to_string());
            if actual == expected {
                Ok(())
            } else {
                Err(format!(
                    "expected error {:?} but received error {:?}",
                    expected, actual
                ))
            }
        }
    }
}

/// Order-insensitive comparison of two macro collections.
///
/// Both sides are sorted by id, descending, before comparing.
pub fn diff_macro_sets(mut got: Vec<Macro>, mut want: Vec<Macro>) -> Result<(), String> {
    sort_by_id_desc(&mut got);
    sort_by_id_desc(&mut want);
    if got == want {
        return Ok(());
    }
    Err(format!(
        "found unexpected macros -got/+want\ndiff {}",
        render_diff(&got, &want)
    ))
}

/// Exact comparison of a single (optional) macro.
pub fn diff_macro(got: Option<&Macro>, want: Option<&Macro>) -> Result<(), String> {
    if got == want {
        return Ok(());
    }
    Err(format!(
        "found unexpected macro -got/+want\ndiff {}",
        render_diff(&got, &want)
    ))
}

pub(crate) fn sort_by_id_desc(macros: &mut [Macro]) {
    macros.sort_by(|a, b| b.id.cmp(&a.id));
}

/// Line diff of the pretty-printed JSON of both values.
fn render_diff<T: Serialize>(got: &T, want: &T) -> String {
    let got = to_pretty(got);
    let want = to_pretty(want);
    let changeset = Changeset::new(&got, &want, "\n");

    let mut out = String::new();
    for diff in &changeset.diffs {
        let (marker, chunk) = match diff {
            Difference::Same(x) => (' ', x),
            Difference::Rem(x) => ('-', x),
            Difference::Add(x) => ('+', x),
        };
        for line in chunk.split('\n') {
            out.push(marker);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
