//! Command-line flags describing a macro's argument payload.

use std::collections::BTreeMap;

use clap::Args;
use macrostore_storage::MacroArguments;

const DEFAULT_QUERY_LANGUAGE: &str = "flux";

/// At most one of `--constant`, `--map`, `--query` may be given.
#[derive(Debug, Default, Args)]
pub(crate) struct ArgumentFlags {
    /// Constant values, comma separated
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["map", "query"])]
    constant: Option<Vec<String>>,

    /// Map entries as key=value, comma separated
    #[arg(long, value_delimiter = ',', conflicts_with = "query")]
    map: Option<Vec<String>>,

    /// Query producing the values
    #[arg(long)]
    query: Option<String>,

    /// Language of --query
    #[arg(long, requires = "query")]
    language: Option<String>,
}

impl ArgumentFlags {
    /// `Ok(None)` when no argument flag was given.
    pub(crate) fn into_arguments(self) -> Result<Option<MacroArguments>, String> {
        if let Some(values) = self.constant {
            let values = values.into_iter().filter(|v| !v.is_empty()).collect();
            return Ok(Some(MacroArguments::Constant(values)));
        }
        if let Some(entries) = self.map {
            let mut map = BTreeMap::new();
            for entry in entries.iter().filter(|e| !e.is_empty()) {
                let (key, value) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("invalid map entry {:?}: expected key=value", entry))?;
                map.insert(key.to_string(), value.to_string());
            }
            return Ok(Some(MacroArguments::Map(map)));
        }
        if let Some(query) = self.query {
            return Ok(Some(MacroArguments::Query {
                query,
                language: self
                    .language
                    .unwrap_or_else(|| DEFAULT_QUERY_LANGUAGE.to_string()),
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        flags: ArgumentFlags,
    }

    fn parse(args: &[&str]) -> Result<Option<MacroArguments>, String> {
        let mut argv = vec!["harness"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv)
            .map_err(|e| e.to_string())?
            .flags
            .into_arguments()
    }

    #[test]
    fn no_flags_means_no_arguments() {
        assert_eq!(parse(&[]).unwrap(), None);
    }

    #[test]
    fn constant_values_split_on_commas() {
        assert_eq!(
            parse(&["--constant", "a,b,c"]).unwrap(),
            Some(MacroArguments::Constant(vec![
                "a".into(),
                "b".into(),
                "c".into()
            ]))
        );
    }

    #[test]
    fn map_entries_parse_key_value() {
        assert_eq!(
            parse(&["--map", "east=us-east-1,west=us-west-2"]).unwrap(),
            Some(MacroArguments::Map(BTreeMap::from([
                ("east".to_string(), "us-east-1".to_string()),
                ("west".to_string(), "us-west-2".to_string()),
            ])))
        );
    }

    #[test]
    fn malformed_map_entry_is_rejected() {
        let err = parse(&["--map", "novalue"]).unwrap_err();
        assert!(err.contains("expected key=value"), "{err}");
    }

    #[test]
    fn query_defaults_to_flux() {
        assert_eq!(
            parse(&["--query", "buckets()"]).unwrap(),
            Some(MacroArguments::Query {
                query: "buckets()".to_string(),
                language: "flux".to_string(),
            })
        );
    }

    #[test]
    fn kinds_are_mutually_exclusive() {
        assert!(parse(&["--constant", "a", "--map", "k=v"]).is_err());
        assert!(parse(&["--map", "k=v", "--query", "q"]).is_err());
    }

    #[test]
    fn language_requires_query() {
        assert!(parse(&["--language", "sql"]).is_err());
    }
}
