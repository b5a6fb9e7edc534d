use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MacroError;
use crate::id::Id;

/// A named, identified configuration object with typed argument data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    pub id: Id,
    pub name: String,
    pub arguments: MacroArguments,
}

impl Macro {
    pub fn validate(&self) -> Result<(), MacroError> {
        validate_name(&self.name)
    }
}

/// The typed argument payload of a macro.
///
/// Serialized as `{"type": "<kind>", "values": <payload>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum MacroArguments {
    /// A fixed list of values.
    Constant(Vec<String>),
    /// Key/value pairs; the key is shown, the value substituted.
    Map(BTreeMap<String, String>),
    /// Values produced by running a query.
    Query { query: String, language: String },
}

impl Default for MacroArguments {
    fn default() -> Self {
        MacroArguments::Constant(Vec::new())
    }
}

/// Input to `create_macro`. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMacro {
    pub name: String,
    #[serde(default)]
    pub arguments: MacroArguments,
}

impl NewMacro {
    pub fn new(name: impl Into<String>, arguments: MacroArguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    pub fn into_macro(self, id: Id) -> Macro {
        Macro {
            id,
            name: self.name,
            arguments: self.arguments,
        }
    }
}

/// A partial update: only fields that are `Some` are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<MacroArguments>,
}

impl MacroUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.arguments.is_none()
    }

    pub fn validate(&self) -> Result<(), MacroError> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }

    pub fn apply(&self, m: &mut Macro) {
        if let Some(name) = &self.name {
            m.name = name.clone();
        }
        if let Some(arguments) = &self.arguments {
            m.arguments = arguments.clone();
        }
    }
}

/// Rejects names that are empty or only whitespace.
pub fn validate_name(name: &str) -> Result<(), MacroError> {
    if name.trim().is_empty() {
        return Err(MacroError::Invalid {
            reason: "name is required".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Macro {
        Macro {
            id: Id::new(0x020f_755c_3c08_2000).unwrap(),
            name: "region".to_string(),
            arguments: MacroArguments::Constant(vec!["us-east".into(), "eu-west".into()]),
        }
    }

    #[test]
    fn constant_arguments_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "020f755c3c082000",
                "name": "region",
                "arguments": { "type": "constant", "values": ["us-east", "eu-west"] }
            })
        );
    }

    #[test]
    fn map_and_query_arguments_parse() {
        let map: MacroArguments =
            serde_json::from_value(json!({"type": "map", "values": {"a": "1"}})).unwrap();
        assert_eq!(
            map,
            MacroArguments::Map(BTreeMap::from([("a".to_string(), "1".to_string())]))
        );

        let query: MacroArguments = serde_json::from_value(json!({
            "type": "query",
            "values": {"query": "buckets()", "language": "flux"}
        }))
        .unwrap();
        assert_eq!(
            query,
            MacroArguments::Query {
                query: "buckets()".to_string(),
                language: "flux".to_string(),
            }
        );
    }

    #[test]
    fn unknown_argument_type_is_rejected() {
        let result: Result<MacroArguments, _> =
            serde_json::from_value(json!({"type": "csv", "values": []}));
        assert!(result.is_err());
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut m = sample();
        MacroUpdate {
            name: Some("zone".to_string()),
            arguments: None,
        }
        .apply(&mut m);
        assert_eq!(m.name, "zone");
        assert_eq!(m.arguments, sample().arguments);

        MacroUpdate {
            name: None,
            arguments: Some(MacroArguments::Constant(vec![])),
        }
        .apply(&mut m);
        assert_eq!(m.name, "zone");
        assert_eq!(m.arguments, MacroArguments::Constant(vec![]));
    }

    #[test]
    fn empty_update_is_noop() {
        let update = MacroUpdate::default();
        assert!(update.is_empty());
        let mut m = sample();
        update.apply(&mut m);
        assert_eq!(m, sample());
    }

    #[test]
    fn blank_names_are_invalid() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("ok").is_ok());
        let update = MacroUpdate {
            name: Some(String::new()),
            arguments: None,
        };
        assert_eq!(
            update.validate().unwrap_err().to_string(),
            "invalid macro: name is required (error reference code: 2)"
        );
    }

    #[test]
    fn new_macro_takes_assigned_id() {
        let id = Id::new(9).unwrap();
        let m = NewMacro::new("x", MacroArguments::default()).into_macro(id);
        assert_eq!(m.id, id);
        assert_eq!(m.name, "x");
    }
}
