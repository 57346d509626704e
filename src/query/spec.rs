use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Declarative description of the node shape to search for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case", deny_unknown_fields)]
pub enum MatchSpec {
    /// Function declarations, function expressions and arrow functions.
    Function {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        anonymous: Option<bool>,
        /// Exact, ordered parameter names.
        #[serde(default)]
        params: Option<Vec<String>>,
    },
    /// Object literals.
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        anonymous: Option<bool>,
        #[serde(default)]
        keys: Option<KeySpec>,
        #[serde(default)]
        values: Option<Map<String, Value>>,
    },
    Property {
        name: String,
    },
    Identifier {
        name: String,
    },
    Literal {
        value: Value,
    },
    Call {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        params: Option<Vec<ArgSpec>>,
    },
}

/// Required keys of an object literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    /// Every listed key must be present.
    Names(Vec<String>),
    /// Every key must be present; nested specs apply to the key's object value.
    Nested(BTreeMap<String, KeySpec>),
    /// Leaf of a nested spec (`{ b = true }`): presence only.
    Present(Value),
}

/// One call argument constraint.
///
/// An entry with a `category` must be a valid [`MatchSpec`]; a typo in it is
/// an error rather than a silent wildcard. Entries without one (`{}` or a
/// bare name) match any argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSpec {
    Match(MatchSpec),
    Any,
}

impl<'de> Deserialize<'de> for ArgSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let has_category = matches!(&value, Value::Object(map) if map.contains_key("category"));
        if !has_category {
            return Ok(ArgSpec::Any);
        }
        MatchSpec::deserialize(value)
            .map(ArgSpec::Match)
            .map_err(|e| de::Error::custom(format!("invalid argument spec: {e}")))
    }
}

impl MatchSpec {
    pub fn function(name: impl Into<String>) -> Self {
        MatchSpec::Function {
            name: Some(name.into()),
            anonymous: None,
            params: None,
        }
    }

    pub fn object_with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchSpec::Object {
            name: None,
            anonymous: None,
            keys: Some(KeySpec::Names(keys.into_iter().map(Into::into).collect())),
            values: None,
        }
    }

    pub fn property(name: impl Into<String>) -> Self {
        MatchSpec::Property { name: name.into() }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        MatchSpec::Identifier { name: name.into() }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        MatchSpec::Literal {
            value: value.into(),
        }
    }

    pub fn call(name: impl Into<String>) -> Self {
        MatchSpec::Call {
            name: Some(name.into()),
            params: None,
        }
    }

    /// Category tag, as used in manifests and log output.
    pub fn category(&self) -> &'static str {
        match self {
            MatchSpec::Function { .. } => "function",
            MatchSpec::Object { .. } => "object",
            MatchSpec::Property { .. } => "property",
            MatchSpec::Identifier { .. } => "identifier",
            MatchSpec::Literal { .. } => "literal",
            MatchSpec::Call { .. } => "call",
        }
    }

    /// Short human description for count-mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            MatchSpec::Function { name: Some(n), .. }
            | MatchSpec::Object { name: Some(n), .. }
            | MatchSpec::Call { name: Some(n), .. } => format!("{} '{n}'", self.category()),
            MatchSpec::Property { name } | MatchSpec::Identifier { name } => {
                format!("{} '{name}'", self.category())
            }
            MatchSpec::Literal { value } => format!("literal {value}"),
            _ => self.category().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_function_spec() {
        let spec: MatchSpec = serde_json::from_value(json!({
            "category": "function",
            "name": "update",
            "params": ["dt"]
        }))
        .unwrap();
        assert_eq!(
            spec,
            MatchSpec::Function {
                name: Some("update".into()),
                anonymous: None,
                params: Some(vec!["dt".into()]),
            }
        );
    }

    #[test]
    fn rejects_unknown_category() {
        let result: Result<MatchSpec, _> =
            serde_json::from_value(json!({ "category": "regexp", "name": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn property_requires_name() {
        let result: Result<MatchSpec, _> = serde_json::from_value(json!({ "category": "property" }));
        assert!(result.is_err());
    }

    #[test]
    fn nested_keys_and_wildcard_arguments() {
        let spec: MatchSpec = serde_json::from_value(json!({
            "category": "object",
            "keys": { "a": { "b": true }, "c": ["d", "e"] }
        }))
        .unwrap();
        let MatchSpec::Object { keys: Some(KeySpec::Nested(map)), .. } = spec else {
            panic!("expected nested keys");
        };
        assert!(matches!(map["a"], KeySpec::Nested(_)));
        assert!(matches!(map["c"], KeySpec::Names(_)));

        let spec: MatchSpec = serde_json::from_value(json!({
            "category": "call",
            "name": "on",
            "params": [{ "category": "literal", "value": "tick" }, {}]
        }))
        .unwrap();
        let MatchSpec::Call { params: Some(params), .. } = spec else {
            panic!("expected params");
        };
        assert!(matches!(params[0], ArgSpec::Match(MatchSpec::Literal { .. })));
        assert_eq!(params[1], ArgSpec::Any);
    }

    #[test]
    fn argument_specs_with_a_category_are_strict() {
        let typo_category = serde_json::from_value::<MatchSpec>(json!({
            "category": "call",
            "name": "on",
            "params": [{ "category": "litreal", "value": "tick" }]
        }));
        let err = typo_category.unwrap_err().to_string();
        assert!(err.contains("invalid argument spec"), "{err}");
        assert!(err.contains("litreal"), "{err}");

        let typo_field = serde_json::from_value::<MatchSpec>(json!({
            "category": "call",
            "params": [{ "category": "literal", "valeu": "tick" }]
        }));
        assert!(typo_field.is_err());

        let spec: MatchSpec = serde_json::from_value(json!({
            "category": "call",
            "params": ["dt", {}]
        }))
        .unwrap();
        let MatchSpec::Call { params: Some(params), .. } = spec else {
            panic!("expected params");
        };
        assert_eq!(params, vec![ArgSpec::Any, ArgSpec::Any]);
    }

    #[test]
    fn describe_names_the_target() {
        assert_eq!(MatchSpec::property("cost").describe(), "property 'cost'");
        assert_eq!(MatchSpec::literal(50).describe(), "literal 50");
    }
}
