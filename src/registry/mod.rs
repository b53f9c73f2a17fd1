//! The uniform tool-invocation contract.
//!
//! Every capability exposes a [`ToolSpec`] (name, description, input schema,
//! output type) and an async `invoke` taking a JSON argument map. Failures come
//! back as [`ToolError`]; [`render`] flattens a result into the single string
//! an orchestrator expects.

mod catalog;

pub use catalog::{BuiltinTool, Registry};

use crate::error::{ToolError, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Arguments passed to a tool invocation.
pub type Arguments = Map<String, Value>;

/// Description of a single tool input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Type tag: `string`, `integer`, `number`, `boolean`, `object`, `array` or `any`.
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl InputSpec {
    pub fn new(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: description.to_string(),
            nullable: false,
        }
    }

    /// An input the caller may omit.
    pub fn nullable(kind: &str, description: &str) -> Self {
        Self {
            nullable: true,
            ..Self::new(kind, description)
        }
    }
}

/// Static description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub inputs: BTreeMap<String, InputSpec>,
    pub output_type: String,
}

impl ToolSpec {
    /// Start a spec with a string output and no inputs.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            inputs: BTreeMap::new(),
            output_type: "string".to_string(),
        }
    }

    /// Add an input parameter.
    pub fn input(mut self, name: &str, spec: InputSpec) -> Self {
        self.inputs.insert(name.to_string(), spec);
        self
    }

    /// Render the inputs as a JSON Schema object.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (name, input) in &self.inputs {
            let mut property = Map::new();
            if input.kind != "any" {
                property.insert("type".to_string(), Value::String(input.kind.clone()));
            }
            property.insert(
                "description".to_string(),
                Value::String(input.description.clone()),
            );
            properties.insert(name.clone(), Value::Object(property));

            if !input.nullable {
                required.push(Value::String(name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

/// A capability an orchestrator can call by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and schema.
    fn spec(&self) -> &ToolSpec;

    /// Run the tool with the given arguments.
    async fn invoke(&self, args: &Arguments) -> ToolResult;
}

/// Flatten a tool result into the string handed back to an orchestrator.
pub fn render(result: ToolResult) -> String {
    result.unwrap_or_else(|e| e.to_string())
}

/// Extract a required string argument.
pub fn required_str<'a>(args: &'a Arguments, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
        None => Err(ToolError::InvalidArguments(format!(
            "Missing '{}' argument",
            key
        ))),
    }
}

/// Extract an optional integer argument. `null` counts as absent.
pub fn optional_i64(args: &Arguments, key: &str) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            ToolError::InvalidArguments(format!("'{}' must be an integer, got {}", key, v))
        }),
    }
}

/// Build an argument map from a JSON value, which must be an object.
pub fn arguments_from_value(value: Value) -> Result<Arguments, ToolError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Arguments::new()),
        other => Err(ToolError::InvalidArguments(format!(
            "Arguments must be a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        arguments_from_value(value).unwrap()
    }

    #[test]
    fn test_json_schema() {
        let spec = ToolSpec::new("google_search", "Search")
            .input("query", InputSpec::new("string", "The search query"))
            .input(
                "filter_year",
                InputSpec::nullable("integer", "Restrict results to a year"),
            );

        let schema = spec.json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["filter_year"]["type"], "integer");
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[test]
    fn test_any_type_has_no_type_key() {
        let spec = ToolSpec::new("final_answer", "Final answer")
            .input("answer", InputSpec::new("any", "The final answer"));
        let schema = spec.json_schema();
        assert!(schema["properties"]["answer"].get("type").is_none());
        assert_eq!(spec.output_type, "string");
    }

    #[test]
    fn test_required_str() {
        let a = args(json!({"query": "rust", "limit": 3}));
        assert_eq!(required_str(&a, "query").unwrap(), "rust");
        assert!(matches!(
            required_str(&a, "missing"),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            required_str(&a, "limit"),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_optional_i64() {
        let a = args(json!({"year": 2020, "empty": null, "bad": "x"}));
        assert_eq!(optional_i64(&a, "year").unwrap(), Some(2020));
        assert_eq!(optional_i64(&a, "empty").unwrap(), None);
        assert_eq!(optional_i64(&a, "absent").unwrap(), None);
        assert!(optional_i64(&a, "bad").is_err());
    }

    #[test]
    fn test_arguments_from_value() {
        assert!(arguments_from_value(Value::Null).unwrap().is_empty());
        assert!(arguments_from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(render(Ok("fine".to_string())), "fine");
        assert_eq!(
            render(Err(ToolError::FileNotFound("a.csv".to_string()))),
            "File not found: a.csv"
        );
    }
}
