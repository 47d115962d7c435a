//! Schema extraction for tool callables.
//!
//! Every tool is described by a [`ToolSchema`]: a description plus an ordered
//! list of [`ParameterSpec`]s. Schemas come from one of two places:
//!
//! - explicit declaration through [`ToolSchema::builder`]
//! - reflection over a `JsonSchema` parameter struct through
//!   [`ToolSchema::from_type`]
//!
//! Both feed a [`Signature`] into [`extract`], so the rules for requiredness,
//! defaults and type mapping live in exactly one place.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ToolError;

// ============================================================================
// Types
// ============================================================================

/// Normalized parameter type.
///
/// `Unknown` is a permissive placeholder that accepts any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Unknown,
}

impl TypeTag {
    /// Map a declared type name onto a tag.
    ///
    /// Accepts JSON Schema names as well as the usual short spellings
    /// (`str`, `int`, `float`, `bool`, `dict`, `list`). Anything else,
    /// including no declaration at all, maps to [`TypeTag::Unknown`].
    pub fn from_declared(declared: Option<&str>) -> Self {
        let Some(declared) = declared else {
            return Self::Unknown;
        };

        match declared.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Self::String,
            "integer" | "int" | "i32" | "i64" | "u32" | "u64" | "isize" | "usize" => Self::Integer,
            "number" | "float" | "double" | "f32" | "f64" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "object" | "dict" | "map" => Self::Object,
            "array" | "list" | "vec" | "tuple" => Self::Array,
            _ => Self::Unknown,
        }
    }

    /// Lowercase wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Unknown => "unknown",
        }
    }

    /// JSON Schema `type` keyword, absent for `Unknown`.
    fn json_schema_type(&self) -> Option<&'static str> {
        match self {
            Self::Unknown => None,
            other => Some(other.as_str()),
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized description of one tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub type_tag: TypeTag,

    /// True iff the parameter has no default.
    pub required: bool,

    /// Present only when `required` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A parameter as declared by a kit author, before normalization.
#[derive(Debug, Clone, Default)]
pub struct DeclaredParam {
    pub name: String,
    pub declared_type: Option<String>,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl DeclaredParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The raw shape of a callable: its documentation and parameter list.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub doc: Option<String>,
    pub params: Vec<DeclaredParam>,
}

/// Description and parameter list of a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

// ============================================================================
// Extraction
// ============================================================================

/// Normalize a signature into a schema.
///
/// Missing documentation yields an empty description and missing or
/// unsupported types yield [`TypeTag::Unknown`]. The only failure is a
/// structurally broken parameter list.
pub fn extract(signature: &Signature) -> Result<ToolSchema, ToolError> {
    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(signature.params.len());

    for param in &signature.params {
        if param.name.trim().is_empty() {
            return Err(ToolError::schema("parameter name must not be empty"));
        }
        if !seen.insert(param.name.as_str()) {
            return Err(ToolError::schema(format!(
                "parameter '{}' declared more than once",
                param.name
            )));
        }

        parameters.push(ParameterSpec {
            name: param.name.clone(),
            type_tag: TypeTag::from_declared(param.declared_type.as_deref()),
            required: param.default.is_none(),
            default: param.default.clone(),
            description: param.description.clone(),
        });
    }

    Ok(ToolSchema {
        description: clean_doc(signature.doc.as_deref().unwrap_or_default()),
        parameters,
    })
}

/// Strip common indentation and blank edges from a doc string.
fn clean_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    cleaned.push(first.trim());
    for line in rest {
        let lead = line.len() - line.trim_start().len();
        let stripped = line.get(lead.min(indent)..).unwrap_or(line.trim_start());
        cleaned.push(stripped.trim_end());
    }

    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

// ============================================================================
// Declaration and reflection
// ============================================================================

impl ToolSchema {
    /// Start an explicit declaration.
    pub fn builder(doc: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            signature: Signature {
                doc: Some(doc.into()),
                params: Vec::new(),
            },
        }
    }

    /// Derive a schema from a parameter struct's `JsonSchema` implementation.
    ///
    /// `doc` wins over the struct's own doc comment when it is non-empty.
    pub fn from_type<P: JsonSchema>(doc: &str) -> Result<Self, ToolError> {
        let schema = schemars::schema_for!(P);
        let root = serde_json::to_value(&schema).map_err(|e| ToolError::schema(e.to_string()))?;
        extract(&signature_from_json_schema(&root, doc))
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of all required parameters, in declaration order.
    pub fn required_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Render as a JSON Schema object, the shape MCP clients expect.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = Map::new();
            if let Some(ty) = param.type_tag.json_schema_type() {
                property.insert("type".into(), Value::from(ty));
            }
            if let Some(description) = &param.description {
                property.insert("description".into(), Value::from(description.as_str()));
            }
            if let Some(default) = &param.default {
                property.insert("default".into(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }

        let mut schema = Map::new();
        schema.insert("type".into(), Value::from("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), Value::from(self.required_names()));
        schema
    }
}

/// Explicit schema declaration.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    signature: Signature,
}

impl SchemaBuilder {
    /// Declare a required parameter.
    pub fn required(mut self, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.signature
            .params
            .push(DeclaredParam::new(name).with_type(type_tag.as_str()));
        self
    }

    /// Declare an optional parameter with its default.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        type_tag: TypeTag,
        default: impl Into<Value>,
    ) -> Self {
        self.signature.params.push(
            DeclaredParam::new(name)
                .with_type(type_tag.as_str())
                .with_default(default),
        );
        self
    }

    /// Declare a required parameter without a type.
    pub fn untyped(mut self, name: impl Into<String>) -> Self {
        self.signature.params.push(DeclaredParam::new(name));
        self
    }

    pub fn build(self) -> Result<ToolSchema, ToolError> {
        extract(&self.signature)
    }
}

/// Read a derived JSON Schema back into a signature.
fn signature_from_json_schema(root: &Value, doc: &str) -> Signature {
    let doc = if doc.trim().is_empty() {
        root.get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
    } else {
        Some(doc.to_string())
    };

    let required: HashSet<&str> = root
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let params = root
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .map(|(name, property)| {
                    let default = if required.contains(name.as_str()) {
                        None
                    } else {
                        Some(property.get("default").cloned().unwrap_or(Value::Null))
                    };
                    DeclaredParam {
                        name: name.clone(),
                        declared_type: property_type(property),
                        default,
                        description: property
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Signature { doc, params }
}

/// The single non-null `type` of a property schema, if it has one.
fn property_type(property: &Value) -> Option<String> {
    match property.get("type")? {
        Value::String(ty) => Some(ty.clone()),
        Value::Array(types) => {
            let mut non_null = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|ty| *ty != "null");
            match (non_null.next(), non_null.next()) {
                (Some(ty), None) => Some(ty.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    /// Parameters used to exercise reflection.
    #[allow(dead_code)]
    #[derive(Debug, Deserialize, JsonSchema)]
    struct PreviewParams {
        /// Table to preview.
        table_name: String,
        #[serde(default = "default_limit")]
        limit: i64,
        verbose: Option<bool>,
        extra: serde_json::Value,
    }

    fn default_limit() -> i64 {
        20
    }

    #[test]
    fn test_echo_schema() {
        let schema = ToolSchema::builder("Echo text back.")
            .required("text", TypeTag::String)
            .optional("times", TypeTag::Integer, 1)
            .build()
            .unwrap();

        assert_eq!(schema.description, "Echo text back.");
        let params = serde_json::to_value(&schema.parameters).unwrap();
        assert_eq!(
            params,
            json!([
                {"name": "text", "type": "string", "required": true},
                {"name": "times", "type": "integer", "required": false, "default": 1}
            ])
        );
    }

    #[test]
    fn test_required_matches_missing_defaults() {
        let schema = ToolSchema::builder("")
            .required("a", TypeTag::String)
            .optional("b", TypeTag::Boolean, false)
            .untyped("c")
            .optional("d", TypeTag::Array, json!([]))
            .build()
            .unwrap();

        for param in &schema.parameters {
            assert_eq!(param.required, param.default.is_none(), "{}", param.name);
        }
        assert_eq!(schema.required_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_untyped_parameter_is_unknown() {
        let schema = extract(&Signature {
            doc: None,
            params: vec![DeclaredParam::new("anything")],
        })
        .unwrap();

        assert_eq!(schema.description, "");
        assert_eq!(schema.parameters[0].type_tag, TypeTag::Unknown);
        assert!(schema.parameters[0].required);
    }

    #[test]
    fn test_unsupported_type_is_unknown() {
        let schema = extract(&Signature {
            doc: None,
            params: vec![DeclaredParam::new("when").with_type("datetime")],
        })
        .unwrap();
        assert_eq!(schema.parameters[0].type_tag, TypeTag::Unknown);
    }

    #[test]
    fn test_declared_aliases() {
        assert_eq!(TypeTag::from_declared(Some("str")), TypeTag::String);
        assert_eq!(TypeTag::from_declared(Some("int")), TypeTag::Integer);
        assert_eq!(TypeTag::from_declared(Some("float")), TypeTag::Number);
        assert_eq!(TypeTag::from_declared(Some("bool")), TypeTag::Boolean);
        assert_eq!(TypeTag::from_declared(Some("dict")), TypeTag::Object);
        assert_eq!(TypeTag::from_declared(Some("list")), TypeTag::Array);
        assert_eq!(TypeTag::from_declared(None), TypeTag::Unknown);
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let result = ToolSchema::builder("")
            .required("x", TypeTag::String)
            .required("x", TypeTag::Integer)
            .build();
        assert!(matches!(result, Err(ToolError::SchemaExtraction(_))));
    }

    #[test]
    fn test_empty_parameter_name_rejected() {
        let result = ToolSchema::builder("").untyped("  ").build();
        assert!(matches!(result, Err(ToolError::SchemaExtraction(_))));
    }

    #[test]
    fn test_doc_is_dedented() {
        let schema = ToolSchema::builder(
            "\n    Roll dice using standard notation.\n    Returns each roll.\n    ",
        )
        .build()
        .unwrap();
        assert_eq!(
            schema.description,
            "Roll dice using standard notation.\nReturns each roll."
        );
    }

    #[test]
    fn test_from_type_reflection() {
        let schema = ToolSchema::from_type::<PreviewParams>("Preview rows.").unwrap();
        assert_eq!(schema.description, "Preview rows.");

        let names: Vec<_> = schema.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["table_name", "limit", "verbose", "extra"]);

        let table = schema.parameter("table_name").unwrap();
        assert_eq!(table.type_tag, TypeTag::String);
        assert!(table.required);

        let limit = schema.parameter("limit").unwrap();
        assert_eq!(limit.type_tag, TypeTag::Integer);
        assert!(!limit.required);

        let verbose = schema.parameter("verbose").unwrap();
        assert_eq!(verbose.type_tag, TypeTag::Boolean);
        assert!(!verbose.required);
        assert_eq!(verbose.default, Some(Value::Null));

        let extra = schema.parameter("extra").unwrap();
        assert_eq!(extra.type_tag, TypeTag::Unknown);

        for param in &schema.parameters {
            assert_eq!(param.required, param.default.is_none());
        }
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = ToolSchema::builder("Echo")
            .required("text", TypeTag::String)
            .optional("times", TypeTag::Integer, 1)
            .untyped("payload")
            .build()
            .unwrap();

        let input = Value::Object(schema.input_schema());
        assert_eq!(input["type"], "object");
        assert_eq!(input["properties"]["text"]["type"], "string");
        assert_eq!(input["properties"]["times"]["default"], 1);
        assert!(input["properties"]["payload"].get("type").is_none());
        assert_eq!(input["required"], json!(["text", "payload"]));
    }
}
