//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - [`ToolDefinition`]: name, schema and handler of one tool
//! - [`RegistryBuilder`]: the mutable store filled while kits load
//! - [`ToolRegistry`]: the frozen, shareable store every transport reads
//!
//! The registry is the single source of truth for tool metadata. REST,
//! MCP-stdio and MCP-HTTP all list and invoke through it.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::ToolError;
use super::arguments::{ToolArguments, coerce_arguments};
use super::schema::{ParameterSpec, ToolSchema};

/// Type-erased tool handler.
///
/// Receives arguments already coerced against the tool's parameters.
pub type ToolHandler = Arc<dyn Fn(ToolArguments) -> Result<Value, ToolError> + Send + Sync>;

// ============================================================================
// Tool Definition
// ============================================================================

/// A registered tool.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    schema: ToolSchema,
    handler: ToolHandler,
}

impl ToolDefinition {
    /// Create a definition from an already type-erased handler.
    pub fn new(name: impl Into<String>, schema: ToolSchema, handler: ToolHandler) -> Self {
        Self {
            name: name.into(),
            schema,
            handler,
        }
    }

    /// Create a definition from a handler working on raw JSON arguments.
    ///
    /// Any error the handler returns is reported as an execution failure.
    pub fn from_fn<F>(name: impl Into<String>, schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let handler: ToolHandler = Arc::new(move |args: ToolArguments| {
            handler(args).map_err(|e| ToolError::execution_failed(format!("{e:#}")))
        });
        Self::new(name, schema, handler)
    }

    /// Create a definition from a handler taking a typed parameter struct.
    ///
    /// The schema is reflected from `P`. Arguments that do not deserialize
    /// into `P` are reported as invalid arguments, not execution failures.
    pub fn typed<P, R, F>(name: impl Into<String>, doc: &str, handler: F) -> Result<Self, ToolError>
    where
        P: DeserializeOwned + JsonSchema + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let schema = ToolSchema::from_type::<P>(doc)?;
        let handler: ToolHandler = Arc::new(move |args: ToolArguments| {
            let params: P = serde_json::from_value(Value::Object(args))
                .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
            let output =
                handler(params).map_err(|e| ToolError::execution_failed(format!("{e:#}")))?;
            serde_json::to_value(output).map_err(|e| {
                ToolError::execution_failed(format!("result is not serializable: {e}"))
            })
        });
        Ok(Self::new(name, schema, handler))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.schema.description
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.schema.parameters
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Coerce the arguments and run the handler, capturing panics.
    fn call(&self, args: ToolArguments) -> Result<Value, ToolError> {
        let args = coerce_arguments(&self.schema.parameters, args)?;
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(args))) {
            Ok(result) => result,
            Err(payload) => Err(ToolError::execution_failed(format!(
                "tool '{}' panicked: {}",
                self.name,
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Create a Tool model for this tool (MCP metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.schema.description.clone().into()),
            input_schema: Arc::new(self.schema.input_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Flat summary used by the REST listing.
    pub fn to_summary(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.schema.description,
            "parameters": self.schema.parameters,
        })
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

// ============================================================================
// Registry Builder
// ============================================================================

/// Mutable tool store, used only during startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tool with this name is already registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Add a definition. Duplicate names are rejected.
    pub fn add(&mut self, definition: ToolDefinition) -> Result<(), ToolError> {
        if definition.name.trim().is_empty() {
            return Err(ToolError::schema("tool name must not be empty"));
        }
        if self.contains(&definition.name) {
            return Err(ToolError::duplicate(&definition.name));
        }

        debug!("Registered tool: {}", definition.name);
        self.index.insert(definition.name.clone(), self.tools.len());
        self.tools.push(definition);
        Ok(())
    }

    /// Register a raw JSON handler under `name`.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        schema: ToolSchema,
        handler: F,
    ) -> Result<(), ToolError>
    where
        F: Fn(ToolArguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.add(ToolDefinition::from_fn(name, schema, handler))
    }

    /// Register a typed handler under `name`, reflecting its schema.
    pub fn register_typed<P, R, F>(
        &mut self,
        name: impl Into<String>,
        doc: &str,
        handler: F,
    ) -> Result<(), ToolError>
    where
        P: DeserializeOwned + JsonSchema + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        self.add(ToolDefinition::typed(name, doc, handler)?)
    }

    /// Finish startup: no more registrations after this point.
    pub fn freeze(self) -> ToolRegistry {
        info!("Tool registry frozen with {} tools", self.tools.len());
        ToolRegistry {
            tools: self.tools,
            index: self.index,
        }
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Immutable tool store shared by every transport.
///
/// Reads need no locking: nothing mutates the registry after
/// [`RegistryBuilder::freeze`].
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// All tools in registration order.
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Get all tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name.
    ///
    /// Never panics on behalf of a handler: faults come back as
    /// [`ToolError::ExecutionFailed`].
    #[instrument(skip(self, args))]
    pub fn invoke(&self, name: &str, args: ToolArguments) -> Result<Value, ToolError> {
        let Some(definition) = self.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(name));
        };

        info!("Invoking tool: {}", name);
        let result = definition.call(args);
        if let Err(e) = &result {
            warn!("Tool '{}' failed: {}", name, e);
        }
        result
    }

    /// Invoke a tool on the blocking pool.
    ///
    /// Each invocation is one task that runs to completion; concurrent
    /// requests become independent tasks.
    pub async fn invoke_blocking(
        self: Arc<Self>,
        name: String,
        args: ToolArguments,
    ) -> Result<Value, ToolError> {
        let tool_name = name.clone();
        tokio::task::spawn_blocking(move || self.invoke(&name, args))
            .await
            .unwrap_or_else(|e| {
                Err(ToolError::execution_failed(format!(
                    "tool '{tool_name}' did not complete: {e}"
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::schema::TypeTag;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct AddParams {
        a: i64,
        #[serde(default)]
        b: i64,
    }

    fn echo_schema() -> ToolSchema {
        ToolSchema::builder("Repeat text.")
            .required("text", TypeTag::String)
            .optional("times", TypeTag::Integer, 1)
            .build()
            .unwrap()
    }

    fn echo(args: ToolArguments) -> anyhow::Result<Value> {
        let text = args["text"].as_str().unwrap_or_default();
        let times = args["times"].as_u64().unwrap_or(1) as usize;
        Ok(Value::from(text.repeat(times)))
    }

    fn test_registry() -> ToolRegistry {
        let mut builder = RegistryBuilder::new();
        builder.register("echo", echo_schema(), echo).unwrap();
        builder
            .register("fail", ToolSchema::default(), |_| anyhow::bail!("boom"))
            .unwrap();
        builder
            .register("panic", ToolSchema::default(), |_| panic!("kaboom"))
            .unwrap();
        builder
            .register_typed("add", "Add two numbers.", |p: AddParams| Ok(p.a + p.b))
            .unwrap();
        builder.freeze()
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_list_in_registration_order() {
        let registry = test_registry();
        assert_eq!(registry.names(), vec!["echo", "fail", "panic", "add"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_invoke_uses_default() {
        let registry = test_registry();
        let result = registry.invoke("echo", args(json!({"text": "hi"}))).unwrap();
        assert_eq!(result, json!("hi"));
    }

    #[test]
    fn test_invoke_matches_direct_call() {
        let registry = test_registry();
        let input = args(json!({"text": "ab", "times": 3}));
        let direct = echo(input.clone()).unwrap();
        assert_eq!(registry.invoke("echo", input).unwrap(), direct);
    }

    #[test]
    fn test_invoke_unknown_tool() {
        let registry = test_registry();
        let result = registry.invoke("missing", ToolArguments::new());
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[test]
    fn test_handler_error_is_execution_failure() {
        let registry = test_registry();
        let result = registry.invoke("fail", ToolArguments::new());
        assert!(matches!(result, Err(ToolError::ExecutionFailed(ref m)) if m.contains("boom")));
    }

    #[test]
    fn test_handler_panic_is_captured() {
        let registry = test_registry();
        let result = registry.invoke("panic", ToolArguments::new());
        assert!(matches!(result, Err(ToolError::ExecutionFailed(ref m)) if m.contains("kaboom")));
    }

    #[test]
    fn test_typed_tool() {
        let registry = test_registry();
        let add = registry.get("add").unwrap();
        assert_eq!(add.description(), "Add two numbers.");
        assert!(add.parameters()[0].required);
        assert!(!add.parameters()[1].required);

        let result = registry.invoke("add", args(json!({"a": "2", "b": 3}))).unwrap();
        assert_eq!(result, json!(5));

        let result = registry.invoke("add", args(json!({"a": 2}))).unwrap();
        assert_eq!(result, json!(2));
    }

    #[test]
    fn test_invalid_arguments() {
        let registry = test_registry();
        let result = registry.invoke("echo", args(json!({"times": 2})));
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register("search", ToolSchema::default(), |_| Ok(json!(1))).unwrap();
        let result = builder.register("search", ToolSchema::default(), |_| Ok(json!(2)));
        assert!(matches!(result, Err(ToolError::DuplicateTool(ref n)) if n == "search"));

        let registry = builder.freeze();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.invoke("search", ToolArguments::new()).unwrap(), json!(1));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut builder = RegistryBuilder::new();
        let result = builder.register("", ToolSchema::default(), |_| Ok(Value::Null));
        assert!(result.is_err());
    }

    #[test]
    fn test_to_tool_metadata() {
        let registry = test_registry();
        let tool = registry.get("echo").unwrap().to_tool();
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.input_schema["required"], json!(["text"]));
    }

    #[test]
    fn test_summary_shape() {
        let registry = test_registry();
        let summary = registry.get("echo").unwrap().to_summary();
        assert_eq!(
            summary,
            json!({
                "name": "echo",
                "description": "Repeat text.",
                "parameters": [
                    {"name": "text", "type": "string", "required": true},
                    {"name": "times", "type": "integer", "required": false, "default": 1}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_invoke_blocking() {
        let registry = Arc::new(test_registry());
        let result = registry
            .clone()
            .invoke_blocking("echo".into(), args(json!({"text": "x", "times": 2})))
            .await;
        assert_eq!(result.unwrap(), json!("xx"));

        let result = registry
            .invoke_blocking("panic".into(), ToolArguments::new())
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }
}
