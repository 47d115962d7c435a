//! Tools domain module.
//!
//! This module handles everything between a kit's callable and a transport:
//! schema extraction, argument coercion, the registry and kit loading.
//! Tools are opaque callables here; concrete ones live in `domains::kits`.
//!
//! ## Architecture
//!
//! - `schema.rs` - Schema extractor (explicit declaration or reflection)
//! - `arguments.rs` - Best-effort argument coercion against a schema
//! - `registry.rs` - Registry builder, frozen registry and invocation
//! - `loader.rs` - Kit contract and the startup load pass
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Kit
//!
//! 1. Implement [`Kit`] (one `register` call per exposed function)
//! 2. Add it to `domains::kits::builtin_kits()`

mod arguments;
mod error;
pub mod loader;
mod registry;
pub mod schema;

pub use arguments::{ToolArguments, coerce_arguments};
pub use error::ToolError;
pub use loader::{Kit, KitError, KitFailurePolicy, KitLoader, KitRegistrar, LoadReport};
pub use registry::{RegistryBuilder, ToolDefinition, ToolHandler, ToolRegistry};
pub use schema::{DeclaredParam, ParameterSpec, Signature, ToolSchema, TypeTag};
