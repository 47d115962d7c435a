//! Kit loading.
//!
//! A kit is a group of related tools. At startup the [`KitLoader`] walks the
//! configured kits once, in order, and lets each one register its tools
//! through a [`KitRegistrar`]. Only when every kit has been processed is the
//! registry frozen and handed to a transport.
//!
//! Registration is staged per kit: a kit's tools reach the registry only if
//! the whole kit loads. What happens to a failing kit is decided by
//! [`KitFailurePolicy`].

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::ToolError;
use super::arguments::ToolArguments;
use super::registry::{RegistryBuilder, ToolDefinition, ToolRegistry, panic_message};
use super::schema::ToolSchema;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while loading a kit.
#[derive(Debug, Error)]
pub enum KitError {
    /// A tool of the kit could not be registered.
    #[error("Kit '{kit}' failed to register a tool: {source}")]
    Registration {
        kit: String,
        #[source]
        source: ToolError,
    },

    /// The kit cannot run in this environment (missing credentials, ...).
    #[error("Kit '{kit}' is unavailable: {reason}")]
    Unavailable { kit: String, reason: String },

    /// A kit with the same name was loaded before.
    #[error("Kit '{0}' was already loaded")]
    AlreadyLoaded(String),

    /// The kit panicked during registration.
    #[error("Kit '{kit}' panicked while loading: {message}")]
    Panicked { kit: String, message: String },
}

impl KitError {
    /// Create an "unavailable" error.
    pub fn unavailable(kit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kit: kit.into(),
            reason: reason.into(),
        }
    }

    /// Name of the kit this error belongs to.
    pub fn kit(&self) -> &str {
        match self {
            Self::Registration { kit, .. }
            | Self::Unavailable { kit, .. }
            | Self::Panicked { kit, .. } => kit,
            Self::AlreadyLoaded(kit) => kit,
        }
    }
}

// ============================================================================
// Kit contract
// ============================================================================

/// A module of related tools.
///
/// `register` is called exactly once, before any transport starts. It must
/// be synchronous and should not block.
pub trait Kit: Send + Sync {
    /// Unique kit name.
    fn name(&self) -> &str;

    /// Register every tool of the kit.
    fn register(&self, registrar: &mut KitRegistrar<'_>) -> Result<(), KitError>;
}

/// Registration handle given to a kit while it loads.
pub struct KitRegistrar<'a> {
    kit: &'a str,
    existing: &'a RegistryBuilder,
    staged: Vec<ToolDefinition>,
}

impl<'a> KitRegistrar<'a> {
    fn new(kit: &'a str, existing: &'a RegistryBuilder) -> Self {
        Self {
            kit,
            existing,
            staged: Vec::new(),
        }
    }

    /// Stage a definition. Names already taken (by this or an earlier kit)
    /// are rejected.
    pub fn add(&mut self, definition: ToolDefinition) -> Result<(), KitError> {
        let name = definition.name();
        let taken = self.existing.contains(name) || self.staged.iter().any(|t| t.name() == name);
        if taken {
            return Err(self.registration_error(ToolError::duplicate(name)));
        }
        if name.trim().is_empty() {
            return Err(self.registration_error(ToolError::schema("tool name must not be empty")));
        }

        debug!("Kit '{}' staged tool '{}'", self.kit, name);
        self.staged.push(definition);
        Ok(())
    }

    /// Register a raw JSON handler.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        schema: ToolSchema,
        handler: F,
    ) -> Result<(), KitError>
    where
        F: Fn(ToolArguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.add(ToolDefinition::from_fn(name, schema, handler))
    }

    /// Register a typed handler whose schema is reflected from `P`.
    pub fn register_typed<P, R, F>(
        &mut self,
        name: impl Into<String>,
        doc: &str,
        handler: F,
    ) -> Result<(), KitError>
    where
        P: DeserializeOwned + JsonSchema + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let definition =
            ToolDefinition::typed(name, doc, handler).map_err(|e| self.registration_error(e))?;
        self.add(definition)
    }

    fn registration_error(&self, source: ToolError) -> KitError {
        KitError::Registration {
            kit: self.kit.to_string(),
            source,
        }
    }

    fn into_staged(self) -> Vec<ToolDefinition> {
        self.staged
    }
}

// ============================================================================
// Loader
// ============================================================================

/// What to do when a kit fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KitFailurePolicy {
    /// Log a warning and continue without the failing kit.
    #[default]
    Skip,

    /// Abort startup on the first failure.
    Abort,
}

/// A kit that loaded, with the number of tools it contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedKit {
    pub name: String,
    pub tools: usize,
}

/// A kit that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKit {
    pub name: String,
    pub reason: String,
}

/// Outcome of a load pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: Vec<LoadedKit>,
    pub skipped: Vec<SkippedKit>,
    /// Kits left out by the allow-list.
    pub disabled: Vec<String>,
}

/// Startup pass that turns kits into a frozen registry.
#[derive(Debug, Clone, Default)]
pub struct KitLoader {
    policy: KitFailurePolicy,
    allow_list: Option<Vec<String>>,
}

impl KitLoader {
    pub fn new(policy: KitFailurePolicy) -> Self {
        Self {
            policy,
            allow_list: None,
        }
    }

    /// Only load kits whose names appear in `names` (case-insensitive).
    pub fn with_allow_list(mut self, names: Option<Vec<String>>) -> Self {
        self.allow_list = names;
        self
    }

    fn is_enabled(&self, kit: &str) -> bool {
        self.allow_list
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n.eq_ignore_ascii_case(kit)))
    }

    /// Load every kit once, in order, and freeze the result.
    pub fn load(&self, kits: Vec<Box<dyn Kit>>) -> Result<(ToolRegistry, LoadReport), KitError> {
        let mut builder = RegistryBuilder::new();
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();

        for kit in &kits {
            let name = kit.name().to_string();
            if !self.is_enabled(&name) {
                debug!("Kit '{}' not in allow-list, skipping", name);
                report.disabled.push(name);
                continue;
            }

            let outcome = if seen.insert(name.clone()) {
                load_one(kit.as_ref(), &mut builder)
            } else {
                Err(KitError::AlreadyLoaded(name.clone()))
            };

            match outcome {
                Ok(tools) => {
                    info!("Loaded kit '{}' ({} tools)", name, tools);
                    report.loaded.push(LoadedKit { name, tools });
                }
                Err(e) if self.policy == KitFailurePolicy::Abort => {
                    error!("Aborting startup: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Skipping kit: {}", e);
                    report.skipped.push(SkippedKit {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(names) = &self.allow_list {
            for wanted in names {
                if !kits.iter().any(|k| k.name().eq_ignore_ascii_case(wanted)) {
                    warn!("Allow-listed kit '{}' does not exist", wanted);
                }
            }
        }

        Ok((builder.freeze(), report))
    }
}

/// Load one kit into `builder`, all or nothing.
fn load_one(kit: &dyn Kit, builder: &mut RegistryBuilder) -> Result<usize, KitError> {
    let mut registrar = KitRegistrar::new(kit.name(), builder);

    match catch_unwind(AssertUnwindSafe(|| kit.register(&mut registrar))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(payload) => {
            return Err(KitError::Panicked {
                kit: kit.name().to_string(),
                message: panic_message(payload.as_ref()),
            });
        }
    }

    let staged = registrar.into_staged();
    let count = staged.len();
    for definition in staged {
        builder.add(definition).map_err(|source| KitError::Registration {
            kit: kit.name().to_string(),
            source,
        })?;
    }
    Ok(count)
}
