//! Domains module containing business logic organized by bounded contexts.
//!
//! - `tools`: schema extraction, the registry and kit loading
//! - `kits`: the concrete tool collections shipped with the server

pub mod kits;
pub mod tools;
