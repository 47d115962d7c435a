//! Kits shipped with the server.
//!
//! Each kit implements [`Kit`](crate::domains::tools::Kit) and is listed in
//! [`builtin_kits`], which fixes the load order.

pub mod dnd;
pub mod sqlite;
pub mod web;

pub use dnd::DndKit;
pub use sqlite::SqliteKit;
pub use web::{TavilyClient, WebKit};

use crate::core::config::Config;
use crate::domains::tools::Kit;

/// Every built-in kit, in load order.
pub fn builtin_kits(config: &Config) -> Vec<Box<dyn Kit>> {
    vec![
        Box::new(DndKit),
        Box::new(WebKit::new(config.credentials.tavily_api_key.clone())),
        Box::new(SqliteKit::new(&config.kits.sqlite_path)),
    ]
}
