//! Layered configuration.
//!
//! Tiers, lowest priority first, merged field by field:
//! 1. **Defaults** compiled into the binary
//! 2. **Project** `$CWD/kanban-order/config.yaml`
//! 3. **User** `~/.kanban-order/config.yaml`
//! 4. **Environment** variables
//!
//! ## Environment Variables
//! - `KANBAN_ORDER_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `KANBAN_ORDER_DB_PATH` - Database path
//! - `KANBAN_ORDER_MAX_ATTEMPTS` - Attempts per conflicting reorder

mod loader;
mod merge;
mod types;

pub use loader::{
    ConfigLoader, ConfigPaths, ConfigTier, ENV_CONFIG_PATH, ENV_DB_PATH, ENV_MAX_ATTEMPTS,
};
pub use merge::deep_merge;
pub use types::*;
