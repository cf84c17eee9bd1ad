//! TARA Store: persistence behind the core's `RuleStore` and `ProfileStore`
//!
//! SQLite is the durable backend. Every call opens its own connection on the
//! blocking pool, so store handles are cheap to clone and share.
//!
//! ```text
//! mobility_logic(origin, dest, rule)          ← SqliteRuleStore (read-only)
//! user_profiles(user_id PK, ...)              ← SqliteProfileStore
//! interaction_history(id, user_id, ...)       ← SqliteProfileStore (append-only)
//! ```
//!
//! The in-memory variants back tests and `TARA_DB_PATH=:memory:` runs.

pub mod memory;
pub mod profiles;
pub mod rules;
mod sqlite;

pub use memory::{MemoryProfileStore, StaticRuleStore};
pub use profiles::SqliteProfileStore;
pub use rules::SqliteRuleStore;
