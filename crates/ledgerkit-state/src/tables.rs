//! redb table definitions for the ledger backend.
//!
//! Simple keys and composite keys share one table; composite keys start
//! with U+0000 and therefore sort ahead of every simple key.

use redb::TableDefinition;

/// Committed world state: ledger key to stored value bytes.
pub const WORLD_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("world_state");
