mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{is_row_level_sqlstate, PgStore};

use crate::traits::EntryStore;
use crate::types::Result;
use std::sync::Arc;
use tracing::info;

/// Database URL scheme selecting the in-process store.
pub const MEMORY_URL_SCHEME: &str = "memory://";

/// Open the store named by `database_url`: `memory://` for the in-process
/// store, anything else is handed to PostgreSQL and migrated.
pub async fn open_store(database_url: &str) -> Result<Arc<dyn EntryStore>> {
    if database_url.starts_with(MEMORY_URL_SCHEME) {
        info!("Using in-memory entry store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(database_url).await?;
    store.migrate().await?;
    info!("Connected to PostgreSQL entry store");
    Ok(Arc::new(store))
}
