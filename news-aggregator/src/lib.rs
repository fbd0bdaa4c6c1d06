pub mod types;
pub mod traits;
pub mod config;
pub mod parser;
pub mod normalizer;
pub mod fetcher;
pub mod aggregator;
pub mod storage;
pub mod scheduler;
pub mod api;

pub use types::*;
pub use traits::{EntryStore, FeedSource};
pub use config::AppConfig;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use normalizer::normalize;
pub use aggregator::Aggregator;
pub use storage::{open_store, MemoryStore, PgStore};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use api::{create_router, AppState};
