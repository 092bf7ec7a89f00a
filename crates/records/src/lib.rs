//! Student record store implementations for CampusDesk.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryRecords;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecords;

use campusdesk_config::AppConfig;
use campusdesk_core::error::RecordError;
use campusdesk_core::records::RecordStore;
use std::sync::Arc;

/// Build the record store selected by `records.backend`.
pub async fn build_from_config(config: &AppConfig) -> Result<Arc<dyn RecordStore>, RecordError> {
    match config.records.backend.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = std::path::Path::new(&config.records.database_path);
            Ok(Arc::new(SqliteRecords::open(path).await?))
        }
        "memory" => {
            tracing::warn!("Using an empty in-memory record store; no student will be found");
            Ok(Arc::new(InMemoryRecords::new()))
        }
        other => Err(RecordError::Unavailable(format!(
            "records backend '{other}' is not available in this build"
        ))),
    }
}
