pub mod events;
pub mod sessions;

use std::sync::Arc;
use storage::{EventLog, StorageError};

use crate::ApiError;

/// Run a log read on the blocking pool; CSV reads touch the disk.
pub(crate) async fn read_log<T, F>(event_log: &Arc<dyn EventLog>, read: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn EventLog) -> Result<T, StorageError> + Send + 'static,
{
    let event_log = Arc::clone(event_log);
    let rows = tokio::task::spawn_blocking(move || read(event_log.as_ref())).await??;
    Ok(rows)
}
