//! Unified error handling for the client.

use crate::config::ConfigError;
use crate::remote::RemoteError;
use crate::sync::SyncError;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for client setup and command runs.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_sync_errors() {
        let err: Error = SyncError::PendingChanges(3).into();
        assert_eq!(
            err.to_string(),
            "Sync error: 3 reviews have unsynced local changes"
        );
    }

    #[test]
    fn question_mark_lifts_layer_errors() {
        fn run_pass() -> Result<()> {
            Err::<(), _>(SyncError::AlreadyRunning)?;
            Ok(())
        }
        fn connect() -> Result<()> {
            Err::<(), _>(RemoteError::Unauthorized)?;
            Ok(())
        }

        assert!(matches!(run_pass(), Err(Error::Sync(SyncError::AlreadyRunning))));
        assert!(matches!(connect(), Err(Error::Remote(RemoteError::Unauthorized))));
    }

    #[test]
    fn wraps_config_errors() {
        let err: Error = ConfigError::MissingRemoteBaseUrl.into();
        assert!(err.to_string().contains("REMOTE_BASE_URL"));
    }
}
