//! Pending-change markers for review and photo rows.
//!
//! Every row in the local store carries an [`UpdateStatus`]. Local mutations
//! move a row from [`UpdateStatus::Synced`] to one of the pending variants;
//! only a fully successful sync pass moves it back. The marker is idempotent:
//! editing a row twice before a sync leaves one pending change, not two.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sync state of a single row.
///
/// Persisted as an integer code (`0..=3`) so that pending rows can be found
/// with a plain `update_status > 0` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateStatus {
    /// Matches the last known server state
    #[default]
    Synced,
    /// Created locally, needs upload
    PendingAdd,
    /// Edited locally, needs push
    PendingUpdate,
    /// Marked for removal locally, needs remote delete
    PendingDelete,
}

impl UpdateStatus {
    /// Storage code for this status.
    pub const fn code(self) -> i64 {
        match self {
            UpdateStatus::Synced => 0,
            UpdateStatus::PendingAdd => 1,
            UpdateStatus::PendingUpdate => 2,
            UpdateStatus::PendingDelete => 3,
        }
    }

    /// Decode a storage code.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(UpdateStatus::Synced),
            1 => Ok(UpdateStatus::PendingAdd),
            2 => Ok(UpdateStatus::PendingUpdate),
            3 => Ok(UpdateStatus::PendingDelete),
            other => Err(Error::UnknownStatus(other)),
        }
    }

    /// Whether the row carries a local change the server has not confirmed.
    pub fn is_pending(self) -> bool {
        self != UpdateStatus::Synced
    }

    /// Whether the row is marked for removal.
    pub fn is_pending_delete(self) -> bool {
        self == UpdateStatus::PendingDelete
    }
}

impl TryFrom<i64> for UpdateStatus {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Self::from_code(code)
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStatus::Synced => write!(f, "synced"),
            UpdateStatus::PendingAdd => write!(f, "pending-add"),
            UpdateStatus::PendingUpdate => write!(f, "pending-update"),
            UpdateStatus::PendingDelete => write!(f, "pending-delete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(UpdateStatus::Synced.code(), 0);
        assert_eq!(UpdateStatus::PendingAdd.code(), 1);
        assert_eq!(UpdateStatus::PendingUpdate.code(), 2);
        assert_eq!(UpdateStatus::PendingDelete.code(), 3);
    }

    #[test]
    fn decode_known_codes() {
        for status in [
            UpdateStatus::Synced,
            UpdateStatus::PendingAdd,
            UpdateStatus::PendingUpdate,
            UpdateStatus::PendingDelete,
        ] {
            assert_eq!(UpdateStatus::from_code(status.code()), Ok(status));
        }
    }

    #[test]
    fn decode_unknown_code() {
        assert_eq!(UpdateStatus::from_code(4), Err(Error::UnknownStatus(4)));
        assert_eq!(UpdateStatus::try_from(-1), Err(Error::UnknownStatus(-1)));
    }

    #[test]
    fn pending_predicate() {
        assert!(!UpdateStatus::Synced.is_pending());
        assert!(UpdateStatus::PendingAdd.is_pending());
        assert!(UpdateStatus::PendingUpdate.is_pending());
        assert!(UpdateStatus::PendingDelete.is_pending());

        assert!(UpdateStatus::PendingDelete.is_pending_delete());
        assert!(!UpdateStatus::PendingUpdate.is_pending_delete());
    }

    #[test]
    fn default_is_synced() {
        assert_eq!(UpdateStatus::default(), UpdateStatus::Synced);
    }

    #[test]
    fn display() {
        assert_eq!(UpdateStatus::PendingUpdate.to_string(), "pending-update");
    }
}
