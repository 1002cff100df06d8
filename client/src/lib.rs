//! # Reviewsync Client
//!
//! Offline-first persistence for product reviews and the engine that
//! replays local changes against the review service.
//!
//! - [`LocalStore`] keeps reviews, photos and attributes in SQLite and marks
//!   every local change as pending.
//! - [`SyncEngine`] scans the pending rows, replays them through a
//!   [`RemoteClient`], and clears the markers once the whole pass succeeded.
//! - [`HttpRemoteClient`] is the production [`RemoteClient`].

pub mod config;
pub mod db;
pub mod error;
pub mod remote;
pub mod store;
pub mod sync;

pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use remote::{AuthToken, HttpRemoteClient, RemoteClient, RemoteError};
pub use store::{LocalStore, PassScan};
pub use sync::{PassState, SyncEngine, SyncError, SyncReport};
