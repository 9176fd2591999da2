//! Client-side data synchronization for IEMS.
//!
//! - [`QueryClient`]: typed reads and writes over a
//!   [`RemoteDataPort`](iems_remote::RemoteDataPort), backed by the
//!   process-wide [`QueryCache`].
//! - [`UndoOffer`]: single-use compensating action handed out after an
//!   undoable write.
//! - [`QueryWatch`]: a live view of one query that polls and refetches on
//!   invalidation until dropped.
//! - [`Session`] and [`AuthGate`]: identity lifecycle and the routing
//!   decision for protected views.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod gate;
pub mod key;
pub mod mutations;
pub mod profile_flow;
pub mod queries;
pub mod query;
pub mod session;
pub mod undo;
pub mod watch;

pub use cache::{CacheEvent, Completion, QueryCache, QueryState};
pub use client::QueryClient;
pub use config::{RetryConfig, SyncConfig};
pub use error::SyncError;
pub use feed::NotificationFeed;
pub use gate::{profile_status, AuthGate};
pub use key::{Entity, QueryKey};
pub use query::{Query, QueryPolicy};
pub use session::{
    Identity, IdentityProvider, LoginIntent, PortFactory, Session, StaticIdentityProvider,
};
pub use undo::{UndoOffer, UndoTarget};
pub use watch::QueryWatch;
