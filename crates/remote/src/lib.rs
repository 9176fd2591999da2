//! Remote data service contract and adapters.
//!
//! - [`RemoteDataPort`]: one async method per remote operation.
//! - [`HttpRemote`]: JSON-over-HTTP adapter built on [`reqwest`].
//! - [`InMemoryRemote`]: process-local service used by tests and local
//!   development, with single-step undo per key.

pub mod error;
pub mod http;
pub mod memory;
pub mod operation;
pub mod port;

pub use error::{RemoteError, RemoteResult};
pub use http::HttpRemote;
pub use memory::InMemoryRemote;
pub use operation::Operation;
pub use port::RemoteDataPort;
