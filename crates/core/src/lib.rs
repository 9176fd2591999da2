//! Domain model for the IEMS school management client.
//!
//! Holds the record types exchanged with the remote data service, the
//! route table, and the pure auth-gate decision. Nothing in this crate
//! performs I/O; the sync layer feeds it already-resolved inputs.

pub mod attendance;
pub mod auth_gate;
pub mod error;
pub mod fee;
pub mod homework;
pub mod message;
pub mod profile;
pub mod roles;
pub mod routes;
pub mod stats;
pub mod types;
