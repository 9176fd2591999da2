//! Headless IEMS client: restores the session, resolves the start route
//! through the auth gate and follows the dashboard's live data.

pub mod app;
pub mod config;
