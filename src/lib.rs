// Coffer: library root
//
// Vault store, token codec and auth gates, with the HTTP gateway, CLI and
// ambient configuration around them.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod retry;
pub mod store;
pub mod token;

pub use error::{CofferError, Result};
