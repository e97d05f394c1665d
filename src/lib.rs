//! Ziftr Mining Client
//!
//! A multi-threaded CPU mining client for the ZiftrCOIN proof-of-work
//! algorithm:
//! - Chained five-primitive digest pipeline (Keccak, BLAKE, Groestl, JH, Skein)
//! - Input-dependent transform ordering from a fixed 24-row permutation table
//! - Proof-of-kernel header patching between the two digest passes
//! - Cooperative cancellation with per-nonce granularity

pub mod config;
pub mod crypto;
pub mod error;
pub mod types;
pub mod utils;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Application information
pub const APP_NAME: &str = "ziftr-mining-client";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
