//! # MarketLink Domain
//!
//! Domain types shared by every MarketLink crate.
//!
//! This crate contains:
//! - The domain error type and `Result` alias
//! - Configuration structures
//! - Session, credential, user, and resource types
//! - Endpoint constants
//!
//! ## Architecture
//! - No dependencies on other MarketLink crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
