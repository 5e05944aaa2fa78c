//! Common utilities and shared types for edumatch.
//!
//! This crate provides foundational components used across all edumatch crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Cache**: Redis-backed JSON cache for read-mostly listings via [`JsonCache`]
//!
//! # Example
//!
//! ```no_run
//! use edumatch_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on {}:{} (next id {id})", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod id;

pub use cache::JsonCache;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
