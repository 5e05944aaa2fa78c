//! Core business logic for edumatch.
//!
//! - [`tags`]: canonical tag sets, normalized at the boundary
//! - [`scoring`]: ranks catalog activities against a student's tags
//! - [`access`]: actor resolution and ownership checks
//! - [`services`]: the operations the HTTP layer exposes

pub mod access;
pub mod scoring;
pub mod services;
pub mod tags;

pub use access::{can_act, Access, Actor, OwnedResource, OwnershipGuard};
pub use scoring::{rank, ActivityMatch, CatalogEntry, LearnerProfile, TAG_MATCH_WEIGHT};
pub use services::*;
pub use tags::TagSet;
