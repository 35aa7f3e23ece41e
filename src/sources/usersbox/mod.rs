//! Usersbox Source
//!
//! Results are grouped by the leak they came from:
//! `data.items: [{source: {database, collection}, hits: {items: [...]}}]`.
//! This is the only source that produces a per-group breakdown.
//!
//! # Coverage
//!
//! - **Fields:** any (free-text query)
//! - **Auth:** `Authorization` header
//! - **Shape:** grouped by source

mod adapter;
mod normalize;

pub use adapter::UsersboxAdapter;
pub use normalize::{normalize, normalize_groups};
