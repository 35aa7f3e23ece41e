//! ITP Source
//!
//! Answers with a map keyed by leaked database name, each holding a `data`
//! array of records whose keys are transliterated Russian column names.
//!
//! # Coverage
//!
//! - **Fields:** phone, email, inn, snils, social handles (as `username`)
//! - **Auth:** `x-api-key` header
//! - **Shape:** database-keyed map

mod adapter;
mod normalize;

pub use adapter::ItpAdapter;
pub use normalize::normalize;
