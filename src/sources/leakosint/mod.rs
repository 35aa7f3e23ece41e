//! LeakOsint Source
//!
//! Answers with `List: {database: {InfoLeak, Data: [...]}}`. Databases with
//! nothing to report are still listed, carrying a "no results" phrase either
//! as their key or as their `InfoLeak` text.
//!
//! # Coverage
//!
//! - **Fields:** any (free-text query)
//! - **Auth:** token in the JSON body
//! - **Shape:** nested list-of-lists

mod adapter;
mod normalize;

pub use adapter::LeakOsintAdapter;
pub use normalize::normalize;
