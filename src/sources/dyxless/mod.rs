//! Dyxless Source
//!
//! Returns a flat `data` array of loosely-typed objects, each naming the leak
//! it came from in a `source` member.
//!
//! # Coverage
//!
//! - **Fields:** any (free-text query)
//! - **Auth:** token in the JSON body
//! - **Shape:** flat array
//! - **Quirk:** intermittently serves HTML error pages with status 200

mod adapter;
mod normalize;

pub use adapter::DyxlessAdapter;
pub use normalize::normalize;
