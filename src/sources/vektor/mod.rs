//! Vektor Source
//!
//! # Coverage
//!
//! - **Fields:** phone, email, inn, snils, social handles (as `username`)
//! - **Auth:** bearer token
//! - **Shape:** flat array, optionally under `result` or `data`
//! - **Quirk:** answers 404 when nothing matches

mod adapter;
mod normalize;

pub use adapter::VektorAdapter;
pub use normalize::normalize;
