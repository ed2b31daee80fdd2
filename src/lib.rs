//! Batch pipeline that generates synthetic real-estate listings with a
//! language model, indexes them in a local vector store, and rewrites the
//! best matches for a buyer's stated preferences.

pub mod config;
pub mod error;
pub mod export;
pub mod services;
pub mod types;
