//! Embedding and vector-store service for listing retrieval.
//!
//! Split into submodules:
//! - `model`: EmbeddingService struct, indexing and search
//! - `store`: LanceDB table lifecycle and Arrow row handling

mod model;
mod store;

pub use model::EmbeddingService;
pub use store::{SearchResult, StoreMode};

// Column name constants (used by both model and store)
pub(crate) const COLUMN_LISTING_ID: &str = "listing_id";
pub(crate) const COLUMN_ROW_INDEX: &str = "row_index";
pub(crate) const COLUMN_NEIGHBORHOOD: &str = "neighborhood";
pub(crate) const COLUMN_PRICE: &str = "price";
pub(crate) const COLUMN_EMBEDDING_MODEL: &str = "embedding_model";
pub(crate) const COLUMN_DOCUMENT: &str = "document";
pub(crate) const COLUMN_VECTOR: &str = "vector";
pub(crate) const COLUMN_DISTANCE: &str = "_distance";
