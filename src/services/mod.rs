mod embedding;
mod generator;
mod llm;
mod personalizer;
mod retrieval;

pub use embedding::{EmbeddingService, SearchResult, StoreMode};
pub use generator::{ListingCategory, ListingGenerator};
pub use llm::LlmService;
pub use personalizer::PersonalizationService;
pub use retrieval::RetrievalService;
