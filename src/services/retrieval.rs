use std::sync::Arc;

use super::embedding::{EmbeddingService, SearchResult};
use crate::error::AppResult;
use crate::types::PreferenceProfile;

pub struct RetrievalService {
    embedding: Arc<EmbeddingService>,
}

impl RetrievalService {
    pub fn new(embedding: Arc<EmbeddingService>) -> Self {
        Self { embedding }
    }

    /// Returns the `k` listings nearest to the buyer's flattened
    /// preference string, nearest-first.
    pub async fn retrieve(
        &self,
        profile: &PreferenceProfile,
        k: usize,
    ) -> AppResult<Vec<SearchResult>> {
        self.embedding.search(&profile.flattened(), k).await
    }
}
