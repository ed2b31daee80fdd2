//! EmbeddingService - embedding and nearest-neighbor retrieval

use std::sync::Arc;

use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::store::{
    build_record_batch, build_schema, collect_search_results, open_table, ListingRow,
    SearchResult, StoreMode,
};
use super::COLUMN_VECTOR;
use crate::config::VectorConfig;
use crate::error::{AppError, AppResult, ResultExt};
use crate::types::Listing;

pub struct EmbeddingService {
    model: Mutex<TextEmbedding>,
    table: Table,
    schema: Arc<Schema>,
    config: VectorConfig,
}

impl EmbeddingService {
    /// Loads the local embedding model and opens the table under
    /// `config.store_path` with the declared lifecycle `mode`.
    pub async fn new(config: VectorConfig, mode: StoreMode) -> AppResult<Self> {
        let model_name: EmbeddingModel = config
            .embedding_model
            .parse::<EmbeddingModel>()
            .config_err("invalid embedding model")?;
        let model = TextEmbedding::try_new(TextInitOptions::new(model_name))
            .embedding_err("embedding model init failed")?;

        let schema = build_schema(&config)?;
        let table = open_table(&config, schema.clone(), mode).await?;

        Ok(Self {
            model: Mutex::new(model),
            table,
            schema,
            config,
        })
    }

    pub fn config(&self) -> &VectorConfig {
        &self.config
    }

    /// Embeds every listing's document and appends one row per listing, in
    /// catalog order. Returns the number of rows inserted.
    pub async fn index_listings(&self, listings: &[Listing]) -> AppResult<usize> {
        if listings.is_empty() {
            return Ok(0);
        }

        let documents: Vec<String> = listings.iter().map(Listing::document).collect();
        let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
        let vectors = {
            let mut model = self.model.lock().await;
            model.embed(texts, None)
        }
        .embedding_err("listing embedding failed")?;

        if vectors.len() != listings.len() {
            return Err(AppError::Embedding(
                "embedding result count mismatch".to_string(),
            ));
        }

        let rows: Vec<ListingRow> = listings
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(idx, (listing, vector))| ListingRow {
                listing_id: Uuid::new_v4().to_string(),
                row_index: idx as i32,
                neighborhood: listing.neighborhood.clone(),
                price: listing.price.clone(),
                embedding_model: self.config.embedding_model.clone(),
                document: documents[idx].clone(),
                vector,
            })
            .collect();

        let batch = build_record_batch(self.schema.clone(), &rows)?;
        let batches = RecordBatchIterator::new(vec![Ok(batch)], self.schema.clone());
        self.table
            .add(batches)
            .execute()
            .await
            .store_err("insert rows failed")?;

        info!(
            rows = rows.len(),
            table = %self.config.table_name,
            "indexed listings"
        );
        Ok(rows.len())
    }

    /// Embeds `query` and returns up to `k` rows, nearest-first by cosine
    /// distance. A `k` larger than the table degrades to every row.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<SearchResult>> {
        let vector = self.embed_query(query).await?;

        let stream = self
            .table
            .query()
            .nearest_to(vector)
            .store_err("nearest-neighbor query failed")?
            .column(COLUMN_VECTOR)
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .store_err("search execution failed")?;

        collect_search_results(stream).await
    }

    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Embedding("query text is empty".to_string()));
        }

        let vectors = {
            let mut model = self.model.lock().await;
            model.embed(vec![text], None)
        }
        .embedding_err("query embedding failed")?;

        vectors
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("query embedding missing".to_string()))
    }
}
