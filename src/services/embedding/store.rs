//! LanceDB storage operations.

use std::cmp::Ordering;
use std::sync::Arc;

use arrow_array::builder::{FixedSizeListBuilder, Float32Builder};
use arrow_array::{Float32Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use futures_util::TryStreamExt;
use lancedb::arrow::SendableRecordBatchStream;
use lancedb::{connect, Error as LanceError, Table};

use super::{
    COLUMN_DISTANCE, COLUMN_DOCUMENT, COLUMN_EMBEDDING_MODEL, COLUMN_LISTING_ID,
    COLUMN_NEIGHBORHOOD, COLUMN_PRICE, COLUMN_ROW_INDEX, COLUMN_VECTOR,
};
use crate::config::VectorConfig;
use crate::error::{AppError, AppResult, ResultExt};

/// How the caller intends to use the table under the store directory.
/// Declared up front so a rerun never accumulates duplicate rows by
/// accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Drop any existing table and start from an empty one.
    Rebuild,
    /// Open the existing table, creating an empty one if absent.
    Append,
    /// Open the existing table; fail if it has never been built.
    ReadOnly,
}

/// One listing row as stored in LanceDB.
#[derive(Debug, Clone)]
pub struct ListingRow {
    pub listing_id: String,
    pub row_index: i32,
    pub neighborhood: String,
    pub price: String,
    pub embedding_model: String,
    pub document: String,
    pub vector: Vec<f32>,
}

/// One retrieval hit. `distance` is the store's cosine distance to the
/// query; results are ordered nearest-first.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub listing_id: String,
    pub row_index: i32,
    pub neighborhood: String,
    pub price: String,
    pub document: String,
    pub distance: f64,
}

pub fn build_schema(config: &VectorConfig) -> AppResult<Arc<Schema>> {
    let dim = i32::try_from(config.vector_size)
        .map_err(|_| AppError::Config("vector_size overflow".to_string()))?;

    let vector = DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dim,
    );

    Ok(Arc::new(Schema::new(vec![
        Field::new(COLUMN_LISTING_ID, DataType::Utf8, false),
        Field::new(COLUMN_ROW_INDEX, DataType::Int32, false),
        Field::new(COLUMN_NEIGHBORHOOD, DataType::Utf8, false),
        Field::new(COLUMN_PRICE, DataType::Utf8, false),
        Field::new(COLUMN_EMBEDDING_MODEL, DataType::Utf8, false),
        Field::new(COLUMN_DOCUMENT, DataType::Utf8, false),
        Field::new(COLUMN_VECTOR, vector, true),
    ])))
}

pub async fn open_table(
    config: &VectorConfig,
    schema: Arc<Schema>,
    mode: StoreMode,
) -> AppResult<Table> {
    let db = connect(&config.store_path)
        .execute()
        .await
        .store_err("store connect failed")?;

    match mode {
        StoreMode::Rebuild => {
            match db.drop_table(&config.table_name, &[]).await {
                Ok(()) | Err(LanceError::TableNotFound { .. }) => {}
                Err(err) => return Err(AppError::Store(format!("drop table failed: {err}"))),
            }
            db.create_empty_table(&config.table_name, schema)
                .execute()
                .await
                .store_err("create table failed")
        }
        StoreMode::Append => match db.open_table(&config.table_name).execute().await {
            Ok(table) => Ok(table),
            Err(LanceError::TableNotFound { .. }) => db
                .create_empty_table(&config.table_name, schema)
                .execute()
                .await
                .store_err("create table failed"),
            Err(err) => Err(AppError::Store(format!("open table failed: {err}"))),
        },
        StoreMode::ReadOnly => db
            .open_table(&config.table_name)
            .execute()
            .await
            .store_err("open table failed"),
    }
}

pub fn build_record_batch(schema: Arc<Schema>, rows: &[ListingRow]) -> AppResult<RecordBatch> {
    let listing_ids =
        StringArray::from_iter_values(rows.iter().map(|row| row.listing_id.as_str()));
    let row_indices = Int32Array::from_iter_values(rows.iter().map(|row| row.row_index));
    let neighborhoods =
        StringArray::from_iter_values(rows.iter().map(|row| row.neighborhood.as_str()));
    let prices = StringArray::from_iter_values(rows.iter().map(|row| row.price.as_str()));
    let embedding_models =
        StringArray::from_iter_values(rows.iter().map(|row| row.embedding_model.as_str()));
    let documents = StringArray::from_iter_values(rows.iter().map(|row| row.document.as_str()));

    let dim = match schema.field_with_name(COLUMN_VECTOR)?.data_type() {
        DataType::FixedSizeList(_, size) => *size as usize,
        _ => {
            return Err(AppError::Store(
                "vector column is not a fixed size list".to_string(),
            ))
        }
    };
    let vectors = build_vector_column(rows, dim)?;

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(listing_ids),
            Arc::new(row_indices),
            Arc::new(neighborhoods),
            Arc::new(prices),
            Arc::new(embedding_models),
            Arc::new(documents),
            Arc::new(vectors),
        ],
    )?)
}

fn build_vector_column(
    rows: &[ListingRow],
    dim: usize,
) -> AppResult<arrow_array::FixedSizeListArray> {
    let mut builder = FixedSizeListBuilder::with_capacity(
        Float32Builder::with_capacity(rows.len() * dim),
        dim as i32,
        rows.len(),
    );

    for row in rows {
        if row.vector.len() != dim {
            return Err(AppError::Embedding(format!(
                "embedding vector size mismatch: expected {dim}, got {}",
                row.vector.len()
            )));
        }
        builder.values().append_slice(&row.vector);
        builder.append(true);
    }

    Ok(builder.finish())
}

pub async fn collect_search_results(
    mut stream: SendableRecordBatchStream,
) -> AppResult<Vec<SearchResult>> {
    let mut results = Vec::new();

    while let Some(batch) = stream
        .try_next()
        .await
        .store_err("read search results failed")?
    {
        if batch.num_rows() == 0 {
            continue;
        }

        let listing_ids = string_column(&batch, COLUMN_LISTING_ID)?;
        let row_indices = batch
            .column_by_name(COLUMN_ROW_INDEX)
            .ok_or_else(|| AppError::Store("search result missing row_index".to_string()))?
            .as_any()
            .downcast_ref::<Int32Array>()
            .ok_or_else(|| AppError::Store("row_index column type mismatch".to_string()))?;
        let neighborhoods = string_column(&batch, COLUMN_NEIGHBORHOOD)?;
        let prices = string_column(&batch, COLUMN_PRICE)?;
        let documents = string_column(&batch, COLUMN_DOCUMENT)?;

        let distances = match batch.column_by_name(COLUMN_DISTANCE) {
            Some(column) => column
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| AppError::Store("distance column type mismatch".to_string()))?
                .iter()
                .map(|value| value.unwrap_or(f32::MAX) as f64)
                .collect::<Vec<f64>>(),
            None => vec![0.0; batch.num_rows()],
        };

        for row_idx in 0..batch.num_rows() {
            results.push(SearchResult {
                listing_id: listing_ids.value(row_idx).to_string(),
                row_index: row_indices.value(row_idx),
                neighborhood: neighborhoods.value(row_idx).to_string(),
                price: prices.value(row_idx).to_string(),
                document: documents.value(row_idx).to_string(),
                distance: distances.get(row_idx).copied().unwrap_or(f64::MAX),
            });
        }
    }

    results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    Ok(results)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AppError::Store(format!("search result missing {name}")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AppError::Store(format!("{name} column type mismatch")))
}

#[cfg(test)]
mod tests {
    use arrow_array::RecordBatchIterator;
    use lancedb::query::{ExecutableQuery, QueryBase};
    use lancedb::DistanceType;
    use tempfile::tempdir;

    use super::*;

    fn test_config(path: &std::path::Path) -> VectorConfig {
        VectorConfig {
            store_path: path.to_string_lossy().to_string(),
            table_name: "listings".to_string(),
            embedding_model: "test-model".to_string(),
            vector_size: 4,
        }
    }

    fn row(index: i32, neighborhood: &str, price: &str, vector: [f32; 4]) -> ListingRow {
        ListingRow {
            listing_id: format!("listing-{index}"),
            row_index: index,
            neighborhood: neighborhood.to_string(),
            price: price.to_string(),
            embedding_model: "test-model".to_string(),
            document: format!("Neighborhood: {neighborhood}\nPrice: {price}"),
            vector: vector.to_vec(),
        }
    }

    async fn insert(table: &Table, schema: Arc<Schema>, rows: &[ListingRow]) {
        let batch = build_record_batch(schema.clone(), rows).unwrap();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table.add(batches).execute().await.unwrap();
    }

    async fn search(table: &Table, vector: Vec<f32>, k: usize) -> Vec<SearchResult> {
        let stream = table
            .query()
            .nearest_to(vector)
            .unwrap()
            .column(COLUMN_VECTOR)
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .unwrap();
        collect_search_results(stream).await.unwrap()
    }

    #[test]
    fn schema_declares_vector_dimensionality_from_config() {
        let dir = tempdir().unwrap();
        let schema = build_schema(&test_config(dir.path())).unwrap();

        assert_eq!(schema.fields().len(), 7);
        match schema.field_with_name(COLUMN_VECTOR).unwrap().data_type() {
            DataType::FixedSizeList(_, size) => assert_eq!(*size, 4),
            other => panic!("unexpected vector type: {other}"),
        }
    }

    #[test]
    fn record_batch_rejects_mismatched_vector_size() {
        let dir = tempdir().unwrap();
        let schema = build_schema(&test_config(dir.path())).unwrap();
        let mut bad = row(0, "Sunnyvale", "$250,000", [1.0, 0.0, 0.0, 0.0]);
        bad.vector = vec![1.0, 0.0];

        let err = build_record_batch(schema, &[bad]).unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn rebuild_replaces_existing_rows() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();

        let table = open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();
        insert(
            &table,
            schema.clone(),
            &[
                row(0, "Sunnyvale", "$250,000", [1.0, 0.0, 0.0, 0.0]),
                row(1, "Maplewood", "$450,000", [0.0, 1.0, 0.0, 0.0]),
            ],
        )
        .await;
        assert_eq!(table.count_rows(None).await.unwrap(), 2);

        let rebuilt = open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();
        assert_eq!(rebuilt.count_rows(None).await.unwrap(), 0);

        insert(
            &rebuilt,
            schema,
            &[row(0, "Crestview", "$300,000", [0.0, 0.0, 1.0, 0.0])],
        )
        .await;
        assert_eq!(rebuilt.count_rows(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn append_keeps_existing_rows() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();

        let table = open_table(&config, schema.clone(), StoreMode::Append)
            .await
            .unwrap();
        insert(
            &table,
            schema.clone(),
            &[row(0, "Sunnyvale", "$250,000", [1.0, 0.0, 0.0, 0.0])],
        )
        .await;

        let reopened = open_table(&config, schema.clone(), StoreMode::Append)
            .await
            .unwrap();
        insert(
            &reopened,
            schema,
            &[row(1, "Maplewood", "$450,000", [0.0, 1.0, 0.0, 0.0])],
        )
        .await;

        assert_eq!(reopened.count_rows(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn read_only_requires_a_built_table() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();

        let err = open_table(&config, schema.clone(), StoreMode::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));

        open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();
        open_table(&config, schema, StoreMode::ReadOnly)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn search_returns_k_rows_nearest_first() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();
        let table = open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();

        insert(
            &table,
            schema,
            &[
                row(0, "Sunnyvale", "$250,000", [1.0, 0.0, 0.0, 0.0]),
                row(1, "Maplewood", "$450,000", [0.8, 0.6, 0.0, 0.0]),
                row(2, "Crestview", "$300,000", [0.0, 1.0, 0.0, 0.0]),
            ],
        )
        .await;

        let hits = search(&table, vec![1.0, 0.0, 0.0, 0.0], 2).await;

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].neighborhood, "Sunnyvale");
        assert_eq!(hits[1].neighborhood, "Maplewood");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[tokio::test]
    async fn oversized_k_degrades_to_all_rows() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();
        let table = open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();

        insert(
            &table,
            schema,
            &[
                row(0, "Sunnyvale", "$250,000", [1.0, 0.0, 0.0, 0.0]),
                row(1, "Maplewood", "$450,000", [0.0, 1.0, 0.0, 0.0]),
            ],
        )
        .await;

        let hits = search(&table, vec![1.0, 0.0, 0.0, 0.0], 10).await;
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn reopened_store_answers_with_the_same_ordering() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();
        let query = vec![0.7, 0.7, 0.1, 0.0];

        let table = open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();
        insert(
            &table,
            schema.clone(),
            &[
                row(0, "Sunnyvale", "$250,000", [1.0, 0.0, 0.0, 0.0]),
                row(1, "Maplewood", "$450,000", [0.7, 0.7, 0.0, 0.0]),
                row(2, "Crestview", "$300,000", [0.0, 0.0, 1.0, 0.0]),
            ],
        )
        .await;
        let first: Vec<String> = search(&table, query.clone(), 3)
            .await
            .into_iter()
            .map(|hit| hit.listing_id)
            .collect();

        let reopened = open_table(&config, schema, StoreMode::ReadOnly)
            .await
            .unwrap();
        let second: Vec<String> = search(&reopened, query, 3)
            .await
            .into_iter()
            .map(|hit| hit.listing_id)
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn preference_query_returns_every_indexed_neighborhood() {
        // Store-level version of the Sunnyvale/Maplewood scenario: three
        // listings, one query, all three come back with their metadata.
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let schema = build_schema(&config).unwrap();
        let table = open_table(&config, schema.clone(), StoreMode::Rebuild)
            .await
            .unwrap();

        insert(
            &table,
            schema,
            &[
                row(0, "Sunnyvale", "$250,000", [0.9, 0.1, 0.0, 0.0]),
                row(1, "Maplewood", "$450,000", [0.5, 0.5, 0.0, 0.0]),
                row(2, "Maplewood", "$250,000", [0.1, 0.9, 0.0, 0.0]),
            ],
        )
        .await;

        let hits = search(&table, vec![0.6, 0.4, 0.0, 0.0], 3).await;

        assert_eq!(hits.len(), 3);
        let mut neighborhoods: Vec<&str> =
            hits.iter().map(|hit| hit.neighborhood.as_str()).collect();
        neighborhoods.sort_unstable();
        assert_eq!(neighborhoods, vec!["Maplewood", "Maplewood", "Sunnyvale"]);
        for hit in &hits {
            assert!(hit.document.contains(&hit.neighborhood));
            assert!(hit.document.contains(&hit.price));
        }
    }
}
