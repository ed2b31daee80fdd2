use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use homematch::config::AppConfig;
use homematch::error::AppResult;
use homematch::export::{read_listings, write_listings};
use homematch::services::{
    EmbeddingService, ListingGenerator, LlmService, PersonalizationService, RetrievalService,
    StoreMode,
};
use homematch::types::PreferenceProfile;

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let llm = Arc::new(LlmService::new());

    // Generate the listing catalog.
    let generator = ListingGenerator::new(llm.clone());
    let listings = generator
        .generate_catalog(&config.provider, config.listings_per_category)
        .await?;
    info!(count = listings.len(), "catalog generated");

    // Export to CSV, replacing any previous run.
    write_listings(&config.listings_path, &listings)?;
    info!(path = %config.listings_path, "catalog exported");

    // Reload the CSV and build the vector index from scratch.
    let catalog = read_listings(&config.listings_path)?;
    let indexer = EmbeddingService::new(config.vector.clone(), StoreMode::Rebuild).await?;
    let indexed = indexer.index_listings(&catalog).await?;
    info!(rows = indexed, "index built");
    drop(indexer);

    // Reopen the persisted store and retrieve matches for the buyer.
    let store = Arc::new(EmbeddingService::new(config.vector.clone(), StoreMode::ReadOnly).await?);
    let retrieval = RetrievalService::new(store);
    let profile = PreferenceProfile::sample_buyer();
    let matches = retrieval.retrieve(&profile, config.top_k).await?;

    println!("Top {} properties based on the user preferences:", matches.len());
    for hit in &matches {
        println!("{}\n", hit.document);
    }

    // Rewrite each retrieved listing around the buyer's preferences.
    let personalizer = PersonalizationService::new(llm);
    for (idx, hit) in matches.iter().enumerate() {
        let pitch = personalizer
            .personalize(&config.provider, &hit.document, &profile)
            .await?;
        println!("{}. {}\n", idx + 1, pitch);
    }

    Ok(())
}
