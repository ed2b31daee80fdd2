//! Structured listing generation.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::types::Listing;

use super::llm::LlmService;

const SCHEMA_NAME: &str = "house_listing";

/// The four catalog segments, generated in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingCategory {
    Standard,
    Budget,
    Luxury,
    Suburban,
}

impl ListingCategory {
    pub const ALL: [ListingCategory; 4] = [
        ListingCategory::Standard,
        ListingCategory::Budget,
        ListingCategory::Luxury,
        ListingCategory::Suburban,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ListingCategory::Standard => "standard",
            ListingCategory::Budget => "budget",
            ListingCategory::Luxury => "luxury",
            ListingCategory::Suburban => "suburban",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            ListingCategory::Standard => {
                "Randomly generate a realtor post of a house in the market. \
                 Respond in JSON format."
            }
            ListingCategory::Budget => {
                "Randomly generate a realtor post of a budget friendly house in \
                 the market. Respond in JSON format."
            }
            ListingCategory::Luxury => {
                "Randomly generate a realtor post of a luxury house in the \
                 market. Respond in JSON format."
            }
            ListingCategory::Suburban => {
                "Randomly generate a realtor post of a house in a suburban \
                 city. Respond in JSON format."
            }
        }
    }
}

pub struct ListingGenerator {
    llm: Arc<LlmService>,
}

impl ListingGenerator {
    pub fn new(llm: Arc<LlmService>) -> Self {
        Self { llm }
    }

    /// Generates one listing for `category` and decodes it against the
    /// declared schema. No retry, no repair: a malformed response fails
    /// the call.
    pub async fn generate_one(
        &self,
        provider: &ProviderConfig,
        category: ListingCategory,
    ) -> AppResult<Listing> {
        let response = self
            .llm
            .generate_structured_json(
                provider,
                category.instruction(),
                SCHEMA_NAME,
                listing_schema(),
            )
            .await?;

        decode_listing(&response)
    }

    /// Generates the full catalog: `per_category` listings for each of the
    /// four categories, in category order. Near-identical outputs are
    /// accepted as-is; any failed call aborts the run.
    pub async fn generate_catalog(
        &self,
        provider: &ProviderConfig,
        per_category: usize,
    ) -> AppResult<Vec<Listing>> {
        let mut listings = Vec::with_capacity(ListingCategory::ALL.len() * per_category);
        for category in ListingCategory::ALL {
            for _ in 0..per_category {
                let listing = self.generate_one(provider, category).await?;
                info!(
                    category = category.label(),
                    neighborhood = %listing.neighborhood,
                    "generated listing"
                );
                listings.push(listing);
            }
        }
        Ok(listings)
    }
}

/// Decodes a structured completion into a [`Listing`], rejecting responses
/// that drop or blank out any of the seven fields.
fn decode_listing(raw: &str) -> AppResult<Listing> {
    let listing: Listing = serde_json::from_str(raw)
        .map_err(|e| AppError::SchemaViolation(format!("listing decode failed: {e}")))?;

    let missing = listing.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::SchemaViolation(format!(
            "listing has empty fields: {}",
            missing.join(", ")
        )));
    }

    Ok(listing)
}

fn listing_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "Neighborhood": {
                "type": "string",
                "description": "The name of the house neighborhood."
            },
            "Price": {
                "type": "string",
                "description": "The price of the house."
            },
            "Bedrooms": {
                "type": "string",
                "description": "The number of bedrooms."
            },
            "Bathrooms": {
                "type": "string",
                "description": "The number of bathrooms."
            },
            "HouseSize": {
                "type": "string",
                "description": "The size of the house in sqft."
            },
            "Description": {
                "type": "string",
                "description": "Realtor description of the house. Include some property amenities details such as backyard, garage."
            },
            "NeighborhoodDescription": {
                "type": "string",
                "description": "Realtor description of the neighborhood. Include the transportation, school, urban/suburban, city, etc."
            }
        },
        "required": [
            "Neighborhood",
            "Price",
            "Bedrooms",
            "Bathrooms",
            "HouseSize",
            "Description",
            "NeighborhoodDescription"
        ],
        "additionalProperties": false
    })
}
