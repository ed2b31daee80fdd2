//! Preference-aware rewriting of retrieved listings.

use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::AppResult;
use crate::types::PreferenceProfile;

use super::llm::LlmService;

pub struct PersonalizationService {
    llm: Arc<LlmService>,
}

impl PersonalizationService {
    pub fn new(llm: Arc<LlmService>) -> Self {
        Self { llm }
    }

    /// Rewrites one retrieved listing as a single paragraph that leans
    /// into the buyer's stated preferences. Best-effort: the model is
    /// instructed not to alter facts, but the output is not validated.
    pub async fn personalize(
        &self,
        provider: &ProviderConfig,
        listing_document: &str,
        profile: &PreferenceProfile,
    ) -> AppResult<String> {
        let prompt = build_personalization_prompt(listing_document, &profile.flattened());
        self.llm.generate_text(provider, &prompt).await
    }
}

fn build_personalization_prompt(listing: &str, preferences: &str) -> String {
    let lines = [
        "You are an assistant that generates tailored descriptions and \
         recommendations for home buyers."
            .to_string(),
        "Tailor the description from the property listing to resonate with \
         the buyer's specific preferences, subtly emphasizing aspects of \
         the property that align with what the buyer is looking for."
            .to_string(),
        "Enhance the appeal of the listing without altering any factual \
         information."
            .to_string(),
        "Write the description in a single paragraph.".to_string(),
        String::new(),
        format!("Property listing: {listing}"),
        String::new(),
        format!("Buyer preference: {preferences}"),
    ];

    lines.join("\n")
}
