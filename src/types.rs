//! Data types shared across the pipeline stages.

use serde::{Deserialize, Serialize};

/// One generated house listing. Every field is model-produced text; the
/// serialized names match the declared generation schema and the CSV
/// header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listing {
    pub neighborhood: String,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub house_size: String,
    pub description: String,
    pub neighborhood_description: String,
}

impl Listing {
    /// Serialized field names in declaration order.
    pub const FIELD_NAMES: [&'static str; 7] = [
        "Neighborhood",
        "Price",
        "Bedrooms",
        "Bathrooms",
        "HouseSize",
        "Description",
        "NeighborhoodDescription",
    ];

    /// Renders the listing as one retrieval document, one "Field: value"
    /// line per field.
    pub fn document(&self) -> String {
        Self::FIELD_NAMES
            .iter()
            .zip(self.field_values())
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Names of fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        Self::FIELD_NAMES
            .iter()
            .zip(self.field_values())
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    fn field_values(&self) -> [&str; 7] {
        [
            &self.neighborhood,
            &self.price,
            &self.bedrooms,
            &self.bathrooms,
            &self.house_size,
            &self.description,
            &self.neighborhood_description,
        ]
    }
}

/// One answered intake question.
#[derive(Debug, Clone)]
pub struct PreferenceEntry {
    pub question: String,
    pub answer: String,
}

/// A buyer's stated preferences, ordered as asked. Immutable once built;
/// retrieval and rendering receive it by reference.
#[derive(Debug, Clone)]
pub struct PreferenceProfile {
    entries: Vec<PreferenceEntry>,
}

impl PreferenceProfile {
    pub fn new(entries: Vec<PreferenceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PreferenceEntry] {
        &self.entries
    }

    /// Joins the answers into the single string used for embedding and
    /// prompt construction.
    pub fn flattened(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.answer.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The fixed buyer profile the pipeline retrieves and personalizes
    /// against.
    pub fn sample_buyer() -> Self {
        let pairs = [
            (
                "How big do you want your house to be?",
                "A comfortable three-bedroom house with a spacious kitchen and a cozy living room.",
            ),
            (
                "What are 3 most important things for you in choosing this property?",
                "A quiet neighborhood, good local schools, and convenient shopping options.",
            ),
            (
                "Which amenities would you like?",
                "A backyard for gardening, a two-car garage, and a modern, energy-efficient heating system.",
            ),
            (
                "Which transportation options are important to you?",
                "Easy access to a reliable bus line, proximity to a major highway, and bike-friendly roads.",
            ),
            (
                "How urban do you want your neighborhood to be?",
                "A balance between suburban tranquility and access to urban amenities like restaurants and theaters.",
            ),
        ];

        Self::new(
            pairs
                .into_iter()
                .map(|(question, answer)| PreferenceEntry {
                    question: question.to_string(),
                    answer: answer.to_string(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            neighborhood: "Sunnyvale".to_string(),
            price: "$250,000".to_string(),
            bedrooms: "3".to_string(),
            bathrooms: "2".to_string(),
            house_size: "1400".to_string(),
            description: "Charming home with a spacious backyard.".to_string(),
            neighborhood_description: "Family-friendly suburban neighborhood.".to_string(),
        }
    }

    #[test]
    fn document_renders_one_line_per_field() {
        let doc = listing().document();
        let lines: Vec<&str> = doc.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Neighborhood: Sunnyvale");
        assert_eq!(lines[1], "Price: $250,000");
        assert_eq!(lines[4], "HouseSize: 1400");
        assert_eq!(
            lines[6],
            "NeighborhoodDescription: Family-friendly suburban neighborhood."
        );
    }

    #[test]
    fn missing_fields_reports_blank_values() {
        let mut incomplete = listing();
        incomplete.price = String::new();
        incomplete.bathrooms = "  ".to_string();

        assert_eq!(incomplete.missing_fields(), vec!["Price", "Bathrooms"]);
        assert!(listing().missing_fields().is_empty());
    }

    #[test]
    fn flattened_profile_joins_answers_in_order() {
        let profile = PreferenceProfile::new(vec![
            PreferenceEntry {
                question: "How big?".to_string(),
                answer: "Three bedrooms.".to_string(),
            },
            PreferenceEntry {
                question: "Which amenities?".to_string(),
                answer: "A backyard.".to_string(),
            },
        ]);

        assert_eq!(profile.flattened(), "Three bedrooms. A backyard.");
    }

    #[test]
    fn sample_buyer_covers_all_intake_questions() {
        let profile = PreferenceProfile::sample_buyer();

        assert_eq!(profile.entries().len(), 5);
        let flattened = profile.flattened();
        assert!(flattened.contains("three-bedroom house"));
        assert!(flattened.contains("bike-friendly roads"));
        assert!(!flattened.contains("How big"));
    }
}
