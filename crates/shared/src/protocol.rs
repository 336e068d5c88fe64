use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ProductId;

/// Multipart field the classification endpoint reads the image from.
pub const CLASSIFY_FILE_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Text(String),
    Score(f64),
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Text(text) => f.write_str(text),
            Confidence::Score(score) => write!(f, "{score}%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_type: Option<String>,
    pub breed_name: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed_data: Option<BreedData>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUpdateRequest {
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUpdateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_classification_with_text_confidence() {
        let raw = r#"{
            "success": true,
            "breed_data": {
                "pet_type": "dog",
                "breed_name": "Labrador Retriever",
                "confidence": "95%",
                "description": "Friendly."
            },
            "recommendations": [
                {"id": 4, "name": "Chew toy", "price": 1290, "image": "/static/img/toy.jpg", "url": "/product/4"}
            ],
            "recommendation_title": "Labrador Retriever"
        }"#;
        let response: ClassificationResponse = serde_json::from_str(raw).expect("decode");
        let breed = response.breed_data.expect("breed data");
        assert_eq!(breed.confidence.to_string(), "95%");
        assert_eq!(response.recommendations[0].id, ProductId(4));
        assert!(response.message.is_none());
    }

    #[test]
    fn failure_body_without_payload_fields_decodes() {
        let response: ClassificationResponse =
            serde_json::from_str(r#"{"success": false, "message": "No file."}"#).expect("decode");
        assert!(!response.success);
        assert!(response.breed_data.is_none());
        assert!(response.recommendations.is_empty());
        assert_eq!(response.message.as_deref(), Some("No file."));
    }

    #[test]
    fn numeric_confidence_renders_as_percent() {
        let breed: BreedData = serde_json::from_str(
            r#"{"breed_name": "Siamese", "confidence": 87, "description": ""}"#,
        )
        .expect("decode");
        assert_eq!(breed.confidence.to_string(), "87%");
    }

    #[test]
    fn cart_update_totals_are_optional() {
        let response: CartUpdateResponse =
            serde_json::from_str(r#"{"success": true}"#).expect("decode");
        assert_eq!(response.item_total, None);
        assert_eq!(response.cart_total, None);
    }
}
