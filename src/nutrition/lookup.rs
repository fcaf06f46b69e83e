//! Barcode → product nutrition via the Open Food Facts API.
//!
//! Values are per 100 g as published; missing nutriments read as zero.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::facts::NutritionEstimate;
use crate::config::FoodDbConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductInfo {
    pub fn estimate(&self) -> NutritionEstimate {
        NutritionEstimate {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// EAN-8 through GTIN-14.
pub fn is_valid_barcode(code: &str) -> bool {
    lazy_static! {
        static ref BARCODE_RE: Regex = Regex::new(r"^[0-9]{8,14}$").unwrap();
    }
    BARCODE_RE.is_match(code)
}

#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// `Ok(None)` when the database does not know the product.
    async fn lookup(&self, barcode: &str) -> anyhow::Result<Option<ProductInfo>>;
}

pub struct OpenFoodFacts {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    product_name: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    nutriments: Nutriments,
}

#[derive(Debug, Default, Deserialize)]
struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    energy_kcal_100g: Option<f64>,
    proteins_100g: Option<f64>,
    carbohydrates_100g: Option<f64>,
    fat_100g: Option<f64>,
}

impl From<Product> for ProductInfo {
    fn from(p: Product) -> Self {
        Self {
            name: p
                .product_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown Product".to_string()),
            calories: p.nutriments.energy_kcal_100g.unwrap_or(0.0),
            protein: p.nutriments.proteins_100g.unwrap_or(0.0),
            carbs: p.nutriments.carbohydrates_100g.unwrap_or(0.0),
            fat: p.nutriments.fat_100g.unwrap_or(0.0),
            image_url: p.image_url,
        }
    }
}

impl OpenFoodFacts {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(cfg: &FoodDbConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("nutrilog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client, cfg.base_url.clone()))
    }
}

#[async_trait]
impl ProductLookup for OpenFoodFacts {
    #[instrument(skip(self))]
    async fn lookup(&self, barcode: &str) -> anyhow::Result<Option<ProductInfo>> {
        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("food database request")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .context("food database status")?;
        let body: ProductResponse = response.json().await.context("food database body")?;

        match (body.status, body.product) {
            (1, Some(product)) => Ok(Some(product.into())),
            _ => {
                debug!(barcode, "product not found");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_for(server: &MockServer) -> OpenFoodFacts {
        OpenFoodFacts::new(reqwest::Client::new(), server.uri())
    }

    #[test]
    fn barcode_format() {
        assert!(is_valid_barcode("5449000000996"));
        assert!(is_valid_barcode("96385074"));
        assert!(!is_valid_barcode("1234567"));
        assert!(!is_valid_barcode("544900000099a"));
        assert!(!is_valid_barcode("123456789012345"));
    }

    #[tokio::test]
    async fn maps_found_product() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v0/product/5449000000996.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1,
                "status_verbose": "product found",
                "product": {
                    "product_name": "Soda",
                    "image_url": "https://images.example/soda.jpg",
                    "nutriments": {
                        "energy-kcal_100g": 42,
                        "proteins_100g": 0,
                        "carbohydrates_100g": 10.6,
                        "fat_100g": 0
                    }
                }
            })))
            .mount(&server)
            .await;

        let product = lookup_for(&server)
            .lookup("5449000000996")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.name, "Soda");
        assert_eq!(product.calories, 42.0);
        assert_eq!(product.carbs, 10.6);
        assert_eq!(product.image_url.as_deref(), Some("https://images.example/soda.jpg"));
    }

    #[tokio::test]
    async fn missing_nutriments_and_name_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v0/product/96385074.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1,
                "product": { "nutriments": { "fat_100g": 3.5 } }
            })))
            .mount(&server)
            .await;

        let product = lookup_for(&server).lookup("96385074").await.unwrap().unwrap();
        assert_eq!(product.name, "Unknown Product");
        assert_eq!(product.calories, 0.0);
        assert_eq!(product.fat, 3.5);
    }

    #[tokio::test]
    async fn unknown_product_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v0/product/00000000.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 0,
                "status_verbose": "product not found"
            })))
            .mount(&server)
            .await;

        assert!(lookup_for(&server).lookup("00000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_err() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(lookup_for(&server).lookup("12345678").await.is_err());
    }
}
