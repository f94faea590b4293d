// src/services/availability.rs

//! Per-item availability probing.
//!
//! The availability endpoint reports every physical copy of an item and its
//! per-branch circulation status.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::CopyFilterConfig;

/// One physical holding reported by the availability endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibCopy {
    pub branch_name: String,
    pub status: String,
    pub collection: String,
    pub call_number: String,
}

impl BibCopy {
    /// A copy counts as loanable when it reports the available status, sits
    /// in a circulating collection, and is not an excluded format.
    pub fn is_loanable(&self, filter: &CopyFilterConfig) -> bool {
        self.status == filter.available_status
            && self.collection.ends_with(&filter.circulating_suffix)
            && !filter
                .excluded_call_prefixes
                .iter()
                .any(|prefix| self.call_number.starts_with(prefix))
    }
}

/// Fetches the physical copies of a catalog item.
#[async_trait]
pub trait AvailabilityProber: Send + Sync {
    async fn probe(&self, item_id: &str) -> Result<Vec<BibCopy>>;
}

/// Prober backed by the live availability gateway.
pub struct GatewayProber {
    client: reqwest::Client,
    url_template: String,
}

impl GatewayProber {
    pub fn new(client: reqwest::Client, url_template: String) -> Self {
        Self {
            client,
            url_template,
        }
    }
}

#[async_trait]
impl AvailabilityProber for GatewayProber {
    async fn probe(&self, item_id: &str) -> Result<Vec<BibCopy>> {
        let url = self.url_template.replace("{id}", item_id);
        log::debug!("fetching availability for {}", item_id);

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let payload: AvailabilityPayload = serde_json::from_str(&body)?;

        Ok(payload
            .entities
            .bib_items
            .into_values()
            .map(BibCopy::from)
            .collect())
    }
}

// Wire format of the availability payload.

#[derive(Debug, Deserialize)]
struct AvailabilityPayload {
    entities: AvailabilityEntities,
}

#[derive(Debug, Deserialize)]
struct AvailabilityEntities {
    #[serde(rename = "bibItems", default)]
    bib_items: BTreeMap<String, BibItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BibItem {
    availability: BibItemAvailability,
    collection: String,
    #[serde(rename = "callNumber")]
    call_number: String,
    branch: Branch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BibItemAvailability {
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Branch {
    name: String,
}

impl From<BibItem> for BibCopy {
    fn from(item: BibItem) -> Self {
        Self {
            branch_name: item.branch.name,
            status: item.availability.status,
            collection: item.collection,
            call_number: item.call_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn copy(status: &str, collection: &str, call_number: &str) -> BibCopy {
        BibCopy {
            branch_name: "Tigard Public Library".to_string(),
            status: status.to_string(),
            collection: collection.to_string(),
            call_number: call_number.to_string(),
        }
    }

    #[test]
    fn test_loanable_filter() {
        let filter = CopyFilterConfig::default();

        assert!(copy("AVAILABLE", "Best Sellers - Not Holdable", "DVD ROAD").is_loanable(&filter));

        // Checked out.
        assert!(!copy("CHECKED_OUT", "Best Sellers - Not Holdable", "DVD").is_loanable(&filter));
        // Holdable stacks copy, not the walk-in shelf.
        assert!(!copy("AVAILABLE", "Adult Fiction", "DVD").is_loanable(&filter));
        // Excluded format.
        assert!(!copy("AVAILABLE", "Best Sellers - Not Holdable", "4K ROAD").is_loanable(&filter));
    }

    #[tokio::test]
    async fn test_probe_parses_copies() {
        let server = MockServer::start().await;
        let body = r#"{
            "entities": {
                "bibItems": {
                    "1": {
                        "availability": { "status": "AVAILABLE" },
                        "collection": "Best Sellers - Not Holdable",
                        "callNumber": "DVD ROAD",
                        "branch": { "name": "Tigard Public Library" }
                    },
                    "2": {
                        "availability": { "status": "IN_TRANSIT" },
                        "collection": "Best Sellers",
                        "callNumber": "DVD ROAD",
                        "branch": { "name": "Tualatin Public Library" }
                    }
                }
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/bibs/abc1/availability"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let prober = GatewayProber::new(
            reqwest::Client::new(),
            format!("{}/bibs/{{id}}/availability", server.uri()),
        );
        let copies = prober.probe("abc1").await.unwrap();

        assert_eq!(copies.len(), 2);
        assert!(copies.iter().any(|c| {
            c.branch_name == "Tigard Public Library" && c.status == "AVAILABLE"
        }));
    }

    #[tokio::test]
    async fn test_probe_malformed_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bibs/abc1/availability"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let prober = GatewayProber::new(
            reqwest::Client::new(),
            format!("{}/bibs/{{id}}/availability", server.uri()),
        );
        assert!(prober.probe("abc1").await.is_err());
    }
}
