// src/services/extractor.rs

//! Search-result extraction service.
//!
//! Fetches the configured catalog search page and lifts the JSON payload
//! embedded in its `<script>` island into raw item records.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Category, RawRecord, UpstreamConfig};

/// Produces raw catalog records for one listing category.
#[async_trait]
pub trait CatalogExtractor: Send + Sync {
    /// Fetch and parse the upstream search results for `category`.
    async fn extract(&self, category: Category) -> Result<Vec<RawRecord>>;
}

/// Extractor backed by the live catalog search endpoint.
pub struct SearchPageExtractor {
    client: reqwest::Client,
    upstream: UpstreamConfig,
}

impl SearchPageExtractor {
    pub fn new(client: reqwest::Client, upstream: UpstreamConfig) -> Self {
        Self { client, upstream }
    }

    /// Parse a search page: locate the embedded JSON payload and map its
    /// `entities.bibs` into records.
    fn parse_page(&self, html: &str, category: Category) -> Result<Vec<RawRecord>> {
        let document = Html::parse_document(html);
        let selector = parse_selector(&self.upstream.script_selector)?;

        let script = document
            .select(&selector)
            .next()
            .ok_or_else(|| AppError::extraction(category.label(), "embedded payload not found"))?;
        let payload: String = script.text().collect();

        let parsed: SearchPayload = serde_json::from_str(&payload)
            .map_err(|e| AppError::extraction(category.label(), e))?;

        Ok(parsed
            .entities
            .bibs
            .into_values()
            .map(|bib| self.to_record(bib))
            .collect())
    }

    fn to_record(&self, bib: Bib) -> RawRecord {
        let url = self.upstream.record_url_template.replace("{id}", &bib.id);
        RawRecord {
            title: bib.brief_info.title,
            subtitle: bib.brief_info.subtitle,
            publication_year: bib.brief_info.publication_date.and_then(scalar_to_string),
            format: bib.brief_info.format,
            edition: bib.brief_info.edition,
            description: bib.brief_info.description,
            image: bib.brief_info.jacket.and_then(|j| j.large),
            url,
            id: bib.id,
        }
    }
}

#[async_trait]
impl CatalogExtractor for SearchPageExtractor {
    async fn extract(&self, category: Category) -> Result<Vec<RawRecord>> {
        let url = self.upstream.search_url(category);
        log::debug!("fetching {} search page: {}", category, url);

        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AppError::extraction(category.label(), e))?
            .text()
            .await
            .map_err(|e| AppError::extraction(category.label(), e))?;

        let records = self.parse_page(&html, category)?;
        log::debug!("{} {} records extracted", records.len(), category);
        Ok(records)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Upstream years arrive as either a JSON string or a bare number.
fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Wire format of the embedded search payload.

#[derive(Debug, Deserialize)]
struct SearchPayload {
    entities: SearchEntities,
}

#[derive(Debug, Deserialize)]
struct SearchEntities {
    #[serde(default)]
    bibs: BTreeMap<String, Bib>,
}

#[derive(Debug, Deserialize)]
struct Bib {
    id: String,
    #[serde(rename = "briefInfo")]
    brief_info: BriefInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BriefInfo {
    title: String,
    subtitle: Option<String>,
    #[serde(rename = "publicationDate")]
    publication_date: Option<serde_json::Value>,
    format: Option<String>,
    edition: Option<String>,
    description: Option<String>,
    jacket: Option<Jacket>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Jacket {
    large: Option<String>,
}
