//! Service layer for the watcher application.
//!
//! This module contains the external collaborators of the sync engine:
//! - Search-result extraction (`CatalogExtractor`)
//! - Per-item availability probing (`AvailabilityProber`)
//! - Outbound alert delivery (`Notifier`)

mod availability;
mod extractor;
mod notifier;

pub use availability::{AvailabilityProber, BibCopy, GatewayProber};
pub use extractor::{CatalogExtractor, SearchPageExtractor};
pub use notifier::{Notifier, WebhookNotifier};

use std::time::Duration;

use crate::error::Result;
use crate::models::SyncConfig;

/// Create a configured HTTP client shared by the collaborators.
pub fn create_client(config: &SyncConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
