//! Catalog item data structures.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Listing category an item was extracted under.
///
/// Mutually exclusive; an id changes category only by being re-extracted
/// under the other listing, which replaces the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "available now")]
    AvailableNow,
    #[serde(rename = "on order")]
    OnOrder,
}

impl Category {
    /// Human-readable label, as used in log lines and alert headers.
    pub fn label(&self) -> &'static str {
        match self {
            Category::AvailableNow => "available now",
            Category::OnOrder => "on order",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A raw catalog record produced by the extractor for one search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub publication_year: Option<String>,
    pub format: Option<String>,
    pub edition: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Canonical record page URL
    pub url: String,
}

/// Record of the last alert fired for one branch of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNotice {
    /// When the alert for this branch last fired
    #[serde(rename = "notifyDate", with = "chrono::serde::ts_seconds")]
    pub notify_date: DateTime<Utc>,

    /// Branch display name
    pub location: String,
}

/// One persisted catalog entry.
///
/// Serialized field names and epoch-second timestamps match the flat
/// document layout consumed by existing readers of `db.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    /// Stable upstream identifier
    pub id: String,

    /// Listing category
    #[serde(rename = "type")]
    pub category: Category,

    pub title: String,
    pub subtitle: Option<String>,
    pub publication_year: Option<String>,
    pub format: Option<String>,
    pub edition: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: String,

    /// Set once, when the id is first extracted
    #[serde(with = "chrono::serde::ts_seconds")]
    pub create_date: DateTime<Utc>,

    /// Refreshed every cycle the id reappears in extractor output
    #[serde(with = "chrono::serde::ts_seconds")]
    pub update_date: DateTime<Utc>,

    /// On-order alert stamp; monotonic, never cleared
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub notify_date: Option<DateTime<Utc>>,

    /// Branch-code → last alert, for available-now items that have fired
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub availability: BTreeMap<String, BranchNotice>,
}

impl LibraryItem {
    /// Build a fresh item from an extracted record.
    pub fn from_record(record: &RawRecord, category: Category, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            category,
            title: record.title.clone(),
            subtitle: record.subtitle.clone(),
            publication_year: record.publication_year.clone(),
            format: record.format.clone(),
            edition: record.edition.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
            url: record.url.clone(),
            create_date: now,
            update_date: now,
            notify_date: None,
            availability: BTreeMap::new(),
        }
    }

    /// Overwrite descriptive fields from a re-extracted record and refresh
    /// `update_date`. `create_date`, `notify_date`, and `availability` are
    /// preserved. Returns whether any descriptive field actually changed.
    pub fn apply(&mut self, record: &RawRecord, category: Category, now: DateTime<Utc>) -> bool {
        let changed = self.category != category
            || self.title != record.title
            || self.subtitle != record.subtitle
            || self.publication_year != record.publication_year
            || self.format != record.format
            || self.edition != record.edition
            || self.description != record.description
            || self.image != record.image
            || self.url != record.url;

        self.category = category;
        self.title = record.title.clone();
        self.subtitle = record.subtitle.clone();
        self.publication_year = record.publication_year.clone();
        self.format = record.format.clone();
        self.edition = record.edition.clone();
        self.description = record.description.clone();
        self.image = record.image.clone();
        self.url = record.url.clone();
        self.update_date = now;
        changed
    }

    /// True when the item has not reappeared in extractor output within the
    /// freshness window.
    pub fn is_stale(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        now - self.update_date > window
    }

    /// Case-insensitive substring match against any wishlist phrase.
    pub fn matches_wishlist(&self, phrases: &[String]) -> bool {
        let title = self.title.to_lowercase();
        phrases
            .iter()
            .any(|phrase| title.contains(&phrase.to_lowercase()))
    }

    /// Whether a branch alert may fire: no entry for the branch yet, or the
    /// existing entry's stamp is older than the cooldown.
    pub fn branch_alert_due(&self, code: &str, now: DateTime<Utc>, cooldown: TimeDelta) -> bool {
        match self.availability.get(code) {
            Some(notice) => notice.notify_date < now - cooldown,
            None => true,
        }
    }
}

/// One fired alert, returned to the HTTP caller and folded into the
/// outgoing notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

impl Alert {
    /// Message block for this alert: title, branch when present, record URL.
    pub fn message_block(&self) -> String {
        match &self.branch_name {
            Some(branch) => format!("{}\n{}\n{}", self.title, branch, self.url),
            None => format!("{}\n{}", self.title, self.url),
        }
    }
}
