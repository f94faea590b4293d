// src/storage/snapshot.rs

//! In-memory form of the persisted catalog document.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, LibraryItem, RawRecord};

/// A credential pair consulted by the auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
}

/// The full persisted state: catalog items, wishlist phrases, and users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "libraryItems", default)]
    pub library_items: Vec<LibraryItem>,

    #[serde(rename = "wishListItems", default)]
    pub wish_list_items: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
}

/// Counts from one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeResult {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl Snapshot {
    pub fn find_item(&self, id: &str) -> Option<&LibraryItem> {
        self.library_items.iter().find(|item| item.id == id)
    }

    pub fn find_item_mut(&mut self, id: &str) -> Option<&mut LibraryItem> {
        self.library_items.iter_mut().find(|item| item.id == id)
    }

    /// Items currently stored under one category.
    pub fn items_by_category(&self, category: Category) -> Vec<LibraryItem> {
        self.library_items
            .iter()
            .filter(|item| item.category == category)
            .cloned()
            .collect()
    }

    /// Fold one batch of extracted records into the catalog.
    ///
    /// Known ids get their descriptive fields overwritten and `updateDate`
    /// refreshed (alert stamps are preserved); unknown ids are inserted.
    /// Items of `category` absent from the batch are left untouched; only
    /// the freshness-window purge removes items.
    pub fn merge(
        &mut self,
        category: Category,
        records: &[RawRecord],
        now: DateTime<Utc>,
    ) -> MergeResult {
        let mut result = MergeResult::default();
        for record in records {
            match self.find_item_mut(&record.id) {
                Some(existing) => {
                    if existing.apply(record, category, now) {
                        result.updated += 1;
                    } else {
                        result.unchanged += 1;
                    }
                }
                None => {
                    self.library_items
                        .push(LibraryItem::from_record(record, category, now));
                    result.inserted += 1;
                }
            }
        }
        result
    }

    /// Drop every item, in any category, that has not reappeared in
    /// extractor output within the freshness window. This is the sole
    /// garbage-collection mechanism; there is no explicit delete.
    pub fn purge_stale(&mut self, now: DateTime<Utc>, window: TimeDelta) -> usize {
        let before = self.library_items.len();
        self.library_items.retain(|item| !item.is_stale(now, window));
        before - self.library_items.len()
    }

    /// Drop branch alert entries older than the cooldown from available-now
    /// items. Keeps the availability maps bounded and lets a branch that
    /// went quiet re-fire later.
    pub fn prune_availability(&mut self, now: DateTime<Utc>, cooldown: TimeDelta) -> usize {
        let mut removed = 0;
        for item in self
            .library_items
            .iter_mut()
            .filter(|item| item.category == Category::AvailableNow)
        {
            let before = item.availability.len();
            item.availability
                .retain(|_, notice| notice.notify_date >= now - cooldown);
            removed += before - item.availability.len();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BranchNotice;

    fn record(id: &str, title: &str) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            title: title.to_string(),
            subtitle: None,
            publication_year: None,
            format: Some("BLURAY".to_string()),
            edition: None,
            description: None,
            image: None,
            url: format!("https://example.com/v2/record/{}", id),
        }
    }

    #[test]
    fn test_merge_inserts_then_updates() {
        let now = Utc::now();
        let mut snapshot = Snapshot::default();

        let result = snapshot.merge(Category::AvailableNow, &[record("a1", "One")], now);
        assert_eq!(result, MergeResult { inserted: 1, updated: 0, unchanged: 0 });

        let later = now + TimeDelta::hours(1);
        let result = snapshot.merge(Category::AvailableNow, &[record("a1", "One, Revised")], later);
        assert_eq!(result, MergeResult { inserted: 0, updated: 1, unchanged: 0 });

        let item = snapshot.find_item("a1").unwrap();
        assert_eq!(item.title, "One, Revised");
        assert_eq!(item.create_date, now);
        assert_eq!(item.update_date, later);
    }

    #[test]
    fn test_merge_is_idempotent_except_update_date() {
        let now = Utc::now();
        let records = vec![record("a1", "One"), record("a2", "Two")];
        let mut snapshot = Snapshot::default();
        snapshot.merge(Category::OnOrder, &records, now);
        let first = snapshot.clone();

        let later = now + TimeDelta::minutes(15);
        let result = snapshot.merge(Category::OnOrder, &records, later);
        assert_eq!(result, MergeResult { inserted: 0, updated: 0, unchanged: 2 });

        let mut rewound = snapshot.clone();
        for item in &mut rewound.library_items {
            item.update_date = now;
        }
        assert_eq!(rewound, first);
    }

    #[test]
    fn test_merge_leaves_absent_items_untouched() {
        let now = Utc::now();
        let mut snapshot = Snapshot::default();
        snapshot.merge(
            Category::AvailableNow,
            &[record("a1", "One"), record("a2", "Two")],
            now,
        );

        // A later, partial response does not delete the item it omits.
        snapshot.merge(Category::AvailableNow, &[record("a2", "Two")], now);
        assert!(snapshot.find_item("a1").is_some());
        assert_eq!(snapshot.library_items.len(), 2);
    }

    #[test]
    fn test_merge_moves_item_between_categories() {
        let now = Utc::now();
        let mut snapshot = Snapshot::default();
        snapshot.merge(Category::OnOrder, &[record("a1", "One")], now);
        snapshot.find_item_mut("a1").unwrap().notify_date = Some(now);

        snapshot.merge(Category::AvailableNow, &[record("a1", "One")], now);

        let item = snapshot.find_item("a1").unwrap();
        assert_eq!(item.category, Category::AvailableNow);
        // Exactly one record per id, stamps preserved across the move.
        assert_eq!(snapshot.library_items.len(), 1);
        assert_eq!(item.notify_date, Some(now));
    }

    #[test]
    fn test_purge_stale_spans_categories() {
        let now = Utc::now();
        let window = TimeDelta::days(7);
        let mut snapshot = Snapshot::default();
        snapshot.merge(Category::AvailableNow, &[record("a1", "Fresh")], now);
        snapshot.merge(Category::OnOrder, &[record("b1", "Old")], now);
        snapshot.find_item_mut("b1").unwrap().update_date = now - TimeDelta::days(8);

        let removed = snapshot.purge_stale(now, window);

        assert_eq!(removed, 1);
        assert!(snapshot.find_item("a1").is_some());
        assert!(snapshot.find_item("b1").is_none());
    }

    #[test]
    fn test_purge_keeps_item_exactly_at_window_edge() {
        let now = Utc::now();
        let window = TimeDelta::days(7);
        let mut snapshot = Snapshot::default();
        snapshot.merge(Category::OnOrder, &[record("a1", "Edge")], now - window);

        assert_eq!(snapshot.purge_stale(now, window), 0);
        assert!(snapshot.find_item("a1").is_some());
    }

    #[test]
    fn test_prune_availability_drops_cold_entries() {
        let now = Utc::now();
        let cooldown = TimeDelta::hours(24);
        let mut snapshot = Snapshot::default();
        snapshot.merge(Category::AvailableNow, &[record("a1", "One")], now);

        let item = snapshot.find_item_mut("a1").unwrap();
        item.availability.insert(
            "29".to_string(),
            BranchNotice {
                notify_date: now - TimeDelta::hours(25),
                location: "Tigard Public Library".to_string(),
            },
        );
        item.availability.insert(
            "31".to_string(),
            BranchNotice {
                notify_date: now - TimeDelta::hours(1),
                location: "Tualatin Public Library".to_string(),
            },
        );

        let removed = snapshot.prune_availability(now, cooldown);

        assert_eq!(removed, 1);
        let item = snapshot.find_item("a1").unwrap();
        assert!(!item.availability.contains_key("29"));
        assert!(item.availability.contains_key("31"));
    }

    #[test]
    fn test_document_round_trip() {
        let raw = r#"{
            "libraryItems": [{
                "id": "a1",
                "type": "on order",
                "title": "One",
                "subtitle": null,
                "publicationYear": "2024",
                "format": "BLURAY",
                "edition": null,
                "description": null,
                "image": null,
                "url": "https://example.com/v2/record/a1",
                "createDate": 1700000000,
                "updateDate": 1700000000,
                "notifyDate": 1700000100
            }],
            "wishListItems": ["dune"],
            "users": [{ "id": "u1", "username": "sam", "password": "hunter2" }]
        }"#;

        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.library_items.len(), 1);
        assert_eq!(snapshot.wish_list_items, vec!["dune"]);
        assert_eq!(snapshot.users[0].username, "sam");

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["libraryItems"][0]["type"], "on order");
        assert_eq!(json["libraryItems"][0]["notifyDate"], 1_700_000_100);
        assert_eq!(json["wishListItems"][0], "dune");
    }

    #[test]
    fn test_empty_document_parses() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.library_items.is_empty());
        assert!(snapshot.wish_list_items.is_empty());
        assert!(snapshot.users.is_empty());
    }
}
