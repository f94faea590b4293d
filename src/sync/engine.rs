// src/sync/engine.rs

//! The sync engine: drives one full cycle for a listing category.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Alert, BranchNotice, Category, Config};
use crate::services::{AvailabilityProber, CatalogExtractor, Notifier};
use crate::storage::{CatalogStore, Snapshot};

/// Drives sync cycles against the catalog store.
///
/// Holds no state across cycles beyond what it reads from and writes back
/// to the store within the same cycle.
pub struct SyncEngine {
    store: Arc<CatalogStore>,
    extractor: Arc<dyn CatalogExtractor>,
    prober: Arc<dyn AvailabilityProber>,
    notifier: Arc<dyn Notifier>,
    config: Arc<Config>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<CatalogStore>,
        extractor: Arc<dyn CatalogExtractor>,
        prober: Arc<dyn AvailabilityProber>,
        notifier: Arc<dyn Notifier>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            extractor,
            prober,
            notifier,
            config,
        }
    }

    /// Run one cycle for `category` and return the alerts that fired.
    ///
    /// Extraction happens before the store lock is taken: a failed fetch
    /// aborts the cycle with the store untouched. Everything from merge
    /// through the final persist runs under the store lock, so overlapping
    /// cycles serialize instead of racing on the document.
    pub async fn run_cycle(&self, category: Category) -> Result<Vec<Alert>> {
        log::info!("refreshing {} titles...", category);
        let records = self.extractor.extract(category).await?;

        let now = Utc::now();
        let mut snapshot = self.store.lock().await;

        let merged = snapshot.merge(category, &records, now);
        log::debug!(
            "{} titles refreshed: {} inserted, {} updated, {} unchanged",
            category,
            merged.inserted,
            merged.updated,
            merged.unchanged
        );
        self.store.persist(&snapshot).await?;

        let purged = snapshot.purge_stale(now, self.config.sync.freshness_window());
        let pruned = match category {
            Category::AvailableNow => {
                snapshot.prune_availability(now, self.config.sync.notify_cooldown())
            }
            Category::OnOrder => 0,
        };
        if purged > 0 || pruned > 0 {
            log::debug!(
                "{} stale items purged, {} cold branch entries pruned",
                purged,
                pruned
            );
        }
        self.store.persist(&snapshot).await?;

        let alerts = match category {
            Category::AvailableNow => self.collect_available_alerts(&mut snapshot, now).await,
            Category::OnOrder => collect_on_order_alerts(&mut snapshot, now),
        };
        self.store.persist(&snapshot).await?;
        drop(snapshot);

        if alerts.is_empty() {
            log::info!("no new titles {}.", category);
        } else {
            log::info!(
                "sending notification for {} {} items...",
                alerts.len(),
                category
            );
            // Alerts count as sent once queued: a delivery failure is
            // logged and never rolls back the stamps above.
            if let Err(e) = self.notifier.send(&compose_message(category, &alerts)).await {
                log::error!("Failed to send notification: {}", e);
            }
        }

        Ok(alerts)
    }

    /// Probe availability for wishlist-matched items and stamp/alert every
    /// branch whose cooldown has lapsed.
    async fn collect_available_alerts(
        &self,
        snapshot: &mut Snapshot,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let phrases = snapshot.wish_list_items.clone();
        let matched: Vec<String> = snapshot
            .library_items
            .iter()
            .filter(|item| {
                item.category == Category::AvailableNow && item.matches_wishlist(&phrases)
            })
            .map(|item| item.id.clone())
            .collect();

        if matched.is_empty() {
            return Vec::new();
        }
        log::info!(
            "getting availability for {} available now wish list items...",
            matched.len()
        );

        let cooldown = self.config.sync.notify_cooldown();
        let mut alerts = Vec::new();
        for id in matched {
            let copies = match self.prober.probe(&id).await {
                Ok(copies) => copies,
                Err(e) => {
                    log::error!("failed to fetch availability for {}: {}", id, e);
                    continue;
                }
            };

            let Some(item) = snapshot.find_item_mut(&id) else {
                continue;
            };

            for copy in copies.iter().filter(|c| c.is_loanable(&self.config.copies)) {
                let Some(location) = self.config.find_location(&copy.branch_name) else {
                    continue;
                };

                let code = location.code.to_string();
                if !item.branch_alert_due(&code, now, cooldown) {
                    continue;
                }

                item.availability.insert(
                    code,
                    BranchNotice {
                        notify_date: now,
                        location: location.name.clone(),
                    },
                );
                log::debug!("{} now available at {}.", item.title, location.name);
                alerts.push(Alert {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    url: item.url.clone(),
                    branch_code: Some(location.code),
                    branch_name: Some(location.name.clone()),
                });
            }
        }
        alerts
    }
}

/// Stamp every on-order item that has never been alerted. The stamp is
/// monotonic, so each item fires at most once for its lifetime in the store.
fn collect_on_order_alerts(snapshot: &mut Snapshot, now: DateTime<Utc>) -> Vec<Alert> {
    snapshot
        .library_items
        .iter_mut()
        .filter(|item| item.category == Category::OnOrder && item.notify_date.is_none())
        .map(|item| {
            item.notify_date = Some(now);
            Alert {
                id: item.id.clone(),
                title: item.title.clone(),
                url: item.url.clone(),
                branch_code: None,
                branch_name: None,
            }
        })
        .collect()
}

/// Compose the single aggregated message for a cycle's alert batch.
pub fn compose_message(category: Category, alerts: &[Alert]) -> String {
    let blocks: Vec<String> = alerts.iter().map(Alert::message_block).collect();
    format!("{} alert!!!\n{}", category, blocks.join("\n\n"))
}
