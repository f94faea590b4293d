// src/storage/store.rs

//! Catalog store: file ownership, atomic persistence, and locking.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{AppError, Result};
use crate::models::{Category, LibraryItem};
use crate::storage::Snapshot;

/// Owns the persisted catalog document.
///
/// All mutation goes through [`CatalogStore::lock`] followed by
/// [`CatalogStore::persist`]; the mutex serializes every read-modify-persist
/// sequence in the process, so concurrent sync cycles cannot race on the
/// whole-document read-modify-write.
pub struct CatalogStore {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl CatalogStore {
    /// Open the store, creating an empty document when none exists.
    ///
    /// An unreadable document is logged and replaced with an empty snapshot;
    /// the bad file stays on disk until the next persist overwrites it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = match Self::load(&path).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::info!("No catalog document at {}; creating one", path.display());
                let snapshot = Snapshot::default();
                Self::write_document(&path, &snapshot).await?;
                snapshot
            }
            Err(AppError::StoreUnavailable(message)) => {
                log::warn!("{message}; starting from an empty snapshot");
                Snapshot::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            path,
            state: Mutex::new(snapshot),
        })
    }

    /// Read the document from disk. Returns `None` when the file is absent
    /// and `StoreUnavailable` when it exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Option<Snapshot>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                AppError::StoreUnavailable(format!("Store unreadable at {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::StoreUnavailable(format!(
                "Store unreadable at {}: {e}",
                path.display()
            ))),
        }
    }

    /// Lock the snapshot for a read-modify-persist sequence.
    pub async fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.state.lock().await
    }

    /// Atomically write the snapshot back (write to temp, then rename), so
    /// a concurrent reader never observes a partial document.
    pub async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        Self::write_document(&self.path, snapshot).await
    }

    async fn write_document(path: &Path, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Current items of one category.
    pub async fn items_by_category(&self, category: Category) -> Vec<LibraryItem> {
        self.state.lock().await.items_by_category(category)
    }

    /// Current wishlist phrases.
    pub async fn wishlist(&self) -> Vec<String> {
        self.state.lock().await.wish_list_items.clone()
    }

    /// Append a wishlist phrase (duplicates tolerated) and persist.
    /// Returns the new list.
    pub async fn add_wishlist_entry(&self, phrase: &str) -> Result<Vec<String>> {
        let mut snapshot = self.state.lock().await;
        snapshot.wish_list_items.push(phrase.to_string());
        self.persist(&snapshot).await?;
        log::info!("added {} to wish list.", phrase);
        Ok(snapshot.wish_list_items.clone())
    }

    /// Remove a wishlist phrase by case-insensitive whole-phrase match and
    /// persist. The `WishlistNotFound` error carries the current entries so
    /// the caller can enumerate them.
    pub async fn remove_wishlist_entry(&self, phrase: &str) -> Result<Vec<String>> {
        let mut snapshot = self.state.lock().await;
        let position = snapshot
            .wish_list_items
            .iter()
            .position(|entry| entry.eq_ignore_ascii_case(phrase));

        match position {
            Some(index) => {
                snapshot.wish_list_items.remove(index);
                self.persist(&snapshot).await?;
                log::info!("removed {} from wish list.", phrase);
                Ok(snapshot.wish_list_items.clone())
            }
            None => Err(AppError::WishlistNotFound {
                title: phrase.to_string(),
                entries: snapshot.wish_list_items.clone(),
            }),
        }
    }

    /// Look up a credential pair; returns the user id on a match.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .map(|user| user.id.clone())
    }
}
