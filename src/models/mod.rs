// src/models/mod.rs

//! Domain models for the watcher application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod item;

// Re-export all public types
pub use config::{
    Config, CopyFilterConfig, Location, NotifierConfig, ScheduleConfig, ServerConfig, SyncConfig,
    UpstreamConfig,
};
pub use item::{Alert, BranchNotice, Category, LibraryItem, RawRecord};
