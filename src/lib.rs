//! Library root for the `logvault` crate
//!
//! A log-entry record store with stable identifiers, dual persistence
//! backends, and first/next/previous navigation over the id space.

// Core error handling
pub mod api_errors;
pub mod errors;

// Record model & input normalization
pub mod log_record;
pub mod sanitize;

// Storage adapters (file journal and sled keyspace behind one trait)
pub mod record_store;
pub mod record_store_file;
pub mod record_store_sled;

// Identifier allocation, lifecycle, navigation
pub mod id_alloc;
pub mod lifecycle;
pub mod navigation;

// Configuration & CLI
pub mod cli;
pub mod config_loader;

// Web server interface
pub mod app_state;
pub mod vaultweb;


// Re-export the types most callers need
pub use errors::{VaultError, VaultResult};
pub use log_record::{DeleteMode, LogLevel, LogRecord, LogStatus, RecordDraft};
pub use record_store::{open_store, RecordStore};
