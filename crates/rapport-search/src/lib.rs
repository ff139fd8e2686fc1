//! # rapport-search
//!
//! Unified search across notes, accounts and todos.
//!
//! This crate provides:
//! - Prefix tsquery construction for the note full-text index
//! - Snippet rules for account and todo hits
//! - Parallel stream orchestration with a fixed merge order and
//!   `(type, id)` deduplication
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rapport_db::Database;
//! use rapport_search::{UnifiedSearch, UnifiedSearchEngine};
//!
//! let db = Database::connect("postgres://...", internal).await?;
//! let engine = UnifiedSearchEngine::new(db.search.clone());
//! let results = engine.search("kickoff").await?;
//! ```

pub mod snippets;
pub mod tsquery;
pub mod unified;

pub use rapport_core::{SearchResult, SearchResultKind};

pub use snippets::{account_snippet, todo_snippet};
pub use tsquery::prefix_tsquery;
pub use unified::{merge_streams, SearchStreams, UnifiedSearch, UnifiedSearchEngine};
