//! # rapport-core
//!
//! Core types, traits, and abstractions for the rapport meeting-notes CRM.
//!
//! This crate provides the domain models, the repository traits the database
//! layer implements, the shared error type, and the pure contact heuristics
//! (domain extraction, internal classification, company tokens).

pub mod contacts;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use contacts::{
    account_name_for_domain, company_token, domain_first_label, extract_domain,
    looks_like_email, normalize_email, participant_emails, InternalDomain,
};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_id};
