//! Contact heuristics: email normalization, domain extraction, internal
//! classification and the domain-to-account-name token.
//!
//! Everything here is pure so the database layer and the HTTP layer classify
//! an address the same way.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::COMPANY_SUFFIXES;
use crate::error::{Error, Result};

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape regex is valid")
});

/// Trim and lowercase an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Lowercased substring after the `@`.
///
/// Returns an empty string unless the address contains exactly one `@`.
pub fn extract_domain(email: &str) -> String {
    let lowered = email.to_lowercase();
    let mut parts = lowered.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(domain), None) => domain.to_string(),
        _ => String::new(),
    }
}

/// Loose shape check used to reject obviously malformed addresses on create.
pub fn looks_like_email(candidate: &str) -> bool {
    EMAIL_SHAPE.is_match(candidate.trim())
}

/// Strip the first matching company suffix (`.com`, `.io`, `.ai`, `.co`, in
/// that order) to get the token matched against account names.
///
/// `salesforce.com` yields `salesforce`; `acme.co.uk` is returned unchanged.
pub fn company_token(domain: &str) -> &str {
    COMPANY_SUFFIXES
        .iter()
        .find_map(|suffix| domain.strip_suffix(suffix))
        .unwrap_or(domain)
}

/// First dot-separated label of a domain (`mail.acme.com` -> `mail`).
pub fn domain_first_label(domain: &str) -> &str {
    domain.split('.').next().unwrap_or_default()
}

/// Account name derived from a domain when the caller supplies none:
/// the first label with its first character uppercased.
pub fn account_name_for_domain(domain: &str) -> String {
    let label = domain_first_label(domain);
    if label.is_empty() {
        return domain.to_string();
    }
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalized, de-duplicated participant emails from both lists, in order
/// of first appearance. Blank entries are dropped.
pub fn participant_emails(internal: &[String], external: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    internal
        .iter()
        .chain(external.iter())
        .map(|raw| normalize_email(raw))
        .filter(|email| !email.is_empty())
        .filter(|email| seen.insert(email.clone()))
        .collect()
}

/// The configured internal email domain.
///
/// Always stored lowercased without a leading `@`. There is no default: a
/// deployment must name its own domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalDomain(String);

impl InternalDomain {
    pub fn new(raw: &str) -> Result<Self> {
        let domain = raw.trim().trim_start_matches('@').to_lowercase();
        if domain.is_empty() {
            return Err(Error::Config(
                "internal email domain must not be empty".to_string(),
            ));
        }
        Ok(Self(domain))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when an already-extracted domain is the internal one.
    pub fn is_internal_domain(&self, domain: &str) -> bool {
        !domain.is_empty() && domain == self.0
    }

    /// True when the email's domain is the internal one.
    pub fn is_internal_email(&self, email: &str) -> bool {
        self.is_internal_domain(&extract_domain(email))
    }
}

impl fmt::Display for InternalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
