//! Core data models for rapport.
//!
//! These types are shared across all rapport crates and represent the domain
//! entities as they are returned over the API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// DELETION STATE
// =============================================================================

/// Lifecycle of a note or todo row.
///
/// `Active` rows appear in lists and search, `Trashed` rows only in the trash
/// view, and `Purged` rows no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeletionState {
    Active,
    Trashed,
    Purged,
}

impl DeletionState {
    /// SQL predicate every default list and search path uses for active rows.
    pub const ACTIVE_PREDICATE: &'static str = "deleted_at IS NULL";

    /// SQL predicate selecting trashed rows.
    pub const TRASHED_PREDICATE: &'static str = "deleted_at IS NOT NULL";

    /// Derive the state of an existing row from its deletion timestamp.
    pub fn of(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(_) => DeletionState::Trashed,
            None => DeletionState::Active,
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: DeletionState) -> bool {
        matches!(
            (self, next),
            (DeletionState::Active, DeletionState::Trashed)
                | (DeletionState::Trashed, DeletionState::Active)
                | (DeletionState::Active, DeletionState::Purged)
                | (DeletionState::Trashed, DeletionState::Purged)
        )
    }
}

// =============================================================================
// ACCOUNT TYPES
// =============================================================================

/// A customer organization.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Sales owner responsible for the account.
    pub account_owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    /// Estimated engineering headcount for a proof of concept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub est_engineers: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal account reference embedded in other responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccountRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreateAccountRequest {
    pub name: String,
    pub account_owner: String,
    pub budget: Option<f64>,
    pub est_engineers: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub account_owner: Option<String>,
    pub budget: Option<f64>,
    pub est_engineers: Option<i32>,
}

impl UpdateAccountRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.account_owner.is_none()
            && self.budget.is_none()
            && self.est_engineers.is_none()
    }
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A meeting record owned by an account.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// "initial", "followup" or "quick".
    pub template_type: String,
    pub internal_participants: Vec<String>,
    pub external_participants: Vec<String>,
    /// Rich-text document, stored verbatim.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,
    pub pinned: bool,
    pub archived: bool,
    pub sort_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub todos: Vec<Todo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Note {
    pub fn deletion_state(&self) -> DeletionState {
        DeletionState::of(self.deleted_at)
    }
}

/// Short note reference used in todo and contact views.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteRef {
    pub id: String,
    pub title: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub account_id: String,
    pub template_type: Option<String>,
    pub internal_participants: Vec<String>,
    pub external_participants: Vec<String>,
    pub content: String,
    pub meeting_id: Option<String>,
    pub meeting_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub account_id: Option<String>,
    pub template_type: Option<String>,
    pub internal_participants: Option<Vec<String>>,
    pub external_participants: Option<Vec<String>>,
    pub content: Option<String>,
    pub meeting_id: Option<String>,
    /// `Some(None)` clears the date.
    pub meeting_date: Option<Option<DateTime<Utc>>>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub sort_order: Option<i32>,
}

impl UpdateNoteRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.account_id.is_none()
            && self.template_type.is_none()
            && self.internal_participants.is_none()
            && self.external_participants.is_none()
            && self.content.is_none()
            && self.meeting_id.is_none()
            && self.meeting_date.is_none()
            && self.pinned.is_none()
            && self.archived.is_none()
            && self.sort_order.is_none()
    }

    /// True when either participant list is being replaced.
    pub fn touches_participants(&self) -> bool {
        self.internal_participants.is_some() || self.external_participants.is_some()
    }
}

/// Which slice of notes a list call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteListScope {
    /// Active and not archived.
    #[default]
    Active,
    /// Active and archived.
    Archived,
    /// Trashed.
    Trash,
}

// =============================================================================
// TODO TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    NotStarted,
    InProgress,
    Stuck,
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::NotStarted => "not_started",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Stuck => "stuck",
            TodoStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "not_started" => Ok(TodoStatus::NotStarted),
            "in_progress" => Ok(TodoStatus::InProgress),
            "stuck" => Ok(TodoStatus::Stuck),
            "completed" => Ok(TodoStatus::Completed),
            other => Err(Error::InvalidInput(format!(
                "Invalid status '{}': expected not_started, in_progress, stuck or completed",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TodoPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoPriority::Low => "low",
            TodoPriority::Medium => "medium",
            TodoPriority::High => "high",
        }
    }
}

impl fmt::Display for TodoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(TodoPriority::Low),
            "medium" => Ok(TodoPriority::Medium),
            "high" => Ok(TodoPriority::High),
            other => Err(Error::InvalidInput(format!(
                "Invalid priority '{}': expected low, medium or high",
                other
            ))),
        }
    }
}

/// A follow-up item, optionally tied to an account and to notes.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<NoteRef>,
}

impl Todo {
    pub fn deletion_state(&self) -> DeletionState {
        DeletionState::of(self.deleted_at)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub account_id: Option<String>,
    /// Note the new todo is linked to on creation.
    pub note_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<DateTime<Utc>>,
    /// `Some("")` clears the account.
    pub account_id: Option<String>,
    pub pinned: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.account_id.is_none()
            && self.pinned.is_none()
    }
}

// =============================================================================
// TAG, ATTACHMENT, ACTIVITY TYPES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// File attached to a note. `filename` is the stored name on disk.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Attachment {
    pub id: String,
    pub note_id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Activity {
    pub id: String,
    pub account_id: String,
    /// "note_created", "todo_completed", ...
    #[serde(rename = "type")]
    pub activity_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateActivityRequest {
    pub account_id: String,
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

// =============================================================================
// CONTACT TYPES
// =============================================================================

/// A person seen in meetings or entered by hand.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Contact {
    pub id: String,
    pub email: String,
    pub name: String,
    pub company: String,
    /// Lowercased part of the email after `@`.
    pub domain: String,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_account_name: Option<String>,
    /// The user has accepted or rejected the suggestion.
    pub suggestion_confirmed: bool,
    /// "manual" or "note".
    pub source: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub meeting_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateContactRequest {
    pub email: String,
    pub name: String,
    pub company: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub company: Option<String>,
    /// `Some("")` clears the link.
    pub account_id: Option<String>,
}

impl UpdateContactRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.company.is_none() && self.account_id.is_none()
    }
}

/// Response body for a freshly created contact.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreatedContact {
    pub id: String,
    pub email: String,
}

/// Result of an upsert by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The email was blank after normalization.
    Skipped,
    Created { contact_id: String, domain: String },
    Updated { contact_id: String },
}

/// Per-call summary of participant extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Named filter for contact listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactFilter {
    #[default]
    All,
    Internal,
    External,
    /// External contacts with no linked account.
    Unlinked,
    /// Contacts with an undecided suggestion.
    Suggestions,
}

impl ContactFilter {
    /// Parse the `filter` query value. Unknown or blank values list everything.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("internal") => ContactFilter::Internal,
            Some("external") => ContactFilter::External,
            Some("unlinked") => ContactFilter::Unlinked,
            Some("suggestions") => ContactFilter::Suggestions,
            _ => ContactFilter::All,
        }
    }

    /// SQL predicate over the `contacts c` alias, or None for no restriction.
    pub fn predicate(&self) -> Option<&'static str> {
        match self {
            ContactFilter::All => None,
            ContactFilter::Internal => Some("c.is_internal = TRUE"),
            ContactFilter::External => Some("c.is_internal = FALSE"),
            ContactFilter::Unlinked => Some("c.account_id IS NULL AND c.is_internal = FALSE"),
            ContactFilter::Suggestions => Some(
                "c.suggested_account_id IS NOT NULL AND c.suggestion_confirmed = FALSE",
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListContactsRequest {
    pub filter: ContactFilter,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContactStats {
    pub total: i64,
    pub internal: i64,
    pub external: i64,
    pub linked: i64,
    pub pending_suggestions: i64,
}

/// A validated bulk contact action.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkContactAction {
    Delete,
    SetInternal(bool),
    /// `None` clears the account link.
    SetAccount(Option<String>),
}

impl BulkContactAction {
    /// Validate the wire form `{action, value}`.
    pub fn parse(action: &str, value: Option<&serde_json::Value>) -> Result<Self> {
        match action {
            "delete" => Ok(BulkContactAction::Delete),
            "set_internal" => value
                .and_then(|v| v.get("is_internal"))
                .and_then(serde_json::Value::as_bool)
                .map(BulkContactAction::SetInternal)
                .ok_or_else(|| Error::InvalidInput("Invalid value for is_internal".to_string())),
            "set_account" => value
                .and_then(|v| v.get("account_id"))
                .and_then(serde_json::Value::as_str)
                .map(|id| {
                    let id = id.trim();
                    BulkContactAction::SetAccount((!id.is_empty()).then(|| id.to_string()))
                })
                .ok_or_else(|| Error::InvalidInput("Invalid value for account_id".to_string())),
            other => Err(Error::InvalidInput(format!("Invalid action '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainGroupFilter {
    #[default]
    All,
    /// Only contacts without an account.
    Unlinked,
}

impl DomainGroupFilter {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("unlinked") => DomainGroupFilter::Unlinked,
            _ => DomainGroupFilter::All,
        }
    }
}

/// External contacts sharing a domain, with a linked or suggested account.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DomainGroup {
    pub domain: String,
    pub contact_count: i64,
    pub contact_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_account: Option<AccountRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<Contact>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DomainLinkResult {
    pub contacts_updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DomainAccountCreated {
    pub account_id: String,
    pub account_name: String,
    pub contacts_updated: u64,
}

// =============================================================================
// SEARCH TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchResultKind {
    Note,
    Account,
    Todo,
}

/// One row of a unified search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: SearchResultKind,
    pub id: String,
    pub title: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl SearchResult {
    /// Dedup key: an id is unique within its kind.
    pub fn key(&self) -> (SearchResultKind, &str) {
        (self.kind, self.id.as_str())
    }
}

/// Full-text note hit with a highlighted excerpt.
#[derive(Debug, Clone)]
pub struct NoteTextHit {
    pub id: String,
    pub title: String,
    pub account_id: String,
    pub headline: String,
}

/// Note whose participant lists contain the query.
#[derive(Debug, Clone)]
pub struct NoteParticipantHit {
    pub id: String,
    pub title: String,
    pub account_id: String,
}

#[derive(Debug, Clone)]
pub struct AccountHit {
    pub id: String,
    pub name: String,
    pub account_owner: String,
}

#[derive(Debug, Clone)]
pub struct TodoHit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub account_id: Option<String>,
    pub account_name: Option<String>,
}

// =============================================================================
// ANALYTICS AND EXPORT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccountNoteCount {
    pub account_id: String,
    pub account_name: String,
    pub note_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Analytics {
    pub total_notes: i64,
    pub total_accounts: i64,
    pub total_todos: i64,
    pub todos_by_status: std::collections::BTreeMap<String, i64>,
    pub notes_by_account: Vec<AccountNoteCount>,
    pub incomplete_count: i64,
}

/// A note with one or more empty fields worth filling in.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct IncompleteNote {
    pub note_id: String,
    pub note_title: String,
    pub account_name: String,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataExport {
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub notes: Vec<Note>,
    pub todos: Vec<Todo>,
    pub tags: Vec<Tag>,
    pub contacts: Vec<Contact>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deletion_state_of() {
        assert_eq!(DeletionState::of(None), DeletionState::Active);
        assert_eq!(DeletionState::of(Some(Utc::now())), DeletionState::Trashed);
    }

    #[test]
    fn test_deletion_state_transitions() {
        use DeletionState::*;
        assert!(Active.can_transition_to(Trashed));
        assert!(Trashed.can_transition_to(Active));
        assert!(Trashed.can_transition_to(Purged));
        assert!(Active.can_transition_to(Purged));
        assert!(!Purged.can_transition_to(Active));
        assert!(!Active.can_transition_to(Active));
        assert!(!Trashed.can_transition_to(Trashed));
    }

    #[test]
    fn test_todo_status_round_trip_strings() {
        for status in [
            TodoStatus::NotStarted,
            TodoStatus::InProgress,
            TodoStatus::Stuck,
            TodoStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<TodoStatus>().unwrap(), status);
        }
        assert!(matches!(
            "done".parse::<TodoStatus>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_todo_defaults() {
        assert_eq!(TodoStatus::default(), TodoStatus::NotStarted);
        assert_eq!(TodoPriority::default(), TodoPriority::Medium);
        assert!("urgent".parse::<TodoPriority>().is_err());
    }

    #[test]
    fn test_contact_filter_parse() {
        assert_eq!(ContactFilter::parse(Some("internal")), ContactFilter::Internal);
        assert_eq!(ContactFilter::parse(Some("external")), ContactFilter::External);
        assert_eq!(ContactFilter::parse(Some("unlinked")), ContactFilter::Unlinked);
        assert_eq!(
            ContactFilter::parse(Some("suggestions")),
            ContactFilter::Suggestions
        );
        assert_eq!(ContactFilter::parse(Some("bogus")), ContactFilter::All);
        assert_eq!(ContactFilter::parse(None), ContactFilter::All);
        assert!(ContactFilter::All.predicate().is_none());
    }

    #[test]
    fn test_unlinked_filter_is_external_only() {
        let predicate = ContactFilter::Unlinked.predicate().unwrap();
        assert!(predicate.contains("account_id IS NULL"));
        assert!(predicate.contains("is_internal = FALSE"));
    }

    #[test]
    fn test_bulk_action_delete_ignores_value() {
        assert_eq!(
            BulkContactAction::parse("delete", None).unwrap(),
            BulkContactAction::Delete
        );
    }

    #[test]
    fn test_bulk_action_set_internal() {
        let value = json!({"is_internal": true});
        assert_eq!(
            BulkContactAction::parse("set_internal", Some(&value)).unwrap(),
            BulkContactAction::SetInternal(true)
        );
        let bad = json!({"is_internal": "yes"});
        assert!(BulkContactAction::parse("set_internal", Some(&bad)).is_err());
        assert!(BulkContactAction::parse("set_internal", None).is_err());
    }

    #[test]
    fn test_bulk_action_set_account() {
        let value = json!({"account_id": "acc-1"});
        assert_eq!(
            BulkContactAction::parse("set_account", Some(&value)).unwrap(),
            BulkContactAction::SetAccount(Some("acc-1".to_string()))
        );
        let clear = json!({"account_id": ""});
        assert_eq!(
            BulkContactAction::parse("set_account", Some(&clear)).unwrap(),
            BulkContactAction::SetAccount(None)
        );
        assert!(BulkContactAction::parse("set_account", Some(&json!({}))).is_err());
    }

    #[test]
    fn test_bulk_action_unknown() {
        let err = BulkContactAction::parse("merge", None).unwrap_err();
        assert!(err.to_string().contains("Invalid action"));
    }

    #[test]
    fn test_search_result_serializes_type_field() {
        let result = SearchResult {
            kind: SearchResultKind::Account,
            id: "a1".to_string(),
            title: "Acme".to_string(),
            snippet: String::new(),
            account_id: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "account");
        assert!(value.get("account_id").is_none());
    }

    #[test]
    fn test_activity_serializes_type_field() {
        let activity = Activity {
            id: "x".to_string(),
            account_id: "a".to_string(),
            activity_type: "note_created".to_string(),
            title: "Kickoff".to_string(),
            description: None,
            entity_type: Some("note".to_string()),
            entity_id: Some("n".to_string()),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["type"], "note_created");
    }

    #[test]
    fn test_update_requests_detect_empty() {
        assert!(UpdateNoteRequest::default().is_empty());
        assert!(UpdateTodoRequest::default().is_empty());
        assert!(UpdateAccountRequest::default().is_empty());
        assert!(UpdateContactRequest::default().is_empty());

        let update = UpdateNoteRequest {
            external_participants: Some(vec![]),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert!(update.touches_participants());

        let clear_date = UpdateNoteRequest {
            meeting_date: Some(None),
            ..Default::default()
        };
        assert!(!clear_date.is_empty());
    }
}
