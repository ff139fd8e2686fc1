//! Core traits for rapport abstractions.
//!
//! These traits define the interfaces the PostgreSQL layer implements and the
//! search engine consumes, so each side can be exercised with a stand-in.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// ACCOUNT REPOSITORY
// =============================================================================

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// All accounts ordered by name.
    async fn list(&self) -> Result<Vec<Account>>;

    async fn get(&self, id: &str) -> Result<Account>;

    async fn create(&self, req: CreateAccountRequest) -> Result<Account>;

    /// Apply a partial update and return the updated row.
    async fn update(&self, id: &str, req: UpdateAccountRequest) -> Result<Account>;

    /// Hard delete. Notes and activities of the account cascade.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Find the account with exactly this name, creating it if missing.
    async fn get_or_create_by_name(&self, name: &str) -> Result<Account>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn list(&self, scope: NoteListScope) -> Result<Vec<Note>>;

    /// Active, non-archived notes of one account in display order.
    async fn list_by_account(&self, account_id: &str) -> Result<Vec<Note>>;

    /// Active note with its todos, tags and attachments.
    async fn get(&self, id: &str) -> Result<Note>;

    async fn create(&self, req: CreateNoteRequest) -> Result<Note>;

    async fn update(&self, id: &str, req: UpdateNoteRequest) -> Result<Note>;

    /// Active -> Trashed.
    async fn soft_delete(&self, id: &str) -> Result<()>;

    /// Trashed -> Active.
    async fn restore(&self, id: &str) -> Result<()>;

    /// Active or Trashed -> Purged.
    async fn purge(&self, id: &str) -> Result<()>;

    /// Purge every trashed note, returning how many were removed.
    async fn empty_trash(&self) -> Result<u64>;

    /// Flip the pinned flag, returning the new value.
    async fn toggle_pin(&self, id: &str) -> Result<bool>;

    /// Flip the archived flag, returning the new value.
    async fn toggle_archive(&self, id: &str) -> Result<bool>;

    /// Set `sort_order` to each note's position in `note_ids`, atomically.
    async fn reorder(&self, account_id: &str, note_ids: &[String]) -> Result<()>;
}

// =============================================================================
// TODO REPOSITORY
// =============================================================================

#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn list(&self, status: Option<TodoStatus>) -> Result<Vec<Todo>>;

    async fn list_deleted(&self) -> Result<Vec<Todo>>;

    async fn get(&self, id: &str) -> Result<Todo>;

    async fn create(&self, req: CreateTodoRequest) -> Result<Todo>;

    async fn update(&self, id: &str, req: UpdateTodoRequest) -> Result<Todo>;

    async fn soft_delete(&self, id: &str) -> Result<()>;

    async fn restore(&self, id: &str) -> Result<()>;

    async fn purge(&self, id: &str) -> Result<()>;

    async fn toggle_pin(&self, id: &str) -> Result<bool>;

    async fn link_note(&self, todo_id: &str, note_id: &str) -> Result<()>;

    async fn unlink_note(&self, todo_id: &str, note_id: &str) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>>;

    async fn create(&self, name: &str, color: Option<&str>) -> Result<Tag>;

    async fn update(&self, id: &str, name: Option<&str>, color: Option<&str>) -> Result<Tag>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn list_for_note(&self, note_id: &str) -> Result<Vec<Tag>>;

    async fn add_to_note(&self, note_id: &str, tag_id: &str) -> Result<()>;

    async fn remove_from_note(&self, note_id: &str, tag_id: &str) -> Result<()>;
}

// =============================================================================
// ACTIVITY REPOSITORY
// =============================================================================

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Newest first.
    async fn list_for_account(&self, account_id: &str, limit: i64) -> Result<Vec<Activity>>;

    async fn create(&self, req: CreateActivityRequest) -> Result<Activity>;
}

// =============================================================================
// CONTACT REPOSITORY
// =============================================================================

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Contacts ordered by most recently seen.
    async fn list(&self, req: &ListContactsRequest) -> Result<Vec<Contact>>;

    async fn get(&self, id: &str) -> Result<Contact>;

    /// Create a contact by hand. Duplicate emails yield `Error::Conflict`.
    async fn create(&self, req: CreateContactRequest) -> Result<CreatedContact>;

    async fn update(&self, id: &str, req: UpdateContactRequest) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Create or refresh the contact for an email.
    ///
    /// New contacts start with `meeting_count = 1` and get an account
    /// suggestion. Existing contacts get `last_seen = now`, one more meeting,
    /// and a name only if they had none.
    async fn upsert_from_email(
        &self,
        email: &str,
        display_name: &str,
        source: &str,
    ) -> Result<UpsertOutcome>;

    /// Upsert every distinct participant email of a note.
    ///
    /// Individual failures are counted, never returned.
    async fn extract_from_note(
        &self,
        internal_participants: &[String],
        external_participants: &[String],
    ) -> ExtractionSummary;

    /// Suggest an account whose name contains the domain's company token.
    ///
    /// Returns the suggested account id when a suggestion was stored. Never
    /// touches a contact that already has an account.
    async fn suggest_account(&self, contact_id: &str, domain: &str) -> Result<Option<String>>;

    /// Accept (copy into `account_id`) or reject (clear) the suggestion.
    async fn confirm_suggestion(&self, contact_id: &str, confirm: bool) -> Result<()>;

    async fn link_to_account(&self, contact_id: &str, account_id: &str) -> Result<()>;

    /// Apply one action to many contacts in a single transaction.
    async fn bulk(&self, contact_ids: &[String], action: BulkContactAction) -> Result<u64>;

    async fn stats(&self) -> Result<ContactStats>;

    /// Active notes whose participant lists contain the contact's email.
    async fn notes_for_contact(&self, contact_id: &str) -> Result<Vec<NoteRef>>;

    async fn domain_groups(
        &self,
        filter: DomainGroupFilter,
        include_contacts: bool,
    ) -> Result<Vec<DomainGroup>>;

    /// Link every external contact of a domain to an account.
    async fn link_domain(&self, domain: &str, account_id: &str) -> Result<DomainLinkResult>;

    /// Create an account for a domain and link its external contacts to it.
    async fn create_account_from_domain(
        &self,
        domain: &str,
        account_name: Option<&str>,
    ) -> Result<DomainAccountCreated>;
}

// =============================================================================
// SEARCH SOURCE
// =============================================================================

/// The four independent lookups behind unified search.
///
/// Every lookup excludes trashed notes and todos.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Prefix full-text match over note title and content, best first.
    async fn notes_by_text(&self, tsquery: &str, limit: i64) -> Result<Vec<NoteTextHit>>;

    /// Case-insensitive containment over both participant lists.
    async fn notes_by_participant(
        &self,
        needle: &str,
        limit: i64,
    ) -> Result<Vec<NoteParticipantHit>>;

    /// Case-insensitive containment over account name and owner.
    async fn accounts(&self, needle: &str, limit: i64) -> Result<Vec<AccountHit>>;

    /// Case-insensitive containment over todo title and description.
    async fn todos(&self, needle: &str, limit: i64) -> Result<Vec<TodoHit>>;
}
