//! Centralized default constants for rapport.
//!
//! Search limits, heuristic tables and fallback values live here so the
//! database, search and API crates agree on them.

// =============================================================================
// UNIFIED SEARCH
// =============================================================================

/// Maximum hits taken from the full-text note stream.
pub const FULLTEXT_NOTE_LIMIT: i64 = 20;

/// Maximum hits taken from the participant substring stream.
pub const PARTICIPANT_NOTE_LIMIT: i64 = 10;

/// Maximum hits taken from the account stream.
pub const ACCOUNT_LIMIT: i64 = 10;

/// Maximum hits taken from the todo stream.
pub const TODO_LIMIT: i64 = 10;

/// Snippet used for notes that matched only through their participant lists.
pub const PARTICIPANT_SNIPPET: &str = "Match in participants";

/// Number of description characters kept in a todo snippet.
pub const TODO_SNIPPET_CHARS: usize = 100;

/// Highlight markers wrapped around full-text matches.
pub const HIGHLIGHT_START: &str = "<mark>";
pub const HIGHLIGHT_STOP: &str = "</mark>";

/// Text search configuration used for the note index.
pub const TEXT_SEARCH_CONFIG: &str = "english";

// =============================================================================
// CONTACTS
// =============================================================================

/// Suffixes stripped from a domain to derive the company token.
/// Checked in order; only the first match is removed.
pub const COMPANY_SUFFIXES: [&str; 4] = [".com", ".io", ".ai", ".co"];

/// Source tag for contacts created through the API.
pub const SOURCE_MANUAL: &str = "manual";

/// Source tag for contacts discovered in note participant lists.
pub const SOURCE_NOTE: &str = "note";

/// Maximum notes returned for a single contact.
pub const CONTACT_NOTES_LIMIT: i64 = 50;

// =============================================================================
// NOTES, TAGS, ACTIVITIES
// =============================================================================

/// Template assigned when a note is created without one.
pub const DEFAULT_TEMPLATE_TYPE: &str = "initial";

/// Template assigned to notes created through quick capture.
pub const QUICK_TEMPLATE_TYPE: &str = "quick";

/// Template assigned to notes imported from Markdown files.
pub const IMPORTED_TEMPLATE_TYPE: &str = "imported";

/// Account that receives quick-capture and imported notes without an explicit account.
pub const UNASSIGNED_ACCOUNT: &str = "Unassigned";

/// Color assigned when a tag is created without one.
pub const DEFAULT_TAG_COLOR: &str = "#6b7280";

/// Default page size for account activity feeds.
pub const ACTIVITY_LIMIT: i64 = 50;
