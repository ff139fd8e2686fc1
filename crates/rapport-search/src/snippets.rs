//! Snippet rules for substring hits.

use rapport_core::defaults::TODO_SNIPPET_CHARS;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `"Owner: <owner>"` when the owner field matched, otherwise empty.
pub fn account_snippet(account_owner: &str, query: &str) -> String {
    if !account_owner.is_empty() && contains_ci(account_owner, query) {
        format!("Owner: {}", account_owner)
    } else {
        String::new()
    }
}

/// Description excerpt when the description matched, followed by the linked
/// account name.
///
/// The excerpt keeps the first [`TODO_SNIPPET_CHARS`] characters and appends
/// `...` when it had to cut. The two parts are joined with `" | "`.
pub fn todo_snippet(description: &str, account_name: Option<&str>, query: &str) -> String {
    let mut snippet = String::new();
    if !description.is_empty() && contains_ci(description, query) {
        if description.chars().count() > TODO_SNIPPET_CHARS {
            snippet.extend(description.chars().take(TODO_SNIPPET_CHARS));
            snippet.push_str("...");
        } else {
            snippet.push_str(description);
        }
    }

    if let Some(name) = account_name.filter(|n| !n.is_empty()) {
        if !snippet.is_empty() {
            snippet.push_str(" | ");
        }
        snippet.push_str("Account: ");
        snippet.push_str(name);
    }
    snippet
}
