//! Prefix tsquery construction.
//!
//! User input never reaches `to_tsquery` verbatim: it is reduced to
//! alphanumeric tokens so operator characters cannot produce syntax errors.

/// Build a `to_tsquery` expression that matches every token, the last one as
/// a prefix.
///
/// `"Kickoff ag"` becomes `"kickoff & ag:*"`. Returns `None` when the input
/// has no searchable token.
pub fn prefix_tsquery(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();

    let (last, rest) = tokens.split_last()?;
    let mut parts: Vec<String> = rest.to_vec();
    parts.push(format!("{}:*", last));
    Some(parts.join(" & "))
}
