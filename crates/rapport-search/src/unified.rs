//! Unified search engine.
//!
//! Four independent lookups run concurrently and are merged in a fixed
//! order: full-text note hits, participant note hits, accounts, todos.
//! A `(type, id)` pair that already appeared is never added again.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, instrument};

use rapport_core::defaults::{
    ACCOUNT_LIMIT, FULLTEXT_NOTE_LIMIT, PARTICIPANT_NOTE_LIMIT, PARTICIPANT_SNIPPET, TODO_LIMIT,
};
use rapport_core::{
    AccountHit, Error, NoteParticipantHit, NoteTextHit, Result, SearchResult, SearchResultKind,
    SearchSource, TodoHit,
};

use crate::snippets::{account_snippet, todo_snippet};
use crate::tsquery::prefix_tsquery;

/// Raw hits of each lookup, in the lookup's own order.
#[derive(Debug, Clone, Default)]
pub struct SearchStreams {
    pub text: Vec<NoteTextHit>,
    pub participants: Vec<NoteParticipantHit>,
    pub accounts: Vec<AccountHit>,
    pub todos: Vec<TodoHit>,
}

/// Concatenate the streams in merge order and drop repeated `(type, id)` keys.
///
/// `query` is the trimmed user query; account and todo snippets depend on
/// which field it matched.
pub fn merge_streams(streams: SearchStreams, query: &str) -> Vec<SearchResult> {
    let SearchStreams {
        text,
        participants,
        accounts,
        todos,
    } = streams;

    let candidates = text
        .into_iter()
        .map(|hit| SearchResult {
            kind: SearchResultKind::Note,
            id: hit.id,
            title: hit.title,
            snippet: hit.headline,
            account_id: Some(hit.account_id),
        })
        .chain(participants.into_iter().map(|hit| SearchResult {
            kind: SearchResultKind::Note,
            id: hit.id,
            title: hit.title,
            snippet: PARTICIPANT_SNIPPET.to_string(),
            account_id: Some(hit.account_id),
        }))
        .chain(accounts.into_iter().map(|hit| SearchResult {
            kind: SearchResultKind::Account,
            snippet: account_snippet(&hit.account_owner, query),
            id: hit.id,
            title: hit.name,
            account_id: None,
        }))
        .chain(todos.into_iter().map(|hit| SearchResult {
            kind: SearchResultKind::Todo,
            snippet: todo_snippet(&hit.description, hit.account_name.as_deref(), query),
            id: hit.id,
            title: hit.title,
            account_id: hit.account_id,
        }));

    let mut seen: HashSet<(SearchResultKind, String)> = HashSet::new();
    candidates
        .filter(|result| seen.insert((result.kind, result.id.clone())))
        .collect()
}

/// Trait for unified search.
#[async_trait]
pub trait UnifiedSearch: Send + Sync {
    /// Search notes, accounts and todos.
    ///
    /// Fails with `Error::InvalidInput` when the query is blank. A query that
    /// matches nothing yields an empty list.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Unified search over any [`SearchSource`].
#[derive(Clone)]
pub struct UnifiedSearchEngine {
    source: Arc<dyn SearchSource>,
}

impl UnifiedSearchEngine {
    pub fn new(source: Arc<dyn SearchSource>) -> Self {
        Self { source }
    }
}

async fn timed<T, F>(stream: &'static str, lookup: F) -> Result<Vec<T>>
where
    F: Future<Output = Result<Vec<T>>>,
{
    let start = Instant::now();
    let hits = lookup.await?;
    debug!(
        stream,
        result_count = hits.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Search stream complete"
    );
    Ok(hits)
}

#[async_trait]
impl UnifiedSearch for UnifiedSearchEngine {
    #[instrument(skip(self), fields(
        subsystem = "search",
        component = "unified_search",
        op = "search",
        result_count = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    ))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput(
                "Query parameter 'q' is required".to_string(),
            ));
        }

        let tsquery = prefix_tsquery(query);
        let text = async {
            match tsquery.as_deref() {
                Some(tsquery) => self.source.notes_by_text(tsquery, FULLTEXT_NOTE_LIMIT).await,
                None => Ok(Vec::new()),
            }
        };

        let (text, participants, accounts, todos) = futures::try_join!(
            timed("notes_by_text", text),
            timed(
                "notes_by_participant",
                self.source.notes_by_participant(query, PARTICIPANT_NOTE_LIMIT)
            ),
            timed("accounts", self.source.accounts(query, ACCOUNT_LIMIT)),
            timed("todos", self.source.todos(query, TODO_LIMIT)),
        )?;

        let results = merge_streams(
            SearchStreams {
                text,
                participants,
                accounts,
                todos,
            },
            query,
        );

        let span = tracing::Span::current();
        span.record("result_count", results.len());
        span.record("duration_ms", start.elapsed().as_millis() as u64);
        Ok(results)
    }
}
