//! Integration tests for the PostgreSQL search lookups.
//!
//! Run with a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p rapport-db -- --ignored`

use rapport_db::test_fixtures::{unique_suffix, TestDatabase};
use rapport_db::{
    AccountRepository, CreateAccountRequest, CreateNoteRequest, CreateTodoRequest,
    NoteRepository, SearchSource, TodoRepository,
};

async fn setup() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_prefix_text_match_highlights_content() {
    let test_db = setup().await;
    let suffix = unique_suffix();
    let account = test_db.account(&format!("Search Co {}", suffix)).await;
    let word = format!("kickoff{}", suffix);

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest {
            title: "Kickoff call".to_string(),
            account_id: account.id.clone(),
            content: format!("<p>{} agenda</p>", word),
            ..Default::default()
        })
        .await
        .unwrap();

    let hits = test_db
        .db
        .search
        .notes_by_text(&format!("{}:*", word), 20)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, note.id);
    assert_eq!(hits[0].account_id, account.id);
    assert!(hits[0].headline.contains("<mark>"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_trashed_rows_never_match() {
    let test_db = setup().await;
    let suffix = unique_suffix();
    let account = test_db.account(&format!("Trash Co {}", suffix)).await;
    let word = format!("roadmap{}", suffix);

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest {
            title: format!("{} review", word),
            account_id: account.id.clone(),
            external_participants: vec![format!("{}@partner.io", word)],
            ..Default::default()
        })
        .await
        .unwrap();
    let todo = test_db
        .db
        .todos
        .create(CreateTodoRequest {
            title: format!("Send {}", word),
            ..Default::default()
        })
        .await
        .unwrap();

    let search = &test_db.db.search;
    assert_eq!(search.notes_by_text(&format!("{}:*", word), 20).await.unwrap().len(), 1);
    assert_eq!(search.notes_by_participant(&word, 10).await.unwrap().len(), 1);
    assert_eq!(search.todos(&word, 10).await.unwrap().len(), 1);

    test_db.db.notes.soft_delete(&note.id).await.unwrap();
    test_db.db.todos.soft_delete(&todo.id).await.unwrap();

    assert!(search.notes_by_text(&format!("{}:*", word), 20).await.unwrap().is_empty());
    assert!(search.notes_by_participant(&word, 10).await.unwrap().is_empty());
    assert!(search.todos(&word, 10).await.unwrap().is_empty());

    test_db.db.todos.purge(&todo.id).await.unwrap();
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_account_lookup_matches_owner_case_insensitively() {
    let test_db = setup().await;
    let suffix = unique_suffix();
    let owner = format!("Dana{}", suffix);
    let account = test_db
        .db
        .accounts
        .create(CreateAccountRequest {
            name: format!("Owner Co {}", suffix),
            account_owner: owner.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    let hits = test_db
        .db
        .search
        .accounts(&owner.to_uppercase(), 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, account.id);
    assert_eq!(hits[0].account_owner, owner);

    rapport_db::AccountRepository::delete(&test_db.db.accounts, &account.id)
        .await
        .unwrap();
}
