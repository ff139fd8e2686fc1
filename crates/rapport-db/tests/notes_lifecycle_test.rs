//! Integration tests for the note and todo deletion lifecycle.
//!
//! Run with a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p rapport-db -- --ignored`

use chrono::{TimeZone, Utc};
use rapport_db::test_fixtures::{unique_suffix, TestDatabase};
use rapport_db::{
    CreateNoteRequest, CreateTodoRequest, DeletionState, Error, NoteListScope, NoteRepository,
    TodoRepository, UpdateNoteRequest,
};

async fn setup() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

fn note_request(account_id: &str, title: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        title: title.to_string(),
        account_id: account_id.to_string(),
        content: "<p>notes</p>".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_soft_delete_restore_purge() {
    let test_db = setup().await;
    let account = test_db
        .account(&format!("Lifecycle {}", unique_suffix()))
        .await;
    let notes = &test_db.db.notes;

    let note = notes.create(note_request(&account.id, "Weekly sync")).await.unwrap();
    assert_eq!(note.deletion_state(), DeletionState::Active);
    assert_eq!(note.account_name.as_deref(), Some(account.name.as_str()));

    notes.soft_delete(&note.id).await.unwrap();
    assert!(matches!(notes.get(&note.id).await.unwrap_err(), Error::NotFound(_)));
    let trash = notes.list(NoteListScope::Trash).await.unwrap();
    assert!(trash.iter().any(|n| n.id == note.id));

    // Trashed notes cannot be trashed again.
    assert!(matches!(
        notes.soft_delete(&note.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    notes.restore(&note.id).await.unwrap();
    assert_eq!(notes.get(&note.id).await.unwrap().deletion_state(), DeletionState::Active);
    assert!(matches!(notes.restore(&note.id).await.unwrap_err(), Error::NotFound(_)));

    notes.purge(&note.id).await.unwrap();
    assert!(matches!(notes.purge(&note.id).await.unwrap_err(), Error::NotFound(_)));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_rejects_missing_account() {
    let test_db = setup().await;
    let err = test_db
        .db
        .notes
        .create(note_request(&format!("missing-{}", unique_suffix()), "Orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = test_db
        .db
        .notes
        .create(note_request("", "No account"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_and_flags() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Flags {}", unique_suffix())).await;
    let notes = &test_db.db.notes;
    let note = notes.create(note_request(&account.id, "Draft")).await.unwrap();

    let updated = notes
        .update(
            &note.id,
            UpdateNoteRequest {
                title: Some("Final".to_string()),
                external_participants: Some(vec![" a@b.com ".to_string(), "".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.external_participants, vec!["a@b.com".to_string()]);

    let err = notes
        .update(&note.id, UpdateNoteRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    assert!(notes.toggle_pin(&note.id).await.unwrap());
    assert!(!notes.toggle_pin(&note.id).await.unwrap());
    assert!(notes.toggle_archive(&note.id).await.unwrap());
    let archived = notes.list(NoteListScope::Archived).await.unwrap();
    assert!(archived.iter().any(|n| n.id == note.id));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_clears_meeting_date() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Dates {}", unique_suffix())).await;
    let notes = &test_db.db.notes;
    let when = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
    let note = notes
        .create(CreateNoteRequest {
            meeting_date: Some(when),
            ..note_request(&account.id, "Kickoff")
        })
        .await
        .unwrap();
    assert_eq!(note.meeting_date, Some(when));

    let updated = notes
        .update(
            &note.id,
            UpdateNoteRequest {
                meeting_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.meeting_date, None);
    assert_eq!(updated.title, "Kickoff");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_todo_linked_to_note() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Todos {}", unique_suffix())).await;
    let note = test_db
        .db
        .notes
        .create(note_request(&account.id, "Planning"))
        .await
        .unwrap();
    let todos = &test_db.db.todos;

    let todo = todos
        .create(CreateTodoRequest {
            title: "Send proposal".to_string(),
            account_id: Some(account.id.clone()),
            note_id: Some(note.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(todo.account_name.as_deref(), Some(account.name.as_str()));
    assert_eq!(todo.notes.len(), 1);

    let note = test_db.db.notes.get(&note.id).await.unwrap();
    assert!(note.todos.iter().any(|t| t.id == todo.id));

    todos.unlink_note(&todo.id, &note.id).await.unwrap();
    assert!(matches!(
        todos.unlink_note(&todo.id, &note.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    todos.soft_delete(&todo.id).await.unwrap();
    assert!(todos.list_deleted().await.unwrap().iter().any(|t| t.id == todo.id));
    todos.restore(&todo.id).await.unwrap();
    todos.purge(&todo.id).await.unwrap();

    test_db.cleanup().await;
}
