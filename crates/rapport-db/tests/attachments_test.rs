//! Integration tests for attachment storage.
//!
//! Run with a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p rapport-db -- --ignored`

use rapport_db::test_fixtures::{unique_suffix, TestDatabase};
use rapport_db::{CreateNoteRequest, Error, NoteRepository};

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_download_reads_stored_bytes_until_file_is_gone() {
    dotenvy::dotenv().ok();
    let dir = tempfile::tempdir().unwrap();
    let mut test_db = TestDatabase::new().await;
    test_db.db = test_db.db.with_filesystem_storage(&dir.path().to_string_lossy());
    let account = test_db.account(&format!("Attach {}", unique_suffix())).await;

    let note = test_db
        .db
        .notes
        .create(CreateNoteRequest {
            title: "Contract".to_string(),
            account_id: account.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    let attachments = test_db.db.attachments.as_ref().unwrap();

    let stored = attachments
        .store(&note.id, "msa.pdf", "application/pdf", b"%PDF-1.7")
        .await
        .unwrap();
    let (found, data) = attachments.download(&note.id, &stored.id).await.unwrap();
    assert_eq!(found.original_name, "msa.pdf");
    assert_eq!(data, b"%PDF-1.7");

    assert!(matches!(
        attachments.download("other-note", &stored.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    std::fs::remove_file(dir.path().join(&stored.filename)).unwrap();
    assert!(matches!(
        attachments.download(&note.id, &stored.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    attachments.delete(&note.id, &stored.id).await.unwrap();
    test_db.cleanup().await;
}
