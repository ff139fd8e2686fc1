//! Router tests backed by a migrated PostgreSQL database.
//!
//! Run with:
//! `DATABASE_URL=postgres://... cargo test -p rapport-api --test router_db_test -- --ignored`

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use rapport_api::{build_router, AppConfig, AppState};
use rapport_db::test_fixtures::{
    unique_suffix, TestDatabase, DEFAULT_TEST_DATABASE_URL, TEST_INTERNAL_DOMAIN,
};
use rapport_db::{
    create_lazy_pool, AccountRepository, ContactRepository, Database, ListContactsRequest,
    NoteRepository, PgContactRepository, PoolConfig,
};

const BOUNDARY: &str = "rapport-test-boundary";

fn test_config(uploads_dir: &std::path::Path) -> AppConfig {
    let uploads = uploads_dir.to_string_lossy().to_string();
    AppConfig::from_lookup(move |key| match key {
        "INTERNAL_DOMAIN" => Some(TEST_INTERNAL_DOMAIN.to_string()),
        "UPLOADS_DIR" => Some(uploads.clone()),
        _ => None,
    })
    .unwrap()
}

async fn setup() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

/// A second connection to the test database for the router to own.
async fn connect() -> Database {
    setup().await.db
}

fn app(db: Database, uploads_dir: &std::path::Path) -> Router {
    let config = test_config(uploads_dir);
    let db = db.with_filesystem_storage(&config.uploads_dir);
    build_router(AppState::new(db), &config)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body with text fields and at most one `file` field.
fn post_multipart(uri: &str, fields: &[(&str, &str)], file: Option<(&str, &str)>) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    if let Some((filename, contents)) = file {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: text/plain\r\n\r\n{}\r\n",
            BOUNDARY, filename, contents
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_markdown_import_creates_note() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Import {}", unique_suffix())).await;
    let dir = tempfile::tempdir().unwrap();

    let response = app(connect().await, dir.path())
        .oneshot(post_multipart(
            "/api/import/markdown",
            &[("account_id", &account.id)],
            Some((
                "q3-review.md",
                "# Q3 review\n\n## Risks\n- Renewal slipping\nFollow up next week.",
            )),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["title"], "Q3 review");

    let note = test_db
        .db
        .notes
        .get(body["id"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(note.account_id, account.id);
    assert_eq!(note.template_type, "imported");
    assert_eq!(
        note.content,
        "<h2>Risks</h2><ul><li>Renewal slipping</li></ul><p>Follow up next week.</p>"
    );

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_attachment_download_and_missing_file() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Files {}", unique_suffix())).await;
    let dir = tempfile::tempdir().unwrap();
    let router = app(connect().await, dir.path());

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/notes",
            json!({"title": "Has files", "account_id": account.id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let note_id = json_body(response).await["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(post_multipart(
            &format!("/api/notes/{}/attachments", note_id),
            &[],
            Some(("agenda.txt", "1. pricing")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let attachment = json_body(response).await;
    let attachment_id = attachment["id"].as_str().unwrap().to_string();
    let uri = format!("/api/notes/{}/attachments/{}", note_id, attachment_id);

    let response = router
        .clone()
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"agenda.txt\""
    );
    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"1. pricing");

    // Another note's id does not reach this attachment.
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/notes/other/attachments/{}", attachment_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    std::fs::remove_file(dir.path().join(attachment["filename"].as_str().unwrap())).unwrap();
    let response = router
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Attachment file not found");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_note_create_survives_failed_contact_extraction() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Extract {}", unique_suffix())).await;
    let dir = tempfile::tempdir().unwrap();

    // Contact writes go through a pool that is already closed.
    let mut db = connect().await;
    let closed = create_lazy_pool(
        &std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string()),
        PoolConfig::default(),
    )
    .unwrap();
    closed.close().await;
    db.contacts = PgContactRepository::new(closed, db.internal_domain().clone());

    let email = format!("guest-{}@partner.io", unique_suffix());
    let response = app(db, dir.path())
        .oneshot(post_json(
            "/api/notes",
            json!({
                "title": "Partner sync",
                "account_id": account.id,
                "external_participants": [email],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let note_id = json_body(response).await["id"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let note = test_db.db.notes.get(&note_id).await.unwrap();
    assert_eq!(note.external_participants, vec![email.clone()]);
    let contacts = test_db
        .db
        .contacts
        .list(&ListContactsRequest::default())
        .await
        .unwrap();
    assert!(contacts.iter().all(|c| c.email != email));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Truncates every table; run alone against a disposable database
async fn test_clear_all_data_empties_tables_and_uploads() {
    let test_db = setup().await;
    let account = test_db.account(&format!("Doomed {}", unique_suffix())).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("old-upload.txt"), b"bytes").unwrap();

    let response = app(connect().await, dir.path())
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/data")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        "All data cleared successfully"
    );
    assert!(test_db.db.accounts.list().await.unwrap().is_empty());
    assert!(test_db.db.accounts.get(&account.id).await.is_err());
    assert!(!dir.path().join("old-upload.txt").exists());
}
