//! End-to-end tests against a running API server.
//!
//! Set `API_BASE_URL` (for example `http://localhost:8080`) to enable them;
//! without it every test skips. The server's `INTERNAL_DOMAIN` must be
//! `example.com`.

use serde_json::{json, Value};
use uuid::Uuid;

fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

async fn api_available() -> bool {
    if std::env::var("API_BASE_URL").is_err() {
        return false;
    }
    reqwest::Client::new()
        .get(format!("{}/health", api_base_url()))
        .timeout(std::time::Duration::from_secs(2))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

macro_rules! require_api {
    () => {
        if !api_available().await {
            eprintln!(
                "Skipping: API_BASE_URL not set or server not available at {}",
                api_base_url()
            );
            return;
        }
    };
}

fn token() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

async fn post(client: &reqwest::Client, path: &str, body: Value) -> (u16, Value) {
    let response = client
        .post(format!("{}/api{}", api_base_url(), path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn get(client: &reqwest::Client, path: &str) -> (u16, Value) {
    let response = client
        .get(format!("{}/api{}", api_base_url(), path))
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn delete(client: &reqwest::Client, path: &str) -> u16 {
    client
        .delete(format!("{}/api{}", api_base_url(), path))
        .send()
        .await
        .unwrap()
        .status()
        .as_u16()
}

/// Poll until the background extraction has created the contact.
async fn wait_for_contact(client: &reqwest::Client, email: &str) -> Option<Value> {
    for _ in 0..20 {
        let (_, contacts) = get(client, "/contacts").await;
        if let Some(found) = contacts
            .as_array()
            .and_then(|list| list.iter().find(|c| c["email"] == email))
        {
            return Some(found.clone());
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    None
}

#[tokio::test]
async fn test_note_creation_resolves_participants() {
    require_api!();
    let client = reqwest::Client::new();
    let t = token();

    let (status, account) = post(&client, "/accounts", json!({ "name": format!("Acme{} Corp", t) })).await;
    assert_eq!(status, 201);
    let account_id = account["id"].as_str().unwrap().to_string();

    let external = format!("jane@acme{}.com", t);
    let internal = format!("me-{}@example.com", t);
    let (status, note) = post(
        &client,
        "/notes",
        json!({
            "title": "Discovery call",
            "account_id": account_id,
            "internal_participants": [internal],
            "external_participants": [external.to_uppercase()],
            "content": format!("<p>pricing{} review</p>", t)
        }),
    )
    .await;
    assert_eq!(status, 201);
    let note_id = note["id"].as_str().unwrap().to_string();

    let contact = wait_for_contact(&client, &external)
        .await
        .expect("external contact created");
    assert_eq!(contact["is_internal"], false);
    assert_eq!(contact["suggested_account_id"], account_id.as_str());

    let me = wait_for_contact(&client, &internal)
        .await
        .expect("internal contact created");
    assert_eq!(me["is_internal"], true);
    assert!(me.get("suggested_account_id").map_or(true, Value::is_null));

    let contact_id = contact["id"].as_str().unwrap().to_string();
    let (status, _) = post(
        &client,
        &format!("/contacts/{}/confirm-suggestion", contact_id),
        json!({ "confirm": true }),
    )
    .await;
    assert_eq!(status, 200);
    let (_, confirmed) = get(&client, &format!("/contacts/{}", contact_id)).await;
    assert_eq!(confirmed["account_id"], account_id.as_str());

    let (status, notes) = get(&client, &format!("/contacts/{}/notes", contact_id)).await;
    assert_eq!(status, 200);
    assert!(notes.as_array().unwrap().iter().any(|n| n["id"] == note_id.as_str()));

    delete(&client, &format!("/contacts/{}", contact_id)).await;
    if let Some(me_id) = me["id"].as_str() {
        delete(&client, &format!("/contacts/{}", me_id)).await;
    }
    assert_eq!(delete(&client, &format!("/accounts/{}", account_id)).await, 204);
}

#[tokio::test]
async fn test_unified_search_across_kinds() {
    require_api!();
    let client = reqwest::Client::new();
    let t = token();

    let (_, account) = post(
        &client,
        "/accounts",
        json!({ "name": format!("Zeta{}", t), "account_owner": "Dana" }),
    )
    .await;
    let account_id = account["id"].as_str().unwrap().to_string();

    let (_, note) = post(
        &client,
        "/notes",
        json!({
            "title": "Roadmap",
            "account_id": account_id,
            "content": format!("<p>zeta{} roadmap planning</p>", t)
        }),
    )
    .await;
    let (_, todo) = post(
        &client,
        "/todos",
        json!({
            "title": format!("Send zeta{} proposal", t),
            "account_id": account_id
        }),
    )
    .await;

    let (status, results) = get(&client, &format!("/search?q=zeta{}", t)).await;
    assert_eq!(status, 200);
    let results = results.as_array().unwrap();

    let kinds: Vec<&str> = results.iter().filter_map(|r| r["type"].as_str()).collect();
    assert!(kinds.contains(&"note"));
    assert!(kinds.contains(&"account"));
    assert!(kinds.contains(&"todo"));

    let note_hit = results.iter().find(|r| r["id"] == note["id"]).unwrap();
    assert!(note_hit["snippet"].as_str().unwrap().contains("<mark>"));
    let todo_hit = results.iter().find(|r| r["id"] == todo["id"]).unwrap();
    assert!(todo_hit["snippet"]
        .as_str()
        .unwrap()
        .ends_with(&format!("Account: Zeta{}", t)));

    let mut keys: Vec<(String, String)> = results
        .iter()
        .map(|r| (r["type"].to_string(), r["id"].to_string()))
        .collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total, "search results must be unique per kind and id");

    // Trashed notes drop out of search
    let note_id = note["id"].as_str().unwrap();
    assert_eq!(delete(&client, &format!("/notes/{}", note_id)).await, 204);
    let (_, results) = get(&client, &format!("/search?q=zeta{}", t)).await;
    assert!(!results
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"] == note_id));

    let todo_id = todo["id"].as_str().unwrap();
    delete(&client, &format!("/todos/{}", todo_id)).await;
    delete(&client, &format!("/todos/{}/permanent", todo_id)).await;
    delete(&client, &format!("/accounts/{}", account_id)).await;
}

#[tokio::test]
async fn test_quick_capture_note_goes_to_unassigned() {
    require_api!();
    let client = reqwest::Client::new();

    let (status, created) = post(
        &client,
        "/quick-capture",
        json!({ "type": "note", "title": format!("Idea {}", token()) }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["type"], "note");

    let account_id = created["account_id"].as_str().unwrap();
    let (_, account) = get(&client, &format!("/accounts/{}", account_id)).await;
    assert_eq!(account["name"], "Unassigned");

    let note_id = created["id"].as_str().unwrap();
    let (_, note) = get(&client, &format!("/notes/{}", note_id)).await;
    assert_eq!(note["template_type"], "quick");
    delete(&client, &format!("/notes/{}", note_id)).await;
    delete(&client, &format!("/notes/{}/permanent", note_id)).await;
}
