//! Integration tests for contact resolution.
//!
//! Run with a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p rapport-db -- --ignored`

use rapport_db::test_fixtures::{unique_suffix, TestDatabase};
use rapport_db::{
    AccountRepository, BulkContactAction, ContactFilter, ContactRepository, CreateContactRequest,
    DomainGroupFilter, Error, ListContactsRequest, UpsertOutcome,
};

async fn setup() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_upsert_twice_counts_two_meetings() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;
    let email = format!("A{}@X.com", unique_suffix());

    let first = contacts
        .upsert_from_email(&email, "", "note")
        .await
        .unwrap();
    let UpsertOutcome::Created { contact_id, domain } = first else {
        panic!("expected a new contact, got {:?}", first);
    };
    assert_eq!(domain, "x.com");

    let second = contacts
        .upsert_from_email(&format!("  {}  ", email.to_uppercase()), "", "note")
        .await
        .unwrap();
    assert_eq!(
        second,
        UpsertOutcome::Updated {
            contact_id: contact_id.clone()
        }
    );

    let contact = contacts.get(&contact_id).await.unwrap();
    assert_eq!(contact.meeting_count, 2);
    assert_eq!(contact.email, email.to_lowercase());

    contacts.delete(&contact_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_upsert_fills_blank_name_only() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;
    let email = format!("named-{}@x.com", unique_suffix());

    contacts.upsert_from_email(&email, "", "note").await.unwrap();
    contacts
        .upsert_from_email(&email, "Jane Doe", "note")
        .await
        .unwrap();
    let outcome = contacts
        .upsert_from_email(&email, "Someone Else", "note")
        .await
        .unwrap();
    let UpsertOutcome::Updated { contact_id } = outcome else {
        panic!("expected update");
    };

    let contact = contacts.get(&contact_id).await.unwrap();
    assert_eq!(contact.name, "Jane Doe");
    assert_eq!(contact.meeting_count, 3);

    contacts.delete(&contact_id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_blank_email_is_skipped() {
    let test_db = setup().await;
    let outcome = test_db
        .db
        .contacts
        .upsert_from_email("   ", "", "note")
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Skipped);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_new_external_contact_gets_suggestion() {
    let test_db = setup().await;
    let suffix = unique_suffix();
    let token = format!("acme{}", suffix);
    let account = test_db.account(&format!("{} Corp", token)).await;
    let contacts = &test_db.db.contacts;

    let outcome = contacts
        .upsert_from_email(&format!("Jane@{}.com", token), "", "note")
        .await
        .unwrap();
    let UpsertOutcome::Created { contact_id, domain } = outcome else {
        panic!("expected a new contact");
    };
    assert_eq!(domain, format!("{}.com", token));

    let contact = contacts.get(&contact_id).await.unwrap();
    assert!(!contact.is_internal);
    assert_eq!(contact.suggested_account_id.as_deref(), Some(account.id.as_str()));
    assert!(contact.account_id.is_none());
    assert!(!contact.suggestion_confirmed);

    contacts.delete(&contact_id).await.unwrap();
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_internal_contact_gets_no_suggestion() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;
    // An account literally named after the internal domain's label
    let _account = test_db.account("Example Inc").await;

    let outcome = contacts
        .upsert_from_email(&format!("me-{}@Example.com", unique_suffix()), "", "note")
        .await
        .unwrap();
    let UpsertOutcome::Created { contact_id, .. } = outcome else {
        panic!("expected a new contact");
    };

    let contact = contacts.get(&contact_id).await.unwrap();
    assert!(contact.is_internal);
    assert!(contact.suggested_account_id.is_none());

    contacts.delete(&contact_id).await.unwrap();
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_suggestion_never_touches_linked_contact() {
    let test_db = setup().await;
    let suffix = unique_suffix();
    let token = format!("globex{}", suffix);
    let linked = test_db.account("Already Linked").await;
    let _candidate = test_db.account(&format!("{} Holdings", token)).await;
    let contacts = &test_db.db.contacts;

    let created = contacts
        .create(CreateContactRequest {
            email: format!("bob@{}.io", token),
            ..Default::default()
        })
        .await
        .unwrap();
    contacts
        .confirm_suggestion(&created.id, false)
        .await
        .unwrap();
    contacts.link_to_account(&created.id, &linked.id).await.unwrap();

    let suggested = contacts
        .suggest_account(&created.id, &format!("{}.io", token))
        .await
        .unwrap();
    assert!(suggested.is_none());

    let contact = contacts.get(&created.id).await.unwrap();
    assert_eq!(contact.account_id.as_deref(), Some(linked.id.as_str()));
    assert!(contact.suggested_account_id.is_none());

    contacts.delete(&created.id).await.unwrap();
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_confirm_and_reject_suggestion() {
    let test_db = setup().await;
    let suffix = unique_suffix();
    let token = format!("initech{}", suffix);
    let account = test_db.account(&format!("{} LLC", token)).await;
    let contacts = &test_db.db.contacts;

    let accepted = contacts
        .create(CreateContactRequest {
            email: format!("peter@{}.com", token),
            ..Default::default()
        })
        .await
        .unwrap();
    let rejected = contacts
        .create(CreateContactRequest {
            email: format!("milton@{}.com", token),
            ..Default::default()
        })
        .await
        .unwrap();

    contacts.confirm_suggestion(&accepted.id, true).await.unwrap();
    contacts.confirm_suggestion(&rejected.id, false).await.unwrap();

    let accepted = contacts.get(&accepted.id).await.unwrap();
    assert_eq!(accepted.account_id.as_deref(), Some(account.id.as_str()));
    assert_eq!(
        accepted.suggested_account_id.as_deref(),
        Some(account.id.as_str())
    );
    assert!(accepted.suggestion_confirmed);

    let rejected = contacts.get(&rejected.id).await.unwrap();
    assert!(rejected.account_id.is_none());
    assert!(rejected.suggested_account_id.is_none());
    assert!(rejected.suggestion_confirmed);

    let err = contacts
        .confirm_suggestion("no-such-contact", true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    contacts.delete(&accepted.id).await.unwrap();
    contacts.delete(&rejected.id).await.unwrap();
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_duplicate_manual_contact_conflicts() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;
    let email = format!("dup-{}@x.com", unique_suffix());

    let created = contacts
        .create(CreateContactRequest {
            email: email.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    let err = contacts
        .create(CreateContactRequest {
            email: email.to_uppercase(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    contacts.delete(&created.id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_bulk_delete_with_missing_id_commits() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;

    let c1 = contacts
        .create(CreateContactRequest {
            email: format!("c1-{}@x.com", unique_suffix()),
            ..Default::default()
        })
        .await
        .unwrap();

    let deleted = contacts
        .bulk(
            &[c1.id.clone(), format!("missing-{}", unique_suffix())],
            BulkContactAction::Delete,
        )
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(matches!(
        contacts.get(&c1.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    let err = contacts.bulk(&[], BulkContactAction::Delete).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_bulk_update_rolls_back_on_row_failure() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;
    let pool = test_db.db.pool();
    let suffix = unique_suffix();

    let mut ids = Vec::new();
    for n in 1..=2 {
        let created = contacts
            .create(CreateContactRequest {
                email: format!("rb{}-{}@x.com", n, suffix),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(created.id);
    }

    // Fail the update of the second row only.
    let function = format!("reject_contact_{}", suffix);
    let trigger = format!("reject_contact_trg_{}", suffix);
    sqlx::query(&format!(
        "CREATE FUNCTION {}() RETURNS trigger LANGUAGE plpgsql AS
         $$ BEGIN RAISE EXCEPTION 'row rejected'; END $$",
        function
    ))
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER {} BEFORE UPDATE ON contacts FOR EACH ROW
         WHEN (OLD.id = '{}') EXECUTE FUNCTION {}()",
        trigger, ids[1], function
    ))
    .execute(pool)
    .await
    .unwrap();

    let result = contacts.bulk(&ids, BulkContactAction::SetInternal(true)).await;

    sqlx::query(&format!("DROP TRIGGER {} ON contacts", trigger))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(&format!("DROP FUNCTION {}()", function))
        .execute(pool)
        .await
        .unwrap();

    assert!(matches!(result, Err(Error::Database(_))));
    for id in &ids {
        assert!(!contacts.get(id).await.unwrap().is_internal);
    }

    contacts.bulk(&ids, BulkContactAction::Delete).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_domain_groups_and_domain_account_creation() {
    let test_db = setup().await;
    let contacts = &test_db.db.contacts;
    let token = format!("umbrella{}", unique_suffix());
    let domain = format!("{}.co", token);

    let mut ids = Vec::new();
    for name in ["alice", "bob"] {
        let created = contacts
            .create(CreateContactRequest {
                email: format!("{}@{}", name, domain),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(created.id);
    }

    let groups = contacts
        .domain_groups(DomainGroupFilter::Unlinked, true)
        .await
        .unwrap();
    let group = groups
        .iter()
        .find(|g| g.domain == domain)
        .expect("domain group present");
    assert_eq!(group.contact_count, 2);
    assert!(group.linked_account_id.is_none());
    assert_eq!(group.contacts.as_ref().map(Vec::len), Some(2));

    // Groups cover external contacts only, so they carry no internal flag
    let internal = contacts
        .create(CreateContactRequest {
            email: format!("staff-{}@example.com", unique_suffix()),
            ..Default::default()
        })
        .await
        .unwrap();
    let all_groups = contacts
        .domain_groups(DomainGroupFilter::All, false)
        .await
        .unwrap();
    assert!(all_groups.iter().all(|g| g.domain != "example.com"));
    let payload = serde_json::to_value(group).unwrap();
    assert!(payload.get("is_internal").is_none());
    contacts.delete(&internal.id).await.unwrap();

    let created = contacts
        .create_account_from_domain(&domain, None)
        .await
        .unwrap();
    assert_eq!(created.contacts_updated, 2);
    assert!(created.account_name.starts_with("Umbrella"));

    let linked = contacts
        .list(&ListContactsRequest {
            filter: ContactFilter::External,
            account_id: Some(created.account_id.clone()),
        })
        .await
        .unwrap();
    assert_eq!(linked.len(), 2);

    contacts.bulk(&ids, BulkContactAction::Delete).await.unwrap();
    test_db.db.accounts.delete(&created.account_id).await.unwrap();
}
