//! Contact HTTP handlers: CRUD, suggestions, bulk actions and domain groups.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use rapport_core::{
    BulkContactAction, Contact, ContactFilter, ContactRepository, ContactStats,
    CreateContactRequest, CreatedContact, DomainAccountCreated, DomainGroup, DomainGroupFilter,
    DomainLinkResult, ListContactsRequest, NoteRef, UpdateContactRequest,
};

use crate::handlers::{message, AffectedResponse, MessageResponse};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListContactsQuery {
    pub filter: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactBody {
    pub name: Option<String>,
    pub company: Option<String>,
    /// An empty string clears the link.
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmSuggestionBody {
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkContactsBody {
    #[serde(default)]
    pub contact_ids: Vec<String>,
    #[serde(default)]
    pub action: String,
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct DomainGroupsQuery {
    pub filter: Option<String>,
    #[serde(default)]
    pub include_contacts: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateDomainAccountBody {
    pub account_name: Option<String>,
}

/// List contacts, most recently seen first.
///
/// # Query Parameters
/// - `filter`: `internal`, `external`, `unlinked` or `suggestions`
///   (anything else lists all)
/// - `account_id`: only contacts linked to this account
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let req = ListContactsRequest {
        filter: ContactFilter::parse(query.filter.as_deref()),
        account_id: query.account_id.filter(|id| !id.trim().is_empty()),
    };
    Ok(Json(state.db.contacts.list(&req).await?))
}

pub async fn contact_stats(State(state): State<AppState>) -> Result<Json<ContactStats>, ApiError> {
    Ok(Json(state.db.contacts.stats().await?))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(state.db.contacts.get(&id).await?))
}

/// Create a contact by hand.
///
/// # Returns
/// - 201 Created with `{id, email}`
/// - 400 Bad Request if the email is missing or malformed
/// - 409 Conflict if a contact with this email exists
pub async fn create_contact(
    State(state): State<AppState>,
    Json(body): Json<CreateContactBody>,
) -> Result<(StatusCode, Json<CreatedContact>), ApiError> {
    let created = state
        .db
        .contacts
        .create(CreateContactRequest {
            email: body.email,
            name: body.name,
            company: body.company,
            source: body.source,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateContactBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .db
        .contacts
        .update(
            &id,
            UpdateContactRequest {
                name: body.name,
                company: body.company,
                account_id: body.account_id,
            },
        )
        .await?;
    Ok(message("Contact updated"))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.contacts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contact_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NoteRef>>, ApiError> {
    Ok(Json(state.db.contacts.notes_for_contact(&id).await?))
}

/// Accept or reject the contact's suggested account.
pub async fn confirm_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ConfirmSuggestionBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.contacts.confirm_suggestion(&id, body.confirm).await?;
    Ok(message(if body.confirm {
        "Suggestion confirmed"
    } else {
        "Suggestion rejected"
    }))
}

pub async fn link_contact(
    State(state): State<AppState>,
    Path((id, account_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.contacts.link_to_account(&id, &account_id).await?;
    Ok(message("Contact linked to account"))
}

/// Apply one action to many contacts in a single transaction.
///
/// # Returns
/// - 200 OK with `{affected}`
/// - 400 Bad Request for no ids, an unknown action or a missing value
pub async fn bulk_contacts(
    State(state): State<AppState>,
    Json(body): Json<BulkContactsBody>,
) -> Result<Json<AffectedResponse>, ApiError> {
    if body.contact_ids.is_empty() {
        return Err(ApiError::BadRequest("No contacts selected".to_string()));
    }
    let action = BulkContactAction::parse(&body.action, body.value.as_ref())?;
    let affected = state.db.contacts.bulk(&body.contact_ids, action).await?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn domain_groups(
    State(state): State<AppState>,
    Query(query): Query<DomainGroupsQuery>,
) -> Result<Json<Vec<DomainGroup>>, ApiError> {
    let groups = state
        .db
        .contacts
        .domain_groups(
            DomainGroupFilter::parse(query.filter.as_deref()),
            query.include_contacts,
        )
        .await?;
    Ok(Json(groups))
}

pub async fn link_domain(
    State(state): State<AppState>,
    Path((domain, account_id)): Path<(String, String)>,
) -> Result<Json<DomainLinkResult>, ApiError> {
    Ok(Json(state.db.contacts.link_domain(&domain, &account_id).await?))
}

/// Create an account for a domain and link the domain's external contacts.
///
/// The account name defaults to the title-cased first label of the domain.
pub async fn create_account_from_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    body: Option<Json<CreateDomainAccountBody>>,
) -> Result<(StatusCode, Json<DomainAccountCreated>), ApiError> {
    let Json(body) = body.unwrap_or_default();
    let created = state
        .db
        .contacts
        .create_account_from_domain(&domain, body.account_name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
