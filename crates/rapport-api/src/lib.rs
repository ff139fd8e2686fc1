//! # rapport-api
//!
//! HTTP API server for rapport: meeting notes, accounts, todos and contacts
//! with unified search.
//!
//! The binary in `main.rs` loads configuration, initialises logging and the
//! database, then serves [`build_router`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod query_types;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use uuid::Uuid;

use rapport_db::Database;
use rapport_search::{UnifiedSearch, UnifiedSearchEngine};

pub use config::AppConfig;
pub use error::ApiError;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub search: Arc<dyn UnifiedSearch>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let search = Arc::new(UnifiedSearchEngine::new(db.search.clone()));
        Self {
            db: Arc::new(db),
            search,
        }
    }
}

/// OpenAPI document served at `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rapport API",
        description = "Meeting notes, accounts, todos and contacts with unified search"
    ),
    components(schemas(
        rapport_core::Account,
        rapport_core::AccountRef,
        rapport_core::Note,
        rapport_core::NoteRef,
        rapport_core::Todo,
        rapport_core::TodoStatus,
        rapport_core::TodoPriority,
        rapport_core::Tag,
        rapport_core::Attachment,
        rapport_core::Activity,
        rapport_core::Contact,
        rapport_core::CreatedContact,
        rapport_core::ContactStats,
        rapport_core::DomainGroup,
        rapport_core::DomainLinkResult,
        rapport_core::DomainAccountCreated,
        rapport_core::SearchResult,
        rapport_core::SearchResultKind,
        rapport_core::Analytics,
        rapport_core::AccountNoteCount,
        rapport_core::IncompleteNote,
        rapport_core::DataExport,
        rapport_core::DeletionState,
    )),
    tags(
        (name = "Accounts", description = "Customer accounts"),
        (name = "Notes", description = "Meeting notes, trash and attachments"),
        (name = "Todos", description = "Follow-up items"),
        (name = "Contacts", description = "Contacts and account suggestions"),
        (name = "Search", description = "Unified search"),
        (name = "System", description = "Health and export")
    )
)]
pub struct ApiDoc;

// =============================================================================
// CORS
// =============================================================================

/// Parse a comma-separated origin whitelist. Invalid entries are skipped.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        return parse_allowed_origins(config::DEFAULT_ALLOWED_ORIGINS);
    }
    origins
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_allowed_origins(allowed_origins)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}

// =============================================================================
// ROUTER
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

fn api_routes() -> Router<AppState> {
    use handlers::{
        accounts, activities, analytics, attachments, capture, contacts, data, import, notes,
        search, tags, todos,
    };

    Router::new()
        // Accounts
        .route("/accounts", get(accounts::list_accounts).post(accounts::create_account))
        .route(
            "/accounts/:id",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/accounts/:id/notes", get(notes::list_account_notes))
        .route("/accounts/:id/notes/reorder", post(notes::reorder_notes))
        .route("/accounts/:id/activities", get(activities::list_activities))
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route("/notes/archived", get(notes::list_archived_notes))
        .route("/notes/deleted", get(notes::list_deleted_notes))
        .route("/notes/trash", delete(notes::empty_trash))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/:id/restore", post(notes::restore_note))
        .route("/notes/:id/permanent", delete(notes::purge_note))
        .route("/notes/:id/pin", post(notes::toggle_note_pin))
        .route("/notes/:id/archive", post(notes::toggle_note_archive))
        .route("/notes/:id/tags", get(tags::list_note_tags))
        .route(
            "/notes/:id/tags/:tag_id",
            post(tags::add_tag_to_note).delete(tags::remove_tag_from_note),
        )
        .route(
            "/notes/:id/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachment),
        )
        .route(
            "/notes/:id/attachments/:attachment_id",
            get(attachments::download_attachment).delete(attachments::delete_attachment),
        )
        // Todos
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/deleted", get(todos::list_deleted_todos))
        .route(
            "/todos/:id",
            get(todos::get_todo)
                .put(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route("/todos/:id/restore", post(todos::restore_todo))
        .route("/todos/:id/permanent", delete(todos::purge_todo))
        .route("/todos/:id/pin", post(todos::toggle_todo_pin))
        .route(
            "/todos/:id/notes/:note_id",
            post(todos::link_todo_note).delete(todos::unlink_todo_note),
        )
        // Tags
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/:id", axum::routing::put(tags::update_tag).delete(tags::delete_tag))
        // Contacts
        .route("/contacts", get(contacts::list_contacts).post(contacts::create_contact))
        .route("/contacts/stats", get(contacts::contact_stats))
        .route("/contacts/bulk", post(contacts::bulk_contacts))
        .route("/contacts/domain-groups", get(contacts::domain_groups))
        .route(
            "/contacts/domain/:domain/link/:account_id",
            post(contacts::link_domain),
        )
        .route(
            "/contacts/domain/:domain/create-account",
            post(contacts::create_account_from_domain),
        )
        .route(
            "/contacts/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route("/contacts/:id/notes", get(contacts::contact_notes))
        .route(
            "/contacts/:id/confirm-suggestion",
            post(contacts::confirm_suggestion),
        )
        .route(
            "/contacts/:id/link/:account_id",
            post(contacts::link_contact),
        )
        // Search, activities, analytics, capture, import/export
        .route("/search", get(search::search))
        .route("/activities", post(activities::create_activity))
        .route("/analytics", get(analytics::get_analytics))
        .route("/analytics/incomplete", get(analytics::incomplete_notes))
        .route("/quick-capture", post(capture::quick_capture))
        .route("/import/markdown", post(import::import_markdown))
        .route("/export", get(analytics::export_data))
        .route("/data", delete(data::clear_all))
        .route("/openapi.json", get(openapi_json))
}

/// Build the full application router with middleware.
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&config.allowed_origins))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}
