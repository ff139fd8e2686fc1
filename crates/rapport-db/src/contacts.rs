//! Contact repository: CRUD plus contact resolution.
//!
//! Contacts are keyed by normalized email. Meeting participants are upserted
//! here, and each new external contact gets an advisory account suggestion
//! from its email domain. Suggestions only change `account_id` once confirmed.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info, warn};

use rapport_core::defaults::{CONTACT_NOTES_LIMIT, SOURCE_MANUAL, SOURCE_NOTE};
use rapport_core::{
    account_name_for_domain, company_token, domain_first_label, extract_domain, looks_like_email,
    new_id, normalize_email, participant_emails, AccountRef, BulkContactAction, Contact,
    ContactRepository, ContactStats, CreateContactRequest, CreatedContact, DomainAccountCreated,
    DomainGroup, DomainGroupFilter, DomainLinkResult, Error, ExtractionSummary, InternalDomain,
    ListContactsRequest, NoteRef, Result, UpdateContactRequest, UpsertOutcome,
};

use crate::accounts::PgAccountRepository;
use crate::escape_like;
use crate::notes::note_ref_from_row;
use crate::query_params::{bind_params, QueryParam, UpdateBuilder, WhereBuilder};

const CONTACT_SELECT: &str = r#"
    SELECT c.id, c.email, c.name, c.company, c.domain, c.is_internal,
           c.account_id, a.name AS account_name,
           c.suggested_account_id, sa.name AS suggested_account_name,
           c.suggestion_confirmed, c.source, c.first_seen, c.last_seen,
           c.meeting_count, c.created_at, c.updated_at
    FROM contacts c
    LEFT JOIN accounts a ON a.id = c.account_id
    LEFT JOIN accounts sa ON sa.id = c.suggested_account_id
"#;

fn contact_from_row(row: &PgRow) -> Contact {
    Contact {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        company: row.get("company"),
        domain: row.get("domain"),
        is_internal: row.get("is_internal"),
        account_id: row.get("account_id"),
        account_name: row.get("account_name"),
        suggested_account_id: row.get("suggested_account_id"),
        suggested_account_name: row.get("suggested_account_name"),
        suggestion_confirmed: row.get("suggestion_confirmed"),
        source: row.get("source"),
        first_seen: row.get("first_seen"),
        last_seen: row.get("last_seen"),
        meeting_count: row.get("meeting_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn account_ref_from_row(row: &PgRow) -> AccountRef {
    AccountRef {
        id: row.get("id"),
        name: row.get("name"),
    }
}

/// `LIKE` pattern for the account-name suggestion of a domain.
///
/// None when the domain is blank, internal, or reduces to an empty company
/// token (e.g. the bare domain ".com").
pub fn suggestion_pattern(domain: &str, internal: &InternalDomain) -> Option<String> {
    if domain.is_empty() || internal.is_internal_domain(domain) {
        return None;
    }
    let token = company_token(domain);
    if token.is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like(&token.to_lowercase())))
}

/// PostgreSQL implementation of ContactRepository.
pub struct PgContactRepository {
    pool: Pool<Postgres>,
    internal_domain: InternalDomain,
}

impl PgContactRepository {
    pub fn new(pool: Pool<Postgres>, internal_domain: InternalDomain) -> Self {
        Self {
            pool,
            internal_domain,
        }
    }

    pub fn internal_domain(&self) -> &InternalDomain {
        &self.internal_domain
    }

    async fn account_exists(&self, account_id: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    /// Run the suggestion and swallow failures; it is advisory.
    async fn try_suggest(&self, contact_id: &str, domain: &str) {
        if let Err(e) = self.suggest_account(contact_id, domain).await {
            warn!(
                subsystem = "contacts",
                component = "suggestion",
                op = "suggest_account",
                contact_id = %contact_id,
                domain = %domain,
                error = %e,
                "Account suggestion failed"
            );
        }
    }

    /// Strategy 1: the account most contacts of this domain are linked to.
    async fn majority_account_for_domain(&self, domain: &str) -> Result<Option<AccountRef>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.name
            FROM accounts a
            JOIN contacts c ON c.account_id = a.id
            WHERE c.domain = $1
            GROUP BY a.id, a.name
            ORDER BY COUNT(*) DESC, a.name
            LIMIT 1
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(account_ref_from_row))
    }

    /// Strategy 2: an account whose name contains the domain's first label.
    async fn account_matching_label(&self, domain: &str) -> Result<Option<AccountRef>> {
        let label = domain_first_label(domain);
        if label.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query(
            "SELECT id, name FROM accounts WHERE LOWER(name) LIKE $1
             ORDER BY created_at, id LIMIT 1",
        )
        .bind(format!("%{}%", escape_like(&label.to_lowercase())))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(account_ref_from_row))
    }

    async fn contacts_for_domain(&self, domain: &str) -> Result<Vec<Contact>> {
        let sql = format!("{} WHERE c.domain = $1 ORDER BY c.name ASC", CONTACT_SELECT);
        let rows = sqlx::query(&sql)
            .bind(domain)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(contact_from_row).collect())
    }
}

fn normalize_domain(domain: &str) -> Result<String> {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        return Err(Error::InvalidInput("Domain is required".to_string()));
    }
    Ok(domain)
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn list(&self, req: &ListContactsRequest) -> Result<Vec<Contact>> {
        let mut filter = WhereBuilder::new();
        if let Some(predicate) = req.filter.predicate() {
            filter.push(predicate);
        }
        if let Some(account_id) = req.account_id.as_deref().filter(|id| !id.is_empty()) {
            filter.push_param(
                "c.account_id = {}",
                QueryParam::Text(account_id.to_string()),
            );
        }
        let sql = format!(
            "{} {} ORDER BY c.last_seen DESC, c.email",
            CONTACT_SELECT,
            filter.clause()
        );
        let rows = bind_params(sqlx::query(&sql), filter.params())
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(contact_from_row).collect())
    }

    async fn get(&self, id: &str) -> Result<Contact> {
        let sql = format!("{} WHERE c.id = $1", CONTACT_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Contact not found".to_string()))?;
        Ok(contact_from_row(&row))
    }

    async fn create(&self, req: CreateContactRequest) -> Result<CreatedContact> {
        let email = normalize_email(&req.email);
        if !looks_like_email(&email) {
            return Err(Error::InvalidInput("Valid email is required".to_string()));
        }
        let domain = extract_domain(&email);
        let is_internal = self.internal_domain.is_internal_domain(&domain);
        let source = req
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(SOURCE_MANUAL);

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO contacts (id, email, name, company, domain, is_internal, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(req.name.trim())
        .bind(req.company.trim())
        .bind(&domain)
        .bind(is_internal)
        .bind(source)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let err = Error::Database(e);
            if err.is_unique_violation() {
                Error::Conflict("Contact already exists".to_string())
            } else {
                err
            }
        })?;

        info!(
            subsystem = "contacts",
            component = "repository",
            op = "create",
            contact_id = %id,
            domain = %domain,
            is_internal,
            "Contact created"
        );
        self.try_suggest(&id, &domain).await;
        Ok(CreatedContact { id, email })
    }

    async fn update(&self, id: &str, req: UpdateContactRequest) -> Result<()> {
        if req.is_empty() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }
        // Some("") clears the link
        let account_id = req.account_id.map(|id| {
            let id = id.trim().to_string();
            (!id.is_empty()).then_some(id)
        });
        if let Some(Some(account_id)) = account_id.as_ref() {
            if !self.account_exists(account_id).await? {
                return Err(Error::InvalidInput("Account not found".to_string()));
            }
        }

        let mut builder = UpdateBuilder::new("contacts");
        builder
            .set_opt("name", req.name, |v| QueryParam::Text(v.trim().to_string()))
            .set_opt("company", req.company, |v| {
                QueryParam::Text(v.trim().to_string())
            })
            .set_opt("account_id", account_id, QueryParam::OptText);
        let (sql, params) = builder.build_for_id(id, None, Some("id"));

        bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Contact not found".to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Contact not found".to_string()));
        }
        Ok(())
    }

    async fn upsert_from_email(
        &self,
        email: &str,
        display_name: &str,
        source: &str,
    ) -> Result<UpsertOutcome> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(UpsertOutcome::Skipped);
        }
        let domain = extract_domain(&email);
        let is_internal = self.internal_domain.is_internal_domain(&domain);

        // xmax = 0 only for rows this statement inserted
        let row = sqlx::query(
            r#"
            INSERT INTO contacts (id, email, name, domain, is_internal, source, meeting_count)
            VALUES ($1, $2, $3, $4, $5, $6, 1)
            ON CONFLICT (email) DO UPDATE SET
                name = CASE
                    WHEN contacts.name = '' AND EXCLUDED.name <> '' THEN EXCLUDED.name
                    ELSE contacts.name
                END,
                last_seen = now(),
                meeting_count = contacts.meeting_count + 1,
                updated_at = now()
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(new_id())
        .bind(&email)
        .bind(display_name.trim())
        .bind(&domain)
        .bind(is_internal)
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let contact_id: String = row.get("id");
        let inserted: bool = row.get("inserted");
        if inserted {
            debug!(
                subsystem = "contacts",
                component = "resolution",
                op = "upsert",
                contact_id = %contact_id,
                domain = %domain,
                "New contact from email"
            );
            self.try_suggest(&contact_id, &domain).await;
            Ok(UpsertOutcome::Created { contact_id, domain })
        } else {
            Ok(UpsertOutcome::Updated { contact_id })
        }
    }

    async fn extract_from_note(
        &self,
        internal_participants: &[String],
        external_participants: &[String],
    ) -> ExtractionSummary {
        let start = Instant::now();
        let mut summary = ExtractionSummary::default();

        for email in participant_emails(internal_participants, external_participants) {
            match self.upsert_from_email(&email, "", SOURCE_NOTE).await {
                Ok(UpsertOutcome::Created { .. }) => summary.created += 1,
                Ok(UpsertOutcome::Updated { .. }) => summary.updated += 1,
                Ok(UpsertOutcome::Skipped) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        subsystem = "contacts",
                        component = "resolution",
                        op = "extract_from_note",
                        error = %e,
                        "Contact upsert failed"
                    );
                }
            }
        }

        debug!(
            subsystem = "contacts",
            component = "resolution",
            op = "extract_from_note",
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Participant extraction finished"
        );
        summary
    }

    async fn suggest_account(&self, contact_id: &str, domain: &str) -> Result<Option<String>> {
        let Some(pattern) = suggestion_pattern(domain, &self.internal_domain) else {
            return Ok(None);
        };

        let account_id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM accounts WHERE LOWER(name) LIKE $1 ORDER BY created_at, id LIMIT 1",
        )
        .bind(&pattern)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        let Some(account_id) = account_id else {
            return Ok(None);
        };

        let result = sqlx::query(
            "UPDATE contacts SET suggested_account_id = $1, updated_at = now()
             WHERE id = $2 AND account_id IS NULL",
        )
        .bind(&account_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        debug!(
            subsystem = "contacts",
            component = "suggestion",
            op = "suggest_account",
            contact_id = %contact_id,
            account_id = %account_id,
            "Account suggested"
        );
        Ok(Some(account_id))
    }

    async fn confirm_suggestion(&self, contact_id: &str, confirm: bool) -> Result<()> {
        let sql = if confirm {
            "UPDATE contacts
             SET account_id = COALESCE(suggested_account_id, account_id),
                 suggestion_confirmed = TRUE, updated_at = now()
             WHERE id = $1"
        } else {
            "UPDATE contacts
             SET suggested_account_id = NULL,
                 suggestion_confirmed = TRUE, updated_at = now()
             WHERE id = $1"
        };
        let result = sqlx::query(sql)
            .bind(contact_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Contact not found".to_string()));
        }
        Ok(())
    }

    async fn link_to_account(&self, contact_id: &str, account_id: &str) -> Result<()> {
        if !self.account_exists(account_id).await? {
            return Err(Error::NotFound("Account not found".to_string()));
        }
        let result = sqlx::query(
            "UPDATE contacts SET account_id = $1, suggestion_confirmed = TRUE, updated_at = now()
             WHERE id = $2",
        )
        .bind(account_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Contact not found".to_string()));
        }
        Ok(())
    }

    async fn bulk(&self, contact_ids: &[String], action: BulkContactAction) -> Result<u64> {
        if contact_ids.is_empty() {
            return Err(Error::InvalidInput("No contacts selected".to_string()));
        }
        if let BulkContactAction::SetAccount(Some(account_id)) = &action {
            if !self.account_exists(account_id).await? {
                return Err(Error::InvalidInput("Account not found".to_string()));
            }
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = match &action {
            BulkContactAction::Delete => {
                sqlx::query("DELETE FROM contacts WHERE id = ANY($1)")
                    .bind(contact_ids)
                    .execute(&mut *tx)
                    .await
            }
            BulkContactAction::SetInternal(is_internal) => {
                sqlx::query(
                    "UPDATE contacts SET is_internal = $1, updated_at = now() WHERE id = ANY($2)",
                )
                .bind(is_internal)
                .bind(contact_ids)
                .execute(&mut *tx)
                .await
            }
            BulkContactAction::SetAccount(account_id) => {
                sqlx::query(
                    "UPDATE contacts SET account_id = $1, updated_at = now() WHERE id = ANY($2)",
                )
                .bind(account_id)
                .bind(contact_ids)
                .execute(&mut *tx)
                .await
            }
        }
        .map_err(Error::Database)?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "contacts",
            component = "repository",
            op = "bulk",
            action = ?action,
            requested = contact_ids.len(),
            rows_affected = result.rows_affected(),
            "Bulk contact operation committed"
        );
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<ContactStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_internal) AS internal,
                   COUNT(*) FILTER (WHERE NOT is_internal) AS external,
                   COUNT(*) FILTER (WHERE account_id IS NOT NULL) AS linked,
                   COUNT(*) FILTER (
                       WHERE suggested_account_id IS NOT NULL AND NOT suggestion_confirmed
                   ) AS pending_suggestions
            FROM contacts
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ContactStats {
            total: row.get("total"),
            internal: row.get("internal"),
            external: row.get("external"),
            linked: row.get("linked"),
            pending_suggestions: row.get("pending_suggestions"),
        })
    }

    async fn notes_for_contact(&self, contact_id: &str) -> Result<Vec<NoteRef>> {
        let email: String = sqlx::query_scalar("SELECT email FROM contacts WHERE id = $1")
            .bind(contact_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Contact not found".to_string()))?;

        let rows = sqlx::query(
            r#"
            SELECT n.id, n.title, n.account_id, a.name AS account_name,
                   n.meeting_date, n.created_at
            FROM notes n
            JOIN accounts a ON a.id = n.account_id
            WHERE n.deleted_at IS NULL
              AND EXISTS (
                  SELECT 1
                  FROM unnest(n.internal_participants || n.external_participants) AS p(email)
                  WHERE LOWER(TRIM(p.email)) = $1
              )
            ORDER BY COALESCE(n.meeting_date, n.created_at) DESC
            LIMIT $2
            "#,
        )
        .bind(&email)
        .bind(CONTACT_NOTES_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(note_ref_from_row).collect())
    }

    async fn domain_groups(
        &self,
        filter: DomainGroupFilter,
        include_contacts: bool,
    ) -> Result<Vec<DomainGroup>> {
        let unlinked = match filter {
            DomainGroupFilter::Unlinked => " AND c.account_id IS NULL",
            DomainGroupFilter::All => "",
        };
        let sql = format!(
            r#"
            SELECT c.domain,
                   COUNT(*) AS contact_count,
                   ARRAY_AGG(c.id ORDER BY c.id) AS contact_ids,
                   MAX(c.account_id) AS account_id
            FROM contacts c
            WHERE c.is_internal = FALSE{}
            GROUP BY c.domain
            ORDER BY contact_count DESC, c.domain
            "#,
            unlinked
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in &rows {
            let domain: String = row.get("domain");
            let linked_account_id: Option<String> = row.get("account_id");

            let mut group = DomainGroup {
                domain: domain.clone(),
                contact_count: row.get("contact_count"),
                contact_ids: row.get("contact_ids"),
                linked_account_id: None,
                linked_account_name: None,
                suggested_account: None,
                contacts: None,
            };

            match linked_account_id {
                Some(account_id) => {
                    group.linked_account_name =
                        sqlx::query_scalar("SELECT name FROM accounts WHERE id = $1")
                            .bind(&account_id)
                            .fetch_optional(&self.pool)
                            .await
                            .map_err(Error::Database)?;
                    group.linked_account_id = Some(account_id);
                }
                None => {
                    group.suggested_account = match self.majority_account_for_domain(&domain).await?
                    {
                        Some(account) => Some(account),
                        None => self.account_matching_label(&domain).await?,
                    };
                }
            }

            if include_contacts {
                group.contacts = Some(self.contacts_for_domain(&domain).await?);
            }
            groups.push(group);
        }
        Ok(groups)
    }

    async fn link_domain(&self, domain: &str, account_id: &str) -> Result<DomainLinkResult> {
        let domain = normalize_domain(domain)?;
        if !self.account_exists(account_id).await? {
            return Err(Error::NotFound("Account not found".to_string()));
        }

        let result = sqlx::query(
            "UPDATE contacts SET account_id = $1, updated_at = now()
             WHERE domain = $2 AND is_internal = FALSE",
        )
        .bind(account_id)
        .bind(&domain)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "contacts",
            component = "domains",
            op = "link_domain",
            domain = %domain,
            account_id = %account_id,
            rows_affected = result.rows_affected(),
            "Domain linked to account"
        );
        Ok(DomainLinkResult {
            contacts_updated: result.rows_affected(),
        })
    }

    async fn create_account_from_domain(
        &self,
        domain: &str,
        account_name: Option<&str>,
    ) -> Result<DomainAccountCreated> {
        let domain = normalize_domain(domain)?;
        let name = account_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| account_name_for_domain(&domain));

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let account = PgAccountRepository::insert_tx(&mut tx, &name, "").await?;
        let result = sqlx::query(
            "UPDATE contacts SET account_id = $1, updated_at = now()
             WHERE domain = $2 AND is_internal = FALSE",
        )
        .bind(&account.id)
        .bind(&domain)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "contacts",
            component = "domains",
            op = "create_account_from_domain",
            domain = %domain,
            account_id = %account.id,
            rows_affected = result.rows_affected(),
            "Account created from domain"
        );
        Ok(DomainAccountCreated {
            account_id: account.id,
            account_name: account.name,
            contacts_updated: result.rows_affected(),
        })
    }
}
