use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use log::info;

use super::TicketStore;
use crate::core::shared::schema::{support_tickets, ticket_comments};
use crate::core::shared::utils::DbPool;
use crate::tickets::error::TicketError;
use crate::tickets::migrations::TICKET_TABLES_SQL;
use crate::tickets::types::{NewComment, NewTicket, SupportTicket, TicketAction, TicketComment};

#[derive(Queryable, Selectable)]
#[diesel(table_name = support_tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct TicketRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    error_description: String,
    image_url: Option<String>,
    images: Option<serde_json::Value>,
    is_read: bool,
    status: String,
    assigned_to: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for SupportTicket {
    type Error = TicketError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            error_description: row.error_description,
            image_url: row.image_url,
            images: row.images,
            is_read: row.is_read,
            status: row.status.parse().map_err(TicketError::Store)?,
            assigned_to: row.assigned_to,
            created_at: row.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = support_tickets)]
struct NewTicketRow<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    error_description: &'a str,
    image_url: Option<&'a str>,
    images: Option<serde_json::Value>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = ticket_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CommentRow {
    id: i64,
    ticket_id: i64,
    text: String,
    author: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for TicketComment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            ticket_id: row.ticket_id,
            text: row.text,
            author: row.author,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = ticket_comments)]
struct NewCommentRow<'a> {
    ticket_id: i64,
    text: &'a str,
    author: &'a str,
}

impl<'a> From<&'a NewComment> for NewCommentRow<'a> {
    fn from(comment: &'a NewComment) -> Self {
        Self {
            ticket_id: comment.ticket_id,
            text: &comment.text,
            author: &comment.author,
        }
    }
}

/// PostgreSQL backend. Diesel is blocking, so every call runs on the blocking pool
/// with its own pooled connection.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: DbPool,
}

impl PgTicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Creates the ticket tables if they are missing. Blocking.
    pub fn migrate(&self) -> Result<(), TicketError> {
        let mut conn = self.pool.get()?;
        conn.batch_execute(TICKET_TABLES_SQL)?;
        info!("Ticket tables are up to date");
        Ok(())
    }

    async fn run<T, F>(&self, f: F) -> Result<T, TicketError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, TicketError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

fn find_ticket(conn: &mut PgConnection, id: i64) -> Result<TicketRow, TicketError> {
    support_tickets::table
        .find(id)
        .select(TicketRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(TicketError::NotFound(id))
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, TicketError> {
        self.run(|conn| {
            support_tickets::table
                .order((support_tickets::created_at.desc(), support_tickets::id.desc()))
                .select(TicketRow::as_select())
                .load::<TicketRow>(conn)?
                .into_iter()
                .map(SupportTicket::try_from)
                .collect()
        })
        .await
    }

    async fn get_ticket(&self, id: i64) -> Result<SupportTicket, TicketError> {
        self.run(move |conn| SupportTicket::try_from(find_ticket(conn, id)?))
            .await
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<SupportTicket, TicketError> {
        self.run(move |conn| {
            let row = NewTicketRow {
                name: &ticket.name,
                email: &ticket.email,
                phone: &ticket.phone,
                error_description: &ticket.error_description,
                image_url: ticket.image_url.as_deref(),
                images: ticket.images.clone(),
            };
            diesel::insert_into(support_tickets::table)
                .values(&row)
                .returning(TicketRow::as_returning())
                .get_result::<TicketRow>(conn)?
                .try_into()
        })
        .await
    }

    async fn set_read(&self, id: i64, is_read: bool) -> Result<SupportTicket, TicketError> {
        self.run(move |conn| {
            diesel::update(support_tickets::table.find(id))
                .set(support_tickets::is_read.eq(is_read))
                .returning(TicketRow::as_returning())
                .get_result::<TicketRow>(conn)
                .optional()?
                .ok_or(TicketError::NotFound(id))?
                .try_into()
        })
        .await
    }

    async fn apply(&self, id: i64, action: &TicketAction) -> Result<SupportTicket, TicketError> {
        let action = action.clone();
        self.run(move |conn| {
            conn.transaction::<_, TicketError, _>(|conn| {
                let current: SupportTicket = support_tickets::table
                    .find(id)
                    .select(TicketRow::as_select())
                    .for_update()
                    .first::<TicketRow>(conn)
                    .optional()?
                    .ok_or(TicketError::NotFound(id))?
                    .try_into()?;

                if !action.permits(current.status) {
                    return Err(TicketError::InvalidTransition {
                        id,
                        from: current.status,
                        action: action.name(),
                    });
                }

                let mut next = current;
                action.apply_to(&mut next);

                let updated: TicketRow = diesel::update(support_tickets::table.find(id))
                    .set((
                        support_tickets::status.eq(next.status.as_str()),
                        support_tickets::assigned_to.eq(next.assigned_to.as_deref()),
                    ))
                    .returning(TicketRow::as_returning())
                    .get_result(conn)?;

                let audit = action.audit_comment(id);
                diesel::insert_into(ticket_comments::table)
                    .values(NewCommentRow::from(&audit))
                    .execute(conn)?;

                SupportTicket::try_from(updated)
            })
        })
        .await
    }

    async fn delete_ticket(&self, id: i64) -> Result<(), TicketError> {
        self.run(move |conn| {
            conn.transaction::<_, TicketError, _>(|conn| {
                diesel::delete(ticket_comments::table.filter(ticket_comments::ticket_id.eq(id)))
                    .execute(conn)?;
                let deleted = diesel::delete(support_tickets::table.find(id)).execute(conn)?;
                if deleted == 0 {
                    return Err(TicketError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<TicketComment>, TicketError> {
        self.run(move |conn| {
            let rows = ticket_comments::table
                .filter(ticket_comments::ticket_id.eq(ticket_id))
                .order((ticket_comments::created_at.asc(), ticket_comments::id.asc()))
                .select(CommentRow::as_select())
                .load::<CommentRow>(conn)?;
            Ok(rows.into_iter().map(TicketComment::from).collect())
        })
        .await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<TicketComment, TicketError> {
        self.run(move |conn| {
            let row: CommentRow = diesel::insert_into(ticket_comments::table)
                .values(NewCommentRow::from(&comment))
                .returning(CommentRow::as_returning())
                .get_result(conn)?;
            Ok(row.into())
        })
        .await
    }
}
