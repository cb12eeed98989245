use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    New,
    Read,
    Replied,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::New => "new",
            MessageStatus::Read => "read",
            MessageStatus::Replied => "replied",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(MessageStatus::New),
            "read" => Ok(MessageStatus::Read),
            "replied" => Ok(MessageStatus::Replied),
            other => Err(format!("unknown message status {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub message: String,
    pub status: MessageStatus,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub message: String,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    service: Option<String>,
    message: String,
    status: String,
    created_at: OffsetDateTime,
}

fn into_message(r: MessageRow) -> Result<ContactMessage, StoreError> {
    Ok(ContactMessage {
        status: r.status.parse().map_err(StoreError::CorruptRow)?,
        id: r.id,
        name: r.name,
        email: r.email,
        phone: r.phone,
        company: r.company,
        service: r.service,
        message: r.message,
        created_at: r.created_at,
    })
}

/// Access to the `contact_messages` table.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert(&self, msg: NewMessage) -> Result<Uuid, StoreError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<ContactMessage>, StoreError>;
    /// Returns `false` when no message has this id.
    async fn set_status(&self, id: Uuid, status: MessageStatus) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgContactStore {
    db: PgPool,
}

impl PgContactStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn insert(&self, msg: NewMessage) -> Result<Uuid, StoreError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO contact_messages (name, email, phone, company, service, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&msg.name)
        .bind(&msg.email)
        .bind(&msg.phone)
        .bind(&msg.company)
        .bind(&msg.service)
        .bind(&msg.message)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<ContactMessage>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, name, email, phone, company, service, message, status, created_at
              FROM contact_messages
             ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(into_message).collect()
    }

    async fn set_status(&self, id: Uuid, status: MessageStatus) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"UPDATE contact_messages SET status = $1 WHERE id = $2"#)
            .bind(status.as_str())
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
