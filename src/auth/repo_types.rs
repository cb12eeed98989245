use std::{fmt, str::FromStr};

use sqlx::FromRow;
use uuid::Uuid;

/// Kind of trading account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountCategory {
    Importer,
    Exporter,
    #[default]
    Both,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Importer => "importer",
            AccountCategory::Exporter => "exporter",
            AccountCategory::Both => "both",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "importer" => Ok(AccountCategory::Importer),
            "exporter" => Ok(AccountCategory::Exporter),
            "both" => Ok(AccountCategory::Both),
            other => Err(format!("unknown account category {:?}", other)),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never exposed
    pub phone: Option<String>,
    pub company: Option<String>,
    pub export_number: Option<String>,
    pub import_number: Option<String>,
    pub category: AccountCategory,
}

/// Values for a user insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub export_number: Option<String>,
    pub import_number: Option<String>,
    pub category: AccountCategory,
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub export_number: Option<String>,
    pub import_number: Option<String>,
    pub user_type: String,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            category: r.user_type.parse()?,
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            phone: r.phone,
            company: r.company,
            export_number: r.export_number,
            import_number: r.import_number,
        })
    }
}
