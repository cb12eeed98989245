use std::{sync::Arc, time::Duration};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Identity,
        dto::{PublicUser, RegisterRequest},
        jwt::{TokenError, TokenKeys},
        password::{PasswordError, PasswordService},
        repo::UserStore,
        repo_types::{AccountCategory, NewUser, User},
    },
    db::{bounded, StoreError},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid account category")]
    InvalidAccountCategory,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hashing(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// A freshly authenticated user and their bearer token.
#[derive(Debug)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

/// Registration, login and profile lookup over an injected user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    passwords: PasswordService,
    tokens: TokenKeys,
    timeout: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: PasswordService,
        tokens: TokenKeys,
        timeout: Duration,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            timeout,
        }
    }

    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }

    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<Session, AuthError> {
        if req.name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        if req.email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if req.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        if !is_valid_email(&req.email) {
            warn!("invalid email");
            return Err(AuthError::InvalidEmail);
        }
        let category = match non_empty(req.user_type) {
            Some(raw) => raw
                .parse::<AccountCategory>()
                .map_err(|_| AuthError::InvalidAccountCategory)?,
            None => AccountCategory::default(),
        };

        if bounded(self.timeout, self.users.find_by_email(&req.email))
            .await?
            .is_some()
        {
            warn!("email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self
            .passwords
            .hash_bounded(req.password, self.timeout)
            .await?;

        let new_user = NewUser {
            name: req.name,
            email: req.email,
            password_hash,
            phone: non_empty(req.phone),
            company: non_empty(req.company),
            export_number: non_empty(req.export_number),
            import_number: non_empty(req.import_number),
            category,
        };
        // The unique index closes the gap between the lookup and this insert.
        let user = match bounded(self.timeout, self.users.insert(new_user)).await {
            Ok(u) => u,
            Err(StoreError::Duplicate) => {
                warn!("email registered concurrently");
                return Err(AuthError::DuplicateEmail);
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return Err(e.into());
            }
        };

        let session = self.open_session(user)?;
        info!(user_id = %session.user.id, "user registered");
        Ok(session)
    }

    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let user = match bounded(self.timeout, self.users.find_by_email(email)).await? {
            Some(u) => u,
            None => {
                // Same Argon2 cost as a real mismatch.
                self.passwords
                    .verify_bounded(
                        password.to_owned(),
                        self.passwords.dummy_hash().to_owned(),
                        self.timeout,
                    )
                    .await?;
                warn!("login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let ok = self
            .passwords
            .verify_bounded(password.to_owned(), user.password_hash.clone(), self.timeout)
            .await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.open_session(user)?;
        info!(user_id = %session.user.id, "user logged in");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        bounded(self.timeout, self.users.find_by_id(user_id))
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::NotFound)
    }

    fn open_session(&self, user: User) -> Result<Session, AuthError> {
        let token = self.tokens.issue(&Identity {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        })?;
        Ok(Session {
            user: user.into(),
            token,
        })
    }
}
