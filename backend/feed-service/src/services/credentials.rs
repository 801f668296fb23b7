use std::collections::HashMap;
use std::sync::Arc;

use crate::db::UserRepository;
use crate::error::Result;
use crate::models::{NewUser, User, UserId};

/// Account persistence with one-way hashed passwords
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Hash `password` with Argon2id and persist the account
    pub async fn create(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = crypto_core::hash_password(password)?;
        self.users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
    }

    /// Look up an account by email, compared case-insensitively
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(&email.trim().to_lowercase()).await
    }

    /// Any account already holding `email` or `username`, used to reject duplicate signups early
    pub async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>> {
        self.users.find_by_email_or_username(email, username).await
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    /// Resolve many accounts at once; missing ids are simply absent from the map
    pub async fn find_by_ids(&self, ids: &[UserId]) -> Result<HashMap<UserId, User>> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = self.users.find_by_ids(&unique).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    pub fn verify_password(&self, user: &User, candidate: &str) -> Result<bool> {
        Ok(crypto_core::verify_password(candidate, &user.password_hash)?)
    }
}
