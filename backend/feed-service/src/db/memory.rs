//! In-memory repositories backed by `DashMap`
//!
//! Same contract as the PostgreSQL repositories, including unique handles and
//! version-checked saves, so services behave identically in tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use super::{PostRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{NewUser, Post, PostId, User, UserId};

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<DashMap<UserId, User>>,
    /// Serializes the uniqueness check with the insert
    insert_lock: Arc<Mutex<()>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an account directly, bypassing services
    pub fn remove(&self, id: UserId) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let _guard = self
            .insert_lock
            .lock()
            .map_err(|_| AppError::Internal("user store lock poisoned".to_string()))?;

        for existing in self.users.iter() {
            if existing.email == user.email {
                return Err(AppError::DuplicateIdentity("Email already exists".to_string()));
            }
            if existing.username == user.username {
                return Err(AppError::DuplicateIdentity(
                    "Username already exists".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let created = User {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email || u.username == username)
            .map(|u| u.clone()))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPostRepository {
    posts: Arc<DashMap<PostId, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, post: &Post) -> Result<()> {
        self.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.clone()))
    }

    async fn list_newest_first(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.iter().map(|p| p.clone()).collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts)
    }

    async fn save(&self, post: &Post) -> Result<bool> {
        let Some(mut stored) = self.posts.get_mut(&post.id) else {
            return Ok(false);
        };
        if stored.version != post.version {
            return Ok(false);
        }

        let mut next = post.clone();
        next.version += 1;
        *stored = next;
        Ok(true)
    }

    async fn delete(&self, id: PostId) -> Result<bool> {
        Ok(self.posts.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let err = repo
            .insert(new_user("alice2", "alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");

        let err = repo
            .insert(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
        assert!(repo
            .find_by_email("other@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_ignores_usernames() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("bob@example.com", "a@example.com")).await.unwrap();
        let bob = repo.insert(new_user("bob", "bob@example.com")).await.unwrap();

        let found = repo.find_by_email("bob@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(bob.id));
        assert!(repo.find_by_email("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_or_username() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let by_email = repo
            .find_by_email_or_username("alice@example.com", "")
            .await
            .unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(alice.id));

        let by_name = repo.find_by_email_or_username("", "alice").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(alice.id));

        assert!(repo
            .find_by_email_or_username("bob@example.com", "bob")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_stale_version() {
        let repo = InMemoryPostRepository::new();
        let post = Post::new(UserId::new(), "alice", Some("hi".into()), None, Utc::now()).unwrap();
        repo.insert(&post).await.unwrap();

        let mut first = repo.find_by_id(post.id).await.unwrap().unwrap();
        let mut second = first.clone();

        first.toggle_like(UserId::new(), "bob", Utc::now());
        assert!(repo.save(&first).await.unwrap());

        second.toggle_like(UserId::new(), "carol", Utc::now());
        assert!(!repo.save(&second).await.unwrap());

        let stored = repo.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.likes.len(), 1);
        assert_eq!(stored.likes[0].username, "bob");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = InMemoryPostRepository::new();
        let owner = UserId::new();
        let older = Post::new(
            owner,
            "alice",
            Some("old".into()),
            None,
            Utc::now() - chrono::Duration::minutes(5),
        )
        .unwrap();
        let newer = Post::new(owner, "alice", Some("new".into()), None, Utc::now()).unwrap();
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let listed = repo.list_newest_first().await.unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }
}
