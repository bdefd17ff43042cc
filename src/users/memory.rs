use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::users::{
    repo::{RepoError, UserRepository},
    repo_types::{NewUser, Role, User},
};

/// Store double that enforces the same unique columns as the `users` table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user with the given role directly, bypassing the handlers.
    pub async fn seed(&self, username: &str, email: &str, password_hash: &str, role: Role) -> i64 {
        self.insert(NewUser::new(
            username.to_string(),
            email.to_string(),
            password_hash.to_string(),
            role,
        ))
        .await
        .expect("seed user must be unique")
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .find(|u| u.email == email || u.username == username)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<i64, RepoError> {
        let mut inner = self.inner.write().await;
        if inner
            .rows
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(RepoError::Conflict);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.insert(
            id,
            User {
                id,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                created_at: user.created_at,
                updated_at: user.updated_at,
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), RepoError> {
        match self.inner.write().await.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

/// Store double whose backing database is unreachable.
pub struct UnavailableUserRepository;

fn unavailable() -> RepoError {
    RepoError::Store(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl UserRepository for UnavailableUserRepository {
    async fn find_by_email_or_username(&self, _: &str, _: &str) -> Result<Option<User>, RepoError> {
        Err(unavailable())
    }

    async fn insert(&self, _: NewUser) -> Result<i64, RepoError> {
        Err(unavailable())
    }

    async fn find_by_email(&self, _: &str) -> Result<Option<User>, RepoError> {
        Err(unavailable())
    }

    async fn find_by_id(&self, _: i64) -> Result<Option<User>, RepoError> {
        Err(unavailable())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        Err(unavailable())
    }

    async fn delete_by_id(&self, _: i64) -> Result<(), RepoError> {
        Err(unavailable())
    }
}

/// Store double where another writer always gets there first: lookups see a
/// row (or no clash) but the following write hits the unique index or finds
/// the row already gone.
pub struct RacingUserRepository;

#[async_trait]
impl UserRepository for RacingUserRepository {
    async fn find_by_email_or_username(&self, _: &str, _: &str) -> Result<Option<User>, RepoError> {
        Ok(None)
    }

    async fn insert(&self, _: NewUser) -> Result<i64, RepoError> {
        Err(RepoError::Conflict)
    }

    async fn find_by_email(&self, _: &str) -> Result<Option<User>, RepoError> {
        Ok(None)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let now = time::OffsetDateTime::now_utc();
        Ok(Some(User {
            id,
            username: "ghost".into(),
            email: "ghost@x.com".into(),
            password_hash: "unused".into(),
            role: Role::User,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(Vec::new())
    }

    async fn delete_by_id(&self, _: i64) -> Result<(), RepoError> {
        Err(RepoError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_increasing_ids_and_rejects_duplicates() {
        let repo = InMemoryUserRepository::new();
        let a = repo.seed("alice", "a@x.com", "h", Role::User).await;
        let b = repo.seed("bob", "b@x.com", "h", Role::Admin).await;
        assert!(b > a);

        let dup_email = repo
            .insert(NewUser::new("carol".into(), "a@x.com".into(), "h".into(), Role::User))
            .await;
        assert!(matches!(dup_email, Err(RepoError::Conflict)));

        let dup_name = repo
            .insert(NewUser::new("bob".into(), "c@x.com".into(), "h".into(), Role::User))
            .await;
        assert!(matches!(dup_name, Err(RepoError::Conflict)));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let repo = InMemoryUserRepository::new();
        let id = repo.seed("alice", "a@x.com", "h", Role::User).await;
        repo.delete_by_id(id).await.unwrap();
        assert!(repo.find_by_id(id).await.unwrap().is_none());
        assert!(matches!(repo.delete_by_id(id).await, Err(RepoError::NotFound)));
    }
}
