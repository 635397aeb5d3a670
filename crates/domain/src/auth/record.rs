use serde::{Deserialize, Serialize};

use crate::{errors::Error, store::SessionStore};

use super::types::UserProfile;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Auth token and the profile it was issued for. Stored as a pair or not at all.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SessionRecord {
    pub token: String,
    pub user: UserProfile,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Reads the pair back. Half-written or unparseable records are removed
    /// and reported as absent.
    pub async fn load(store: &dyn SessionStore) -> Result<Option<Self>, Error> {
        let token = store.get(TOKEN_KEY).await?;
        let user = store.get(USER_KEY).await?;

        let (token, user) = match (token, user) {
            (None, None) => return Ok(None),
            (Some(token), Some(user)) => (token, user),
            (token, user) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    has_user = user.is_some(),
                    "Discarding half-written stored session"
                );
                Self::clear(store).await?;
                return Ok(None);
            }
        };

        let user = match serde_json::from_str::<UserProfile>(&user) {
            Ok(user) if !token.trim().is_empty() => user,
            Ok(_) => {
                tracing::warn!("Discarding stored session with blank token");
                Self::clear(store).await?;
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("Discarding stored session with malformed user: {}", e);
                Self::clear(store).await?;
                return Ok(None);
            }
        };

        Ok(Some(Self { token, user }))
    }

    /// Writes the user, then the token. If the token write fails the user is
    /// removed again so no half record is left behind.
    pub async fn save(&self, store: &dyn SessionStore) -> Result<(), Error> {
        let user = serde_json::to_string(&self.user).map_err(|e| Error::Storage {
            message: e.to_string(),
        })?;

        store.set(USER_KEY, &user).await?;
        if let Err(e) = store.set(TOKEN_KEY, &self.token).await {
            if let Err(rollback) = store.remove(USER_KEY).await {
                tracing::error!("Could not roll back stored user: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes both halves. The token goes first so a failure in between
    /// leaves a record that `load` will discard.
    pub async fn clear(store: &dyn SessionStore) -> Result<(), Error> {
        store.remove(TOKEN_KEY).await?;
        store.remove(USER_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn dr_a() -> UserProfile {
        UserProfile {
            id: 1,
            name: "Dr. A".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let record = SessionRecord::new("tok1", dr_a());
        record.save(&store).await.unwrap();

        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok1"));
        assert_eq!(SessionRecord::load(&store).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn token_without_user_is_discarded() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "tok1").await.unwrap();

        assert_eq!(SessionRecord::load(&store).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn user_without_token_is_discarded() {
        let store = MemoryStore::new();
        store.set(USER_KEY, r#"{"id":1,"name":"Dr. A"}"#).await.unwrap();

        assert_eq!(SessionRecord::load(&store).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn malformed_user_is_discarded() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "tok1").await.unwrap();
        store.set(USER_KEY, "{not json").await.unwrap();

        assert_eq!(SessionRecord::load(&store).await.unwrap(), None);
        assert!(store.is_empty());
    }

    /// Accepts every write except the token.
    #[derive(Default)]
    struct TokenRejectingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl SessionStore for TokenRejectingStore {
        async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
            if key == TOKEN_KEY {
                return Err(Error::Storage {
                    message: "disk full".to_string(),
                });
            }
            self.inner.set(key, value).await
        }

        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            self.inner.get(key).await
        }

        async fn remove(&self, key: &str) -> Result<(), Error> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn failed_token_write_rolls_back_user() {
        let store = TokenRejectingStore::default();
        let err = SessionRecord::new("tok1", dr_a()).save(&store).await.unwrap_err();

        assert!(matches!(err, Error::Storage { .. }));
        assert!(store.inner.is_empty());
    }
}
