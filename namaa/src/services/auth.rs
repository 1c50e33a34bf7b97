//! Auth service
//!
//! Local user directory and the signed-in user. Passwords are kept as
//! entered; this is profile separation on a shared device, not security.

use crate::database::{User, UserDirectory, UserRecord};
use crate::error::{AppError, Result};
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};

#[derive(Clone)]
pub struct AuthService {
    store: RecordStore,
}

impl AuthService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn users_key() -> Result<StorageKey> {
        StorageKey::global(Collection::Users)
    }

    fn current_key() -> Result<StorageKey> {
        StorageKey::global(Collection::CurrentUser)
    }

    /// Create an account and sign it in.
    ///
    /// Returns `None` when the username is already taken.
    pub async fn signup(&self, username: &str, password: &str, name: &str) -> Result<Option<User>> {
        if username.is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }

        let record = UserRecord {
            id: new_record_id(),
            username: username.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        };

        let created = self
            .store
            .modify_pair(
                &Self::users_key()?,
                &Self::current_key()?,
                |directory: &mut Option<UserDirectory>, current: &mut Option<User>| {
                    let directory = directory.get_or_insert_with(UserDirectory::new);
                    if directory.contains_key(username) {
                        return Ok(None);
                    }
                    let user = record.public();
                    directory.insert(username.to_string(), record);
                    *current = Some(user.clone());
                    Ok(Some(user))
                },
            )
            .await?;

        match &created {
            Some(user) => tracing::info!("Signed up user {}", user.username),
            None => tracing::info!("Signup rejected, username {} taken", username),
        }
        Ok(created)
    }

    /// Sign in. Returns `None` on unknown username or wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>> {
        let directory: UserDirectory = self
            .store
            .load(&Self::users_key()?)
            .await?
            .unwrap_or_default();

        let user = match directory.get(username) {
            Some(record) if record.password == password => record.public(),
            _ => {
                tracing::info!("Login failed for {}", username);
                return Ok(None);
            }
        };

        self.store.store(&Self::current_key()?, &user).await?;
        tracing::info!("Logged in user {}", user.username);
        Ok(Some(user))
    }

    pub async fn logout(&self) -> Result<()> {
        self.store.remove(&Self::current_key()?).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<User>> {
        self.store.load(&Self::current_key()?).await
    }

    /// Current user or an error naming the missing session
    pub async fn require_user(&self) -> Result<User> {
        self.current_user()
            .await?
            .ok_or_else(|| AppError::Generic("Not logged in".to_string()))
    }
}
