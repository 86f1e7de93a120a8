use crate::domain::error::DomainError;
use crate::domain::models::{User, next_id};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::{KeyValueStore, read_json, write_json};
use std::sync::Arc;
use tracing::info;

pub const USERS_KEY: &str = "focus_users";
pub const CURRENT_USER_KEY: &str = "focus_current_user";

/// Registered users plus the logged-in pointer, each persisted as one blob.
///
/// Passwords are kept exactly as entered.
pub struct AccountStore<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    users: Vec<User>,
    current_user: Option<User>,
}

impl<S> AccountStore<S>
where
    S: KeyValueStore,
{
    pub fn open(store: Arc<S>) -> Result<Self, InfraError> {
        let users = read_json::<Vec<User>, _>(store.as_ref(), USERS_KEY)?.unwrap_or_default();
        let current_user = read_json::<User, _>(store.as_ref(), CURRENT_USER_KEY)?;
        Ok(Self {
            store,
            users,
            current_user,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<User, InfraError> {
        let username = username.trim();
        validate_credentials(username, password)?;
        if self.users.iter().any(|user| user.username == username) {
            return Err(DomainError::DuplicateUsername(username.to_string()).into());
        }

        let user = User {
            id: next_id(),
            username: username.to_string(),
            password: password.to_string(),
        };
        let mut users = self.users.clone();
        users.push(user.clone());
        write_json(self.store.as_ref(), USERS_KEY, &users)?;
        self.users = users;
        self.set_current(user.clone())?;

        info!(user_id = user.id, username = %user.username, "registered user");
        Ok(user)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<User, InfraError> {
        let username = username.trim();
        validate_credentials(username, password)?;
        let user = self
            .users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .cloned()
            .ok_or(DomainError::InvalidCredentials)?;

        self.set_current(user.clone())?;
        info!(user_id = user.id, username = %user.username, "user logged in");
        Ok(user)
    }

    /// Clears the logged-in pointer. The user record itself is kept.
    pub fn logout(&mut self) -> Result<(), InfraError> {
        self.store.remove(CURRENT_USER_KEY)?;
        if let Some(user) = self.current_user.take() {
            info!(user_id = user.id, "user logged out");
        }
        Ok(())
    }

    fn set_current(&mut self, user: User) -> Result<(), InfraError> {
        write_json(self.store.as_ref(), CURRENT_USER_KEY, &user)?;
        self.current_user = Some(user);
        Ok(())
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), DomainError> {
    if username.is_empty() {
        return Err(DomainError::MissingRequiredField("username"));
    }
    if password.is_empty() {
        return Err(DomainError::MissingRequiredField("password"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn open_store() -> (Arc<InMemoryKeyValueStore>, AccountStore<InMemoryKeyValueStore>) {
        let backend = Arc::new(InMemoryKeyValueStore::default());
        let accounts = AccountStore::open(Arc::clone(&backend)).expect("open account store");
        (backend, accounts)
    }

    fn expect_domain_error(result: Result<User, InfraError>) -> DomainError {
        match result {
            Err(InfraError::Domain(error)) => error,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn register_persists_user_and_logs_in() {
        let (backend, mut accounts) = open_store();
        let user = accounts.register("alice", "pw").expect("register alice");

        assert_eq!(accounts.current_user(), Some(&user));
        let stored: Vec<User> = read_json(backend.as_ref(), USERS_KEY)
            .expect("read users")
            .expect("users present");
        assert_eq!(stored, vec![user.clone()]);
        let current: Option<User> =
            read_json(backend.as_ref(), CURRENT_USER_KEY).expect("read current");
        assert_eq!(current, Some(user));
    }

    #[test]
    fn duplicate_username_is_refused_and_password_kept() {
        let (backend, mut accounts) = open_store();
        accounts.register("alice", "pw").expect("register alice");

        let error = expect_domain_error(accounts.register("alice", "anything"));
        assert_eq!(error, DomainError::DuplicateUsername("alice".to_string()));

        let reopened = AccountStore::open(backend).expect("reopen");
        assert_eq!(reopened.users().len(), 1);
        assert_eq!(reopened.users()[0].password, "pw");
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let (_, mut accounts) = open_store();
        accounts.register("alice", "pw").expect("register alice");
        accounts.register("Alice", "pw").expect("register Alice");
        assert_eq!(accounts.users().len(), 2);
    }

    #[test]
    fn wrong_password_leaves_current_user_unchanged() {
        let (_, mut accounts) = open_store();
        let alice = accounts.register("alice", "pw").expect("register alice");
        let bob = accounts.register("bob", "secret").expect("register bob");
        assert_eq!(accounts.current_user(), Some(&bob));

        let error = expect_domain_error(accounts.login("alice", "wrong"));
        assert_eq!(error, DomainError::InvalidCredentials);
        assert_eq!(accounts.current_user(), Some(&bob));

        let logged_in = accounts.login("alice", "pw").expect("login alice");
        assert_eq!(logged_in, alice);
        assert_eq!(accounts.current_user(), Some(&alice));
    }

    #[test]
    fn logout_keeps_user_records_and_survives_reopen() {
        let (backend, mut accounts) = open_store();
        accounts.register("alice", "pw").expect("register alice");
        accounts.logout().expect("logout");
        assert_eq!(accounts.current_user(), None);

        let reopened = AccountStore::open(backend).expect("reopen");
        assert_eq!(reopened.current_user(), None);
        assert_eq!(reopened.users().len(), 1);
    }

    #[test]
    fn current_user_is_restored_on_open() {
        let (backend, mut accounts) = open_store();
        let alice = accounts.register("alice", "pw").expect("register alice");
        let reopened = AccountStore::open(backend).expect("reopen");
        assert_eq!(reopened.current_user(), Some(&alice));
    }

    #[test]
    fn blank_credentials_are_refused() {
        let (_, mut accounts) = open_store();
        assert_eq!(
            expect_domain_error(accounts.register("   ", "pw")),
            DomainError::MissingRequiredField("username")
        );
        assert_eq!(
            expect_domain_error(accounts.login("alice", "")),
            DomainError::MissingRequiredField("password")
        );
        assert!(accounts.users().is_empty());
    }
}
