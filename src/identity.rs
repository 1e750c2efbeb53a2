//! Identity provider port: accounts, sessions and auth-state notifications.
//!
//! The engine only needs to know who is signed in; the provider itself lives
//! outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// An authenticated session. The access token is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    PasswordRecovery,
}

/// Broadcast to subscribers whenever the auth state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account already exists: {0}")]
    AlreadyRegistered(String),

    #[error("no active session")]
    NoSession,

    #[error("identity provider error: {0}")]
    Provider(String),
}

#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    async fn current_user(&self) -> Option<User>;

    async fn current_session(&self) -> Option<Session>;

    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    /// Sends a reset link that lands on `redirect_to`.
    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError>;
}

/// Where password-reset links should send the user back to.
pub fn password_reset_redirect(origin: &str) -> String {
    format!("{}/reset-password", origin.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct InMemoryIdentity {
        accounts: Mutex<HashMap<String, String>>,
        session: Mutex<Option<Session>>,
        resets: Mutex<Vec<(String, String)>>,
        changes: broadcast::Sender<AuthChange>,
    }

    impl InMemoryIdentity {
        fn new() -> Self {
            let (changes, _) = broadcast::channel(8);
            Self {
                accounts: Mutex::new(HashMap::new()),
                session: Mutex::new(None),
                resets: Mutex::new(Vec::new()),
                changes,
            }
        }

        fn open_session(&self, email: &str, event: AuthEvent) -> Session {
            let session = Session {
                user: User {
                    id: format!("user-{email}"),
                    email: email.to_string(),
                },
                access_token: uuid::Uuid::new_v4().to_string(),
                expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            };
            *self.session.lock().unwrap() = Some(session.clone());
            let _ = self.changes.send(AuthChange {
                event,
                session: Some(session.clone()),
            });
            session
        }
    }

    impl IdentityProvider for InMemoryIdentity {
        async fn sign_up(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(IdentityError::AlreadyRegistered(email.to_string()));
            }
            accounts.insert(email.to_string(), password.to_string());
            drop(accounts);
            Ok(self.open_session(email, AuthEvent::SignedIn))
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
            let known = self.accounts.lock().unwrap().get(email).cloned();
            match known {
                Some(p) if p == password => Ok(self.open_session(email, AuthEvent::SignedIn)),
                _ => Err(IdentityError::InvalidCredentials),
            }
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            if self.session.lock().unwrap().take().is_none() {
                return Err(IdentityError::NoSession);
            }
            let _ = self.changes.send(AuthChange {
                event: AuthEvent::SignedOut,
                session: None,
            });
            Ok(())
        }

        async fn current_user(&self) -> Option<User> {
            self.session.lock().unwrap().as_ref().map(|s| s.user.clone())
        }

        async fn current_session(&self) -> Option<Session> {
            self.session.lock().unwrap().clone()
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
            self.changes.subscribe()
        }

        async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
            self.resets
                .lock()
                .unwrap()
                .push((email.to_string(), redirect_to.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn sign_in_flow_notifies_subscribers() {
        let id = InMemoryIdentity::new();
        let mut rx = id.subscribe();

        id.sign_up("ada@example.com", "hunter2").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().event, AuthEvent::SignedIn);
        assert_eq!(id.current_user().await.unwrap().email, "ada@example.com");

        id.sign_out().await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.session.is_none());
        assert!(id.current_session().await.is_none());

        assert!(matches!(
            id.sign_in("ada@example.com", "wrong").await,
            Err(IdentityError::InvalidCredentials)
        ));
        let session = id.sign_in("ada@example.com", "hunter2").await.unwrap();
        assert!(!session.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn duplicate_sign_up_and_double_sign_out_fail() {
        let id = InMemoryIdentity::new();
        id.sign_up("bo@example.com", "pw").await.unwrap();
        assert!(matches!(
            id.sign_up("bo@example.com", "pw").await,
            Err(IdentityError::AlreadyRegistered(_))
        ));
        id.sign_out().await.unwrap();
        assert!(matches!(id.sign_out().await, Err(IdentityError::NoSession)));
    }

    #[tokio::test]
    async fn reset_password_uses_redirect() {
        let id = InMemoryIdentity::new();
        let redirect = password_reset_redirect("https://kingdom.example/");
        id.reset_password("ada@example.com", &redirect).await.unwrap();
        assert_eq!(
            id.resets.lock().unwrap()[0],
            ("ada@example.com".to_string(), "https://kingdom.example/reset-password".to_string())
        );
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now();
        let session = Session {
            user: User {
                id: "u".into(),
                email: "u@example.com".into(),
            },
            access_token: "t".into(),
            expires_at: Some(now - chrono::Duration::seconds(1)),
        };
        assert!(session.is_expired(now));
        assert!(!Session { expires_at: None, ..session }.is_expired(now));
    }
}
