//! Authentication gateway.
//!
//! Wraps an [`IdentityProvider`] with user profiles, bearer sessions and a
//! broadcast of sign-in and sign-out events.

pub mod model;
pub mod provider;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use scrumkit_store::{Document, DocumentStore, SharedStore, now_timestamp, to_document};

use crate::collections::USERS;
use crate::error::{CoreError, CoreResult, StoreResultExt};
pub use model::{AuthEvent, Credentials, Identity, OAuthIdentity, Session, UserProfile};
pub use provider::{IdentityProvider, StoreIdentityProvider};

/// Capacity of the auth event channel.
const EVENT_CAPACITY: usize = 64;

/// Sessions older than this are dropped.
const SESSION_TTL_DAYS: i64 = 7;

/// Sign-in front door shared by the web API and the CLI.
pub struct AuthGateway {
    provider: Arc<dyn IdentityProvider>,
    store: SharedStore,
    sessions: RwLock<HashMap<String, Session>>,
    session_ttl: Duration,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: SharedStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            store,
            sessions: RwLock::new(HashMap::new()),
            session_ttl: Duration::days(SESSION_TTL_DAYS),
            events,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Gateway backed by the built-in store provider.
    pub fn with_store_provider(store: SharedStore) -> Self {
        let provider = Arc::new(StoreIdentityProvider::new(store.clone()));
        Self::new(provider, store)
    }

    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> CoreResult<Session> {
        let identity = self.provider.sign_up(email, password, display_name).await?;
        self.establish(identity).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> CoreResult<Session> {
        let identity = self.provider.sign_in(email, password).await?;
        self.establish(identity).await
    }

    pub async fn sign_in_with_oauth(&self, oauth: &OAuthIdentity) -> CoreResult<Session> {
        let identity = self.provider.sign_in_with_oauth(oauth).await?;
        self.establish(identity).await
    }

    /// End a session. Returns false for unknown tokens.
    pub async fn sign_out(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        match removed {
            Some(session) => {
                info!(uid = %session.uid, "Signed out");
                let _ = self.events.send(AuthEvent::SignedOut { uid: session.uid });
                true
            }
            None => false,
        }
    }

    /// The live session for `token`. An expired session is removed.
    pub async fn session(&self, token: &str) -> Option<Session> {
        let found = self.sessions.read().await.get(token).cloned()?;
        if self.is_live(&found) {
            return Some(found);
        }
        self.sessions.write().await.remove(token);
        debug!(uid = %found.uid, "Session expired");
        None
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn prune_sessions(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| self.is_live(s));
        before - sessions.len()
    }

    fn is_live(&self, session: &Session) -> bool {
        Utc::now() - session.signed_in_at < self.session_ttl
    }

    /// The session for a bearer token, or `Unauthenticated`.
    pub async fn require(&self, token: Option<&str>) -> CoreResult<Session> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::Unauthenticated("missing bearer token".into()))?;
        self.session(token)
            .await
            .ok_or_else(|| CoreError::Unauthenticated("session expired or unknown".into()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub async fn get_profile(&self, uid: &str) -> CoreResult<Option<UserProfile>> {
        get_profile(self.store.as_ref(), uid).await
    }

    async fn establish(&self, identity: Identity) -> CoreResult<Session> {
        ensure_profile(self.store.as_ref(), &identity).await?;

        let session = Session {
            token: new_token(),
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            signed_in_at: Utc::now(),
        };
        let pruned = self.prune_sessions().await;
        if pruned > 0 {
            debug!(pruned, "Expired sessions removed");
        }
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());

        info!(uid = %identity.uid, provider = %identity.provider, "Signed in");
        let _ = self.events.send(AuthEvent::SignedIn {
            uid: identity.uid,
            email: identity.email,
        });
        Ok(session)
    }
}

/// Create the profile document on first login; afterwards only stamp
/// `lastLoginAt`.
pub async fn ensure_profile(store: &dyn DocumentStore, identity: &Identity) -> CoreResult<UserProfile> {
    let now = now_timestamp();
    let existing = store
        .get(USERS, &identity.uid)
        .await
        .or_backend("Could not load your profile.")?;

    let doc = if existing.is_some() {
        let mut patch = Document::new();
        patch.insert("lastLoginAt".into(), Value::String(now));
        store
            .update(USERS, &identity.uid, patch)
            .await
            .or_backend("Could not update your profile.")?
    } else {
        let body = to_document(&json!({
            "uid": identity.uid,
            "email": identity.email,
            "displayName": identity.display_name,
            "photoUrl": identity.photo_url,
            "provider": identity.provider,
            "lastLoginAt": now,
        }))
        .or_backend("Could not create your profile.")?;
        let doc = store
            .set(USERS, &identity.uid, body)
            .await
            .or_backend("Could not create your profile.")?;
        debug!(uid = %identity.uid, "Profile created");
        doc
    };
    doc.decode().or_backend("Could not read your profile.")
}

pub async fn get_profile(store: &dyn DocumentStore, uid: &str) -> CoreResult<Option<UserProfile>> {
    let doc = store
        .get(USERS, uid)
        .await
        .or_backend("Could not load the profile.")?;
    doc.map(|d| d.decode())
        .transpose()
        .or_backend("Could not read the profile.")
}

fn new_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_store::MemoryStore;

    fn gateway() -> (Arc<MemoryStore>, AuthGateway) {
        let store = Arc::new(MemoryStore::new());
        let gateway = AuthGateway::with_store_provider(store.clone());
        (store, gateway)
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_and_session() {
        let (store, auth) = gateway();
        let session = auth.sign_up("ada@example.com", "secret1", "Ada").await.unwrap();
        assert_eq!(session.token.len(), 64);
        assert_eq!(auth.require(Some(session.token.as_str())).await.unwrap().uid, session.uid);

        let profile = auth.get_profile(&session.uid).await.unwrap().unwrap();
        assert_eq!(profile.id, session.uid);
        assert_eq!(profile.display_name, "Ada");
        assert_eq!(store.count(USERS).await, 1);
    }

    #[tokio::test]
    async fn test_second_login_only_stamps_last_login() {
        let (store, auth) = gateway();
        let first = auth.sign_up("ada@example.com", "secret1", "Ada").await.unwrap();
        let before = auth.get_profile(&first.uid).await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = auth.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_ne!(first.token, second.token);

        let after = auth.get_profile(&first.uid).await.unwrap().unwrap();
        assert_eq!(after.created_at, before.created_at);
        assert!(after.last_login_at > before.last_login_at);
        assert_eq!(store.count(USERS).await, 1);
    }

    #[tokio::test]
    async fn test_sign_out_and_events() {
        let (_store, auth) = gateway();
        let mut events = auth.subscribe();

        let session = auth.sign_up("ada@example.com", "secret1", "").await.unwrap();
        assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn { .. }));

        assert!(auth.sign_out(&session.token).await);
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedOut { uid: session.uid.clone() }
        );
        assert!(!auth.sign_out(&session.token).await);
        assert!(matches!(
            auth.require(Some(session.token.as_str())).await.unwrap_err(),
            CoreError::Unauthenticated(_)
        ));
    }

    #[tokio::test]
    async fn test_sessions_expire() {
        let (_store, auth) = gateway();
        let stale = auth.sign_up("ada@example.com", "secret1", "Ada").await.unwrap();
        auth.sessions
            .write()
            .await
            .get_mut(&stale.token)
            .unwrap()
            .signed_in_at = Utc::now() - Duration::days(SESSION_TTL_DAYS + 1);

        let fresh = auth.sign_in("ada@example.com", "secret1").await.unwrap();
        // Signing in again swept the stale session.
        assert_eq!(auth.sessions.read().await.len(), 1);
        assert!(auth.session(&stale.token).await.is_none());
        assert!(auth.session(&fresh.token).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthenticated() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthGateway::with_store_provider(store).with_session_ttl(Duration::hours(1));
        let session = auth.sign_up("ada@example.com", "secret1", "Ada").await.unwrap();
        assert!(auth.require(Some(session.token.as_str())).await.is_ok());

        auth.sessions
            .write()
            .await
            .get_mut(&session.token)
            .unwrap()
            .signed_in_at = Utc::now() - Duration::hours(2);
        assert!(matches!(
            auth.require(Some(session.token.as_str())).await.unwrap_err(),
            CoreError::Unauthenticated(_)
        ));
        assert_eq!(auth.prune_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_require_without_token() {
        let (_store, auth) = gateway();
        assert!(matches!(auth.require(None).await.unwrap_err(), CoreError::Unauthenticated(_)));
        assert!(matches!(auth.require(Some("  ")).await.unwrap_err(), CoreError::Unauthenticated(_)));
    }
}
